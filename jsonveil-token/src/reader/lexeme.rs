//! Byte-level scanning of strings, numbers, literals and comments.

use alloc::string::String;

use super::Reader;
use crate::error::{ParseError, ParseErrorKind};

impl<'a> Reader<'a> {
    /// Scans a string starting at the opening quote. The payload span excludes
    /// the quotes; escapes are validated but left in place.
    pub(super) fn scan_string(&mut self) -> Result<(), ParseError> {
        let bytes = self.input.as_bytes();
        let open = self.pos;
        let mut i = open + 1;
        let mut escaped = false;
        loop {
            match bytes.get(i) {
                None => return Err(ParseError::new(ParseErrorKind::UnexpectedEnd, i)),
                Some(b'"') => break,
                Some(b'\\') => {
                    escaped = true;
                    match bytes.get(i + 1) {
                        Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => i += 2,
                        Some(b'u') => {
                            hex4(bytes, i + 2)?;
                            i += 6;
                        }
                        None => return Err(ParseError::new(ParseErrorKind::UnexpectedEnd, i + 1)),
                        Some(_) => return Err(ParseError::new(ParseErrorKind::InvalidEscape, i)),
                    }
                }
                Some(&b) if b < 0x20 => {
                    return Err(ParseError::new(ParseErrorKind::ControlCharacter, i));
                }
                Some(_) => i += 1,
            }
        }
        self.span = (open + 1, i);
        self.escaped = escaped;
        self.pos = i + 1;
        Ok(())
    }

    /// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
    pub(super) fn scan_number(&mut self) -> Result<(), ParseError> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        let invalid = |at: usize| ParseError::new(ParseErrorKind::InvalidNumber, at);
        let mut i = start;

        if bytes.get(i) == Some(&b'-') {
            i += 1;
        }
        match bytes.get(i) {
            Some(b'0') => i += 1,
            Some(b'1'..=b'9') => i = skip_digits(bytes, i),
            _ => return Err(invalid(i)),
        }
        if bytes.get(i) == Some(&b'.') {
            let digits = skip_digits(bytes, i + 1);
            if digits == i + 1 {
                return Err(invalid(digits));
            }
            i = digits;
        }
        if matches!(bytes.get(i), Some(b'e' | b'E')) {
            i += 1;
            if matches!(bytes.get(i), Some(b'+' | b'-')) {
                i += 1;
            }
            let digits = skip_digits(bytes, i);
            if digits == i {
                return Err(invalid(digits));
            }
            i = digits;
        }

        self.span = (start, i);
        self.escaped = false;
        self.pos = i;
        if !self.at_delimiter() {
            return Err(invalid(i));
        }
        Ok(())
    }

    pub(super) fn scan_literal(&mut self, text: &'static [u8]) -> Result<(), ParseError> {
        let rest = &self.input.as_bytes()[self.pos..];
        if !rest.starts_with(text) {
            let mismatch = rest.iter().zip(text).position(|(a, b)| a != b);
            return Err(match mismatch {
                Some(offset) => ParseError::new(
                    ParseErrorKind::UnexpectedByte(rest[offset]),
                    self.pos + offset,
                ),
                None => ParseError::new(ParseErrorKind::UnexpectedEnd, self.input.len()),
            });
        }
        self.span = (self.pos, self.pos + text.len());
        self.escaped = false;
        self.pos += text.len();
        match self.peek() {
            Some(b) if !self.at_delimiter() => Err(self.error(ParseErrorKind::UnexpectedByte(b))),
            _ => Ok(()),
        }
    }

    /// Scans a comment starting at its leading `/`. The payload span is the
    /// text between the delimiters.
    pub(super) fn scan_comment(&mut self) -> Result<(), ParseError> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        let body = start + 2;
        match bytes.get(start + 1) {
            Some(b'/') => {
                let end = bytes[body..]
                    .iter()
                    .position(|b| matches!(b, b'\n' | b'\r'))
                    .map_or(bytes.len(), |offset| body + offset);
                self.span = (body, end);
                self.pos = end;
            }
            Some(b'*') => {
                let end = bytes[body..]
                    .windows(2)
                    .position(|w| w == b"*/")
                    .map(|offset| body + offset)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::UnexpectedEnd, bytes.len()))?;
                self.span = (body, end);
                self.pos = end + 2;
            }
            Some(&b) => return Err(ParseError::new(ParseErrorKind::UnexpectedByte(b), start + 1)),
            None => return Err(ParseError::new(ParseErrorKind::UnexpectedEnd, start + 1)),
        }
        self.escaped = false;
        Ok(())
    }

    fn at_delimiter(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(b' ' | b'\t' | b'\n' | b'\r' | b',' | b']' | b'}' | b'/')
        )
    }
}

fn skip_digits(bytes: &[u8], mut i: usize) -> usize {
    while matches!(bytes.get(i), Some(b'0'..=b'9')) {
        i += 1;
    }
    i
}

fn hex4(bytes: &[u8], at: usize) -> Result<u32, ParseError> {
    let digits = bytes
        .get(at..at + 4)
        .ok_or_else(|| ParseError::new(ParseErrorKind::UnexpectedEnd, bytes.len()))?;
    let mut value = 0u32;
    for (offset, &b) in digits.iter().enumerate() {
        let nibble = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return Err(ParseError::new(ParseErrorKind::InvalidEscape, at + offset)),
        };
        value = (value << 4) | u32::from(nibble);
    }
    Ok(value)
}

/// Resolves escape sequences in an already validated string payload.
/// Unpaired surrogates become U+FFFD.
pub(super) fn unescape(raw: &str, offset: usize) -> Result<String, ParseError> {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut run = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        out.push_str(&raw[run..i]);
        let escape = bytes.get(i + 1).copied();
        i += 2;
        match escape {
            Some(b'"') => out.push('"'),
            Some(b'\\') => out.push('\\'),
            Some(b'/') => out.push('/'),
            Some(b'b') => out.push('\u{8}'),
            Some(b'f') => out.push('\u{c}'),
            Some(b'n') => out.push('\n'),
            Some(b'r') => out.push('\r'),
            Some(b't') => out.push('\t'),
            Some(b'u') => {
                let high = hex4(bytes, i).map_err(|e| shift(e, offset))?;
                i += 4;
                let decoded = if (0xD800..0xDC00).contains(&high) {
                    if bytes.get(i) == Some(&b'\\') && bytes.get(i + 1) == Some(&b'u') {
                        let low = hex4(bytes, i + 2).map_err(|e| shift(e, offset))?;
                        if (0xDC00..0xE000).contains(&low) {
                            i += 6;
                            char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
                        } else {
                            None
                        }
                    } else {
                        None
                    }
                } else {
                    char::from_u32(high)
                };
                out.push(decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            _ => return Err(ParseError::new(ParseErrorKind::InvalidEscape, offset + i - 2)),
        }
        run = i;
    }
    out.push_str(&raw[run..]);
    Ok(out)
}

fn shift(mut error: ParseError, offset: usize) -> ParseError {
    error.position += offset;
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_simple_sequences() {
        let out = unescape(r#"a\"b\\c\/d\ne\tf"#, 0).unwrap();
        assert_eq!(out, "a\"b\\c/d\ne\tf");
    }

    #[test]
    fn unescape_unicode_and_surrogates() {
        assert_eq!(unescape(r"\u00e9t\u00E9", 0).unwrap(), "\u{e9}t\u{e9}");
        assert_eq!(unescape(r"\ud83d\ude00", 0).unwrap(), "\u{1F600}");
        assert_eq!(unescape(r"x\ud83dy", 0).unwrap(), "x\u{FFFD}y");
        assert_eq!(unescape(r"\ude00", 0).unwrap(), "\u{FFFD}");
    }

    #[test]
    fn hex4_rejects_non_hex() {
        let err = hex4(b"12g4", 0).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidEscape);
        assert_eq!(err.position, 2);
    }
}
