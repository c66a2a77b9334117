//! The concrete pull tokenizer.
//!
//! [`Reader`] keeps a small state machine (what the grammar expects next) and
//! a stack of open containers. Every call to [`JsonCursor::advance`] scans
//! exactly one token and records the span of its payload so the decoders can
//! slice it out of the input later.

use alloc::borrow::Cow;
use alloc::vec::Vec;

use crate::cursor::{JsonCursor, TokenKind};
use crate::error::{ParseError, ParseErrorKind};
use crate::options::{CommentHandling, ReaderOptions};

mod lexeme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Need {
    RootValue,
    /// First array element, or `]`.
    ValueOrEnd,
    /// Array element after a comma.
    Value,
    /// First key, or `}`.
    KeyOrEnd,
    /// Key after a comma.
    Key,
    /// `:` after a key.
    Colon,
    /// The value of a property. Comments before it are skipped silently.
    PropertyValue,
    CommaOrEnd,
    Eof,
}

/// A zero-copy JSON tokenizer over a UTF-8 document.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    input: &'a str,
    pos: usize,
    options: ReaderOptions,
    max_depth: usize,
    stack: Vec<Container>,
    need: Need,
    kind: TokenKind,
    start: usize,
    span: (usize, usize),
    escaped: bool,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str, options: ReaderOptions) -> Self {
        let pos = if input.starts_with('\u{feff}') { 3 } else { 0 };
        Self {
            input,
            pos,
            max_depth: options.effective_max_depth(),
            options,
            stack: Vec::new(),
            need: Need::RootValue,
            kind: TokenKind::None,
            start: pos,
            span: (pos, pos),
            escaped: false,
        }
    }

    /// Validates the bytes as UTF-8 before reading them.
    pub fn from_slice(bytes: &'a [u8], options: ReaderOptions) -> Result<Self, ParseError> {
        let input = core::str::from_utf8(bytes)
            .map_err(|e| ParseError::new(ParseErrorKind::InvalidUtf8, e.valid_up_to()))?;
        Ok(Self::new(input, options))
    }

    /// Number of containers currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.pos)
    }

    fn payload(&self) -> &'a str {
        &self.input[self.span.0..self.span.1]
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    /// Skips whitespace and comments that should not surface. Returns `true`
    /// when the reader stopped on a comment that must become a token.
    fn skip_trivia(&mut self, surface_comments: bool) -> Result<bool, ParseError> {
        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'/') {
                return Ok(false);
            }
            match self.options.comment_handling {
                CommentHandling::Disallow => {
                    return Err(self.error(ParseErrorKind::CommentsNotAllowed))
                }
                CommentHandling::Allow if surface_comments => return Ok(true),
                _ => self.scan_comment()?,
            }
        }
    }

    fn emit(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        self.kind = kind;
        Ok(true)
    }

    fn after_value(&mut self) {
        self.need = if self.stack.is_empty() {
            Need::Eof
        } else {
            Need::CommaOrEnd
        };
    }

    fn open(&mut self, container: Container) -> Result<bool, ParseError> {
        if self.stack.len() >= self.max_depth {
            return Err(self.error(ParseErrorKind::DepthExceeded(self.max_depth)));
        }
        self.stack.push(container);
        self.span = (self.pos, self.pos + 1);
        self.pos += 1;
        match container {
            Container::Object => {
                self.need = Need::KeyOrEnd;
                self.emit(TokenKind::StartObject)
            }
            Container::Array => {
                self.need = Need::ValueOrEnd;
                self.emit(TokenKind::StartArray)
            }
        }
    }

    fn close(&mut self, container: Container) -> Result<bool, ParseError> {
        self.stack.pop();
        self.span = (self.pos, self.pos + 1);
        self.pos += 1;
        self.after_value();
        match container {
            Container::Object => self.emit(TokenKind::EndObject),
            Container::Array => self.emit(TokenKind::EndArray),
        }
    }

    fn value(&mut self, byte: u8) -> Result<bool, ParseError> {
        let kind = match byte {
            b'{' => return self.open(Container::Object),
            b'[' => return self.open(Container::Array),
            b'"' => {
                self.scan_string()?;
                TokenKind::String
            }
            b'-' | b'0'..=b'9' => {
                self.scan_number()?;
                TokenKind::Number
            }
            b't' => {
                self.scan_literal(b"true")?;
                TokenKind::True
            }
            b'f' => {
                self.scan_literal(b"false")?;
                TokenKind::False
            }
            b'n' => {
                self.scan_literal(b"null")?;
                TokenKind::Null
            }
            _ => return Err(self.error(ParseErrorKind::UnexpectedByte(byte))),
        };
        self.after_value();
        self.emit(kind)
    }

    fn key(&mut self, byte: u8) -> Result<bool, ParseError> {
        if byte != b'"' {
            return Err(self.error(ParseErrorKind::UnexpectedByte(byte)));
        }
        self.scan_string()?;
        self.need = Need::Colon;
        self.emit(TokenKind::PropertyName)
    }

    fn number_text(&self) -> Result<&'a str, ParseError> {
        match self.kind {
            TokenKind::Number => Ok(self.payload()),
            _ => Err(ParseError::new(ParseErrorKind::WrongTokenKind, self.start)),
        }
    }

    fn invalid_number(&self) -> ParseError {
        ParseError::new(ParseErrorKind::InvalidNumber, self.start)
    }
}

impl<'a> JsonCursor for Reader<'a> {
    fn token_kind(&self) -> TokenKind {
        self.kind
    }

    fn advance(&mut self) -> Result<bool, ParseError> {
        loop {
            let surface = !matches!(self.need, Need::Colon | Need::PropertyValue);
            if self.skip_trivia(surface)? {
                self.start = self.pos;
                self.scan_comment()?;
                return self.emit(TokenKind::Comment);
            }

            self.start = self.pos;
            let Some(byte) = self.peek() else {
                return match self.need {
                    Need::Eof => {
                        self.kind = TokenKind::None;
                        Ok(false)
                    }
                    _ => Err(self.error(ParseErrorKind::UnexpectedEnd)),
                };
            };

            let trailing = self.options.allow_trailing_commas;
            match self.need {
                Need::RootValue | Need::PropertyValue => return self.value(byte),
                Need::ValueOrEnd => {
                    if byte == b']' {
                        return self.close(Container::Array);
                    }
                    return self.value(byte);
                }
                Need::Value => {
                    if byte == b']' && trailing {
                        return self.close(Container::Array);
                    }
                    return self.value(byte);
                }
                Need::KeyOrEnd => {
                    if byte == b'}' {
                        return self.close(Container::Object);
                    }
                    return self.key(byte);
                }
                Need::Key => {
                    if byte == b'}' && trailing {
                        return self.close(Container::Object);
                    }
                    return self.key(byte);
                }
                Need::Colon => {
                    if byte != b':' {
                        return Err(self.error(ParseErrorKind::UnexpectedByte(byte)));
                    }
                    self.pos += 1;
                    self.need = Need::PropertyValue;
                }
                Need::CommaOrEnd => match (byte, self.stack.last()) {
                    (b',', Some(Container::Object)) => {
                        self.pos += 1;
                        self.need = Need::Key;
                    }
                    (b',', Some(Container::Array)) => {
                        self.pos += 1;
                        self.need = Need::Value;
                    }
                    (b'}', Some(Container::Object)) => return self.close(Container::Object),
                    (b']', Some(Container::Array)) => return self.close(Container::Array),
                    _ => return Err(self.error(ParseErrorKind::UnexpectedByte(byte))),
                },
                Need::Eof => return Err(self.error(ParseErrorKind::TrailingContent)),
            }
        }
    }

    fn decode_string(&self) -> Result<Cow<'_, str>, ParseError> {
        match self.kind {
            TokenKind::String | TokenKind::PropertyName if self.escaped => {
                lexeme::unescape(self.payload(), self.span.0).map(Cow::Owned)
            }
            TokenKind::String | TokenKind::PropertyName => Ok(Cow::Borrowed(self.payload())),
            _ => Err(ParseError::new(ParseErrorKind::WrongTokenKind, self.start)),
        }
    }

    fn decode_i32(&self) -> Result<i32, ParseError> {
        self.number_text()?.parse().map_err(|_| self.invalid_number())
    }

    fn decode_i64(&self) -> Result<i64, ParseError> {
        self.number_text()?.parse().map_err(|_| self.invalid_number())
    }

    fn decode_f64(&self) -> Result<f64, ParseError> {
        self.number_text()?.parse().map_err(|_| self.invalid_number())
    }

    fn decode_bool(&self) -> Result<bool, ParseError> {
        match self.kind {
            TokenKind::True => Ok(true),
            TokenKind::False => Ok(false),
            _ => Err(ParseError::new(ParseErrorKind::WrongTokenKind, self.start)),
        }
    }

    fn decode_raw(&self) -> Result<&str, ParseError> {
        if self.kind.is_value() {
            Ok(self.payload())
        } else {
            Err(ParseError::new(ParseErrorKind::WrongTokenKind, self.start))
        }
    }

    fn decode_comment(&self) -> Result<&str, ParseError> {
        match self.kind {
            TokenKind::Comment => Ok(self.payload()),
            _ => Err(ParseError::new(ParseErrorKind::WrongTokenKind, self.start)),
        }
    }

    fn position(&self) -> usize {
        self.start
    }
}
