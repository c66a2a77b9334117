use core::fmt;

/// What went wrong while tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    UnexpectedByte(u8),
    UnexpectedEnd,
    InvalidUtf8,
    InvalidEscape,
    InvalidNumber,
    ControlCharacter,
    DepthExceeded(usize),
    CommentsNotAllowed,
    TrailingContent,
    /// A decoder was called while the cursor sat on a token it cannot decode.
    WrongTokenKind,
}

/// A tokenizer failure together with the byte offset it was detected at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self { kind, position }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedByte(b) if b.is_ascii_graphic() => {
                write!(f, "unexpected character '{}'", *b as char)
            }
            ParseErrorKind::UnexpectedByte(b) => write!(f, "unexpected byte 0x{:02x}", b),
            ParseErrorKind::UnexpectedEnd => f.write_str("unexpected end of input"),
            ParseErrorKind::InvalidUtf8 => f.write_str("input is not valid UTF-8"),
            ParseErrorKind::InvalidEscape => f.write_str("invalid escape sequence"),
            ParseErrorKind::InvalidNumber => f.write_str("invalid number"),
            ParseErrorKind::ControlCharacter => f.write_str("unescaped control character in string"),
            ParseErrorKind::DepthExceeded(max) => write!(f, "maximum nesting depth of {} exceeded", max),
            ParseErrorKind::CommentsNotAllowed => f.write_str("comments are not allowed"),
            ParseErrorKind::TrailingContent => f.write_str("trailing content after the root value"),
            ParseErrorKind::WrongTokenKind => f.write_str("current token cannot be decoded as the requested type"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.kind, self.position)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}
