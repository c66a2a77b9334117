//! The cursor contract consumed by the traversal engine.

use alloc::borrow::Cow;
use core::fmt;

use crate::error::ParseError;

/// Discriminant of the token the cursor currently sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Before the first token, or after the last one.
    None,
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    PropertyName,
    String,
    Number,
    True,
    False,
    Null,
    Comment,
}

impl TokenKind {
    /// Scalars: strings, numbers, booleans and null.
    pub fn is_value(self) -> bool {
        matches!(
            self,
            TokenKind::String | TokenKind::Number | TokenKind::True | TokenKind::False | TokenKind::Null
        )
    }

    pub fn is_container_start(self) -> bool {
        matches!(self, TokenKind::StartObject | TokenKind::StartArray)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::None => "None",
            TokenKind::StartObject => "StartObject",
            TokenKind::EndObject => "EndObject",
            TokenKind::StartArray => "StartArray",
            TokenKind::EndArray => "EndArray",
            TokenKind::PropertyName => "PropertyName",
            TokenKind::String => "String",
            TokenKind::Number => "Number",
            TokenKind::True => "True",
            TokenKind::False => "False",
            TokenKind::Null => "Null",
            TokenKind::Comment => "Comment",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A forward-only view over a token stream.
///
/// `advance` moves to the next token and returns `false` once the input is
/// exhausted. The `decode_*` accessors interpret the current token's payload
/// and fail with [`ParseErrorKind::WrongTokenKind`](crate::ParseErrorKind::WrongTokenKind)
/// or [`ParseErrorKind::InvalidNumber`](crate::ParseErrorKind::InvalidNumber)
/// when it cannot be represented as the requested type.
pub trait JsonCursor {
    fn token_kind(&self) -> TokenKind;

    fn advance(&mut self) -> Result<bool, ParseError>;

    /// Unescaped contents of a `String` or `PropertyName` token.
    fn decode_string(&self) -> Result<Cow<'_, str>, ParseError>;

    fn decode_i32(&self) -> Result<i32, ParseError>;

    fn decode_i64(&self) -> Result<i64, ParseError>;

    fn decode_f64(&self) -> Result<f64, ParseError>;

    fn decode_bool(&self) -> Result<bool, ParseError>;

    /// Literal source text of a scalar. Strings come back without their
    /// quotes and with escape sequences left as written.
    fn decode_raw(&self) -> Result<&str, ParseError>;

    /// Comment text without its delimiters.
    fn decode_comment(&self) -> Result<&str, ParseError>;

    /// Byte offset of the current token in the input.
    fn position(&self) -> usize;
}
