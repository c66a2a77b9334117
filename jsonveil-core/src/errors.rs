//! errors.rs - Custom error types for the jsonveil-core library.
//!
//! One structured error enum covers rule construction, tokenizer failures and
//! traversal protocol violations, so callers can tell a bad rule set apart
//! from a bad document.
//!
//! License: MIT OR APACHE 2.0

use jsonveil_token::{ParseError, TokenKind};
use thiserror::Error;

/// This enum represents all possible error types in the `jsonveil-core` library.
///
/// The enum is `#[non_exhaustive]`: new variants may be added without a
/// breaking release.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum JsonVeilError {
    /// The cursor produced a token that cannot appear at the current position
    /// of the traversal, or that does not fit the declared root shape.
    #[error("Wrong path: unexpected {found} token at byte {position}")]
    WrongPath { found: TokenKind, position: usize },

    #[error("Wrong path: document ended inside an open object or array")]
    UnexpectedEnd,

    #[error("Malformed JSON: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to compile property pattern '{0}': {1}")]
    RuleCompilationError(String, regex::Error),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Aggregated report of every rule that failed while building a scope.
    #[error("A fatal error occurred: {0}")]
    Fatal(String),

    #[error("Output sink misuse: {0}")]
    SinkState(&'static str),

    #[error("Output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    /// Raised by a caller-supplied value policy.
    #[error("A value policy callback failed: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),
}

impl JsonVeilError {
    pub(crate) fn wrong_path(found: TokenKind, position: usize) -> Self {
        JsonVeilError::WrongPath { found, position }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = JsonVeilError> = std::result::Result<T, E>;
