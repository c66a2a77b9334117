// jsonveil-token/src/lib.rs
//! A forward-only JSON tokenizer.
//!
//! `jsonveil-token` exposes a single pull-style [`JsonCursor`] contract and one
//! implementation of it, [`Reader`], which walks a UTF-8 document token by
//! token without building a tree. Payloads are decoded on demand; strings
//! without escape sequences are handed out as borrowed slices of the input.
//!
//! The crate is `no_std` and only needs `alloc` (for the container stack and
//! for unescaping strings).
//!
//! ```
//! use jsonveil_token::{JsonCursor, Reader, ReaderOptions, TokenKind};
//!
//! let mut reader = Reader::new(r#"{"id":42}"#, ReaderOptions::default());
//! assert!(reader.advance().unwrap());
//! assert_eq!(reader.token_kind(), TokenKind::StartObject);
//! reader.advance().unwrap();
//! assert_eq!(reader.decode_string().unwrap(), "id");
//! reader.advance().unwrap();
//! assert_eq!(reader.decode_i64().unwrap(), 42);
//! ```
//!
//! License: MIT OR Apache-2.0
#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod cursor;
pub mod error;
pub mod options;
pub mod reader;

pub use cursor::{JsonCursor, TokenKind};
pub use error::{ParseError, ParseErrorKind};
pub use options::{CommentHandling, ReaderOptions};
pub use reader::Reader;
