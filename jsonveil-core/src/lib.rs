// jsonveil-core/src/lib.rs
//! # JsonVeil Core Library
//!
//! `jsonveil-core` masks and extracts fields of JSON documents in a single
//! forward pass over their tokens. The document is never materialized as a
//! tree: a declarative rule tree is matched against the path of every value
//! as it streams past, and the result is written token by token.
//!
//! Values that no rule claims are handled by an inherited value policy. The
//! default, `AllowList`, replaces every string and number with a type-tagged
//! placeholder, so new fields added to a document are redacted until a rule
//! explicitly lets them through.
//!
//! ## Modules
//!
//! * `path`: The per-call path buffer and the shared depth hint that sizes it.
//! * `matcher`: Property-name predicates and absolute/relative path matching.
//! * `strategy`: String masking strategies (literal, pattern, function).
//! * `policy`: Default value policies applied to unclaimed scalars.
//! * `rules`: The compiled rule tree and the builders that produce it.
//! * `engine` (private): The traversal engine interpreting a rule tree over a cursor.
//! * `sinks`: Output sinks: JSON text, null elision, and a no-op sink.
//! * `observer`: `JsonObserver`, the reusable entry point.
//! * `config`: Per-call options.
//! * `diagnostics`: Logging helpers that keep values out of debug output.
//! * `errors`: The `JsonVeilError` type.
//!
//! ## Public API
//!
//! **Rules**
//!
//! * [`ObjectBuilder`], [`ArrayBuilder`]: Rules scoped to one object or array,
//!   matched by absolute path.
//! * [`RelativeBuilder`]: Depth-independent rules, packaged as a [`ValuePolicy`].
//! * [`PropMatch`]: One segment predicate of a property path.
//! * [`MaskStrategy`]: How a string rule rewrites its value.
//!
//! **Running**
//!
//! * [`JsonObserver`]: `transform`, `transform_bytes`, `transform_into`,
//!   `extract`, `extract_bytes`, and `mask`.
//! * [`TransformOptions`], [`ReaderOptions`], [`WriterOptions`].
//!
//! **Extending**
//!
//! * [`JsonCursor`]: Any pull tokenizer can drive the engine.
//! * [`JsonSink`]: Any push writer can receive its output.
//!
//! ## Usage Example
//!
//! ```rust
//! use jsonveil_core::{JsonObserver, ObjectBuilder, PropMatch, TransformOptions};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     // 1. Describe what may pass and what must be masked.
//!     let rules = ObjectBuilder::<()>::new()
//!         .property("id").unmasked()
//!         .property(["card", "number"]).mask_str_with(|v, _| {
//!             v.map(|n| format!("****{}", &n[n.len().saturating_sub(4)..]))
//!         })
//!         .property(PropMatch::ends_with("_at")).unmasked()
//!         .build()?;
//!
//!     // 2. Compile once, reuse for every document.
//!     let observer = JsonObserver::object(rules);
//!
//!     // 3. Transform.
//!     let input = r#"{"id":1,"card":{"number":"4111111111111111","cvc":"123"},"created_at":"2024-01-01"}"#;
//!     let output = observer.mask(Some(input), &TransformOptions::default())?;
//!     assert_eq!(
//!         output.as_deref(),
//!         Some(r##"{"id":1,"card":{"number":"****1111","cvc":"#str#*****"},"created_at":"2024-01-01"}"##)
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`JsonVeilError`]. Malformed input and
//! structurally unexpected tokens are errors; a rule whose declared value type
//! does not fit the document is not, and the value falls back to the
//! inherited policy instead.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod config;
pub mod diagnostics;
mod engine;
pub mod errors;
pub mod matcher;
pub mod observer;
pub mod path;
pub mod policy;
pub mod rules;
pub mod sinks;
pub mod strategy;

/// Re-exports the per-call options.
pub use config::{CommentHandling, ReaderOptions, TransformOptions, WriterOptions};

/// Re-exports the custom error type for clear error reporting.
pub use errors::JsonVeilError;

/// Re-exports the reusable entry point.
pub use observer::JsonObserver;

/// Re-exports the building blocks of a rule tree.
pub use matcher::{IntoPath, MatchMode, PathMatcher, PropMatch};
pub use policy::{Emit, Scalar, ValuePolicy, NUMBER_PLACEHOLDER, STRING_PLACEHOLDER};
pub use rules::{ArrayBuilder, ObjectBuilder, RelativeBuilder, Scope};
pub use strategy::MaskStrategy;

/// Re-exports the path types visible to custom policies.
pub use path::{PropertyPath, Segment};

/// Re-exports the sink contract and its implementations.
pub use sinks::{JsonSink, NoopSink, NullElidingSink, TextSink};

/// Re-exports the cursor contract so custom tokenizers only need this crate.
pub use jsonveil_token::{JsonCursor, TokenKind};

pub use diagnostics::redact_sensitive;
