// jsonveil-core/src/observer.rs
//! The compiled, reusable entry point.
//!
//! A [`JsonObserver`] owns a frozen rule tree, the top-level value policy and
//! the depth hint used to pre-size path buffers. It is `Send + Sync`; every
//! call creates its own cursor, sink and path buffer, so one observer can
//! serve any number of threads at once.
//!
//! ```
//! use jsonveil_core::{JsonObserver, ObjectBuilder, TransformOptions};
//!
//! let observer = JsonObserver::object(
//!     ObjectBuilder::<()>::new()
//!         .property("id").unmasked()
//!         .property("email").mask_str("***")
//!         .build()
//!         .unwrap(),
//! );
//! let out = observer
//!     .mask(Some(r#"{"id":7,"email":"a@b.c","name":"Ann"}"#), &TransformOptions::default())
//!     .unwrap();
//! assert_eq!(out.as_deref(), Some(r##"{"id":7,"email":"***","name":"#str#*****"}"##));
//! ```
//!
//! License: MIT OR APACHE 2.0

use std::io::Write;

use jsonveil_token::{JsonCursor, Reader, ReaderOptions};
use log::debug;

use crate::config::TransformOptions;
use crate::engine::Walk;
use crate::errors::Result;
use crate::path::{DepthHint, PropertyPath};
use crate::policy::ValuePolicy;
use crate::rules::{Node, Scope};
use crate::sinks::{JsonSink, NoopSink, NullElidingSink, TextSink};

pub struct JsonObserver<C = ()> {
    root: Node<C>,
    default_policy: ValuePolicy<C>,
    depth_hint: DepthHint,
}

impl<C> JsonObserver<C> {
    fn with_root(root: Node<C>) -> Self {
        Self {
            root,
            default_policy: ValuePolicy::AllowList,
            depth_hint: DepthHint::default(),
        }
    }

    /// The document must be an object.
    pub fn object(scope: Scope<C>) -> Self {
        Self::with_root(Node::Object(scope))
    }

    /// The document must be an array.
    pub fn array(scope: Scope<C>) -> Self {
        Self::with_root(Node::Array(scope))
    }

    /// The document may be an object, an array, or `null`.
    pub fn any(object: Scope<C>, array: Scope<C>) -> Self {
        Self::with_root(Node::Any { object, array })
    }

    /// Replaces the top-level policy (`AllowList` unless set).
    pub fn with_default_policy(mut self, policy: ValuePolicy<C>) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn default_policy(&self) -> &ValuePolicy<C> {
        &self.default_policy
    }

    /// Deepest path walked so far by any call on this observer, and the size
    /// the next call's path buffer starts with.
    pub fn depth_hint(&self) -> usize {
        self.depth_hint.get()
    }

    /// Transforms `input` into JSON text. `None` input is returned as `None`
    /// without running anything.
    pub fn transform(&self, input: Option<&str>, ctx: &mut C, options: &TransformOptions) -> Result<Option<String>> {
        let Some(input) = input else {
            debug!("No input given, skipping transform.");
            return Ok(None);
        };
        debug!("Starting transform of {} bytes.", input.len());
        let mut output = Vec::with_capacity(input.len());
        self.write_text(Reader::new(input, options.reader.clone()), ctx, &mut output, options)?;
        debug!("Transform finished, produced {} bytes.", output.len());
        Ok(Some(String::from_utf8(output)?))
    }

    /// Like [`transform`](Self::transform) for UTF-8 bytes.
    pub fn transform_bytes(&self, input: &[u8], ctx: &mut C, options: &TransformOptions) -> Result<String> {
        debug!("Starting transform of {} bytes.", input.len());
        let mut output = Vec::with_capacity(input.len());
        let reader = Reader::from_slice(input, options.reader.clone())?;
        self.write_text(reader, ctx, &mut output, options)?;
        debug!("Transform finished, produced {} bytes.", output.len());
        Ok(String::from_utf8(output)?)
    }

    /// Streams the transformed document into `writer`.
    pub fn transform_into<W: Write>(&self, input: &[u8], ctx: &mut C, writer: W, options: &TransformOptions) -> Result<()> {
        debug!("Starting streamed transform of {} bytes.", input.len());
        let reader = Reader::from_slice(input, options.reader.clone())?;
        self.write_text(reader, ctx, writer, options)
    }

    /// Walks `input` for the side effects of its rules only. Nothing is
    /// written anywhere.
    pub fn extract(&self, input: Option<&str>, ctx: &mut C, options: &ReaderOptions) -> Result<()> {
        let Some(input) = input else {
            debug!("No input given, skipping extraction.");
            return Ok(());
        };
        debug!("Starting extraction over {} bytes.", input.len());
        self.drive(Reader::new(input, options.clone()), ctx, NoopSink)
    }

    pub fn extract_bytes(&self, input: &[u8], ctx: &mut C, options: &ReaderOptions) -> Result<()> {
        debug!("Starting extraction over {} bytes.", input.len());
        self.drive(Reader::from_slice(input, options.clone())?, ctx, NoopSink)
    }

    fn write_text<R: JsonCursor, W: Write>(&self, cursor: R, ctx: &mut C, writer: W, options: &TransformOptions) -> Result<()> {
        let skip_comments = options.ignore_comments;
        if options.writer.indented {
            let text = TextSink::pretty(writer, options.writer.indent.as_bytes());
            if options.ignore_nulls {
                self.drive(cursor, ctx, NullElidingSink::new(text).ignore_comments(skip_comments))
            } else {
                self.drive(cursor, ctx, text.skip_comments(skip_comments))
            }
        } else {
            let text = TextSink::compact(writer);
            if options.ignore_nulls {
                self.drive(cursor, ctx, NullElidingSink::new(text).ignore_comments(skip_comments))
            } else {
                self.drive(cursor, ctx, text.skip_comments(skip_comments))
            }
        }
    }

    fn drive<R: JsonCursor, S: JsonSink>(&self, cursor: R, ctx: &mut C, sink: S) -> Result<()> {
        let path = PropertyPath::with_capacity(self.depth_hint.get());
        let mut walk = Walk::new(cursor, sink, ctx, path);
        let outcome = walk.run(&self.root, &self.default_policy);
        self.depth_hint.raise(walk.path().max_len());
        if let Err(e) = &outcome {
            debug!("Traversal stopped: {}", e);
        }
        outcome
    }
}

impl JsonObserver<()> {
    /// [`transform`](Self::transform) for rule trees that need no context.
    pub fn mask(&self, input: Option<&str>, options: &TransformOptions) -> Result<Option<String>> {
        self.transform(input, &mut (), options)
    }
}
