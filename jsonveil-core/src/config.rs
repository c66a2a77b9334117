// jsonveil-core/src/config.rs
//! Options for a single transform or extraction run.
//!
//! These are plain `serde` structures with defaults on every field, so an
//! application can embed them in whatever configuration format it already
//! loads. Nothing here touches the filesystem.
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Serialize};

pub use jsonveil_token::{CommentHandling, ReaderOptions};

/// Default indentation unit for pretty-printed output.
pub const DEFAULT_INDENT: &str = "  ";

/// How the transformed document is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Pretty-print with one entry per line.
    pub indented: bool,
    /// Indentation unit used when `indented` is set.
    pub indent: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            indented: false,
            indent: DEFAULT_INDENT.to_string(),
        }
    }
}

/// Options for [`JsonObserver::transform`](crate::JsonObserver::transform).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Drop null values from the output, together with their property names
    /// and any object or array left without surviving content.
    pub ignore_nulls: bool,
    /// Drop comments instead of copying them to the output.
    pub ignore_comments: bool,
    pub reader: ReaderOptions,
    pub writer: WriterOptions,
}

impl TransformOptions {
    pub fn ignore_nulls(mut self, value: bool) -> Self {
        self.ignore_nulls = value;
        self
    }

    pub fn ignore_comments(mut self, value: bool) -> Self {
        self.ignore_comments = value;
        self
    }

    pub fn indented(mut self, value: bool) -> Self {
        self.writer.indented = value;
        self
    }

    pub fn comment_handling(mut self, handling: CommentHandling) -> Self {
        self.reader.comment_handling = handling;
        self
    }
}
