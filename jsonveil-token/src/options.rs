/// How the reader treats `//` and `/* */` comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommentHandling {
    /// Comments are a syntax error.
    #[default]
    Disallow,
    /// Comments are consumed silently.
    Skip,
    /// Comments are surfaced as [`TokenKind::Comment`](crate::TokenKind::Comment) tokens.
    Allow,
}

/// Reader configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderOptions {
    pub comment_handling: CommentHandling,
    /// Maximum number of open containers. Zero means the default of 64.
    pub max_depth: usize,
    pub allow_trailing_commas: bool,
}

pub const DEFAULT_MAX_DEPTH: usize = 64;

impl ReaderOptions {
    pub(crate) fn effective_max_depth(&self) -> usize {
        if self.max_depth == 0 {
            DEFAULT_MAX_DEPTH
        } else {
            self.max_depth
        }
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            comment_handling: CommentHandling::Disallow,
            max_depth: DEFAULT_MAX_DEPTH,
            allow_trailing_commas: false,
        }
    }
}
