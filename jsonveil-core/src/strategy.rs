// jsonveil-core/src/strategy.rs
//! String masking strategies.
//!
//! A string rule can be given a fixed replacement, a regular expression with a
//! replacement template, or an arbitrary function. All three resolve to the
//! same transform shape when the rule is built, so the engine only ever sees
//! a function.

use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::errors::{JsonVeilError, Result};
use crate::matcher::MAX_PATTERN_SIZE;

/// Transform applied to a decoded string (or `None` for a JSON null).
/// Returning `None` writes a null.
pub type StrTransform<C> = Arc<dyn Fn(Option<&str>, &mut C) -> Option<String> + Send + Sync>;

/// Replacement used by [`MaskStrategy::Pattern`] when none is given.
pub const DEFAULT_PATTERN_REPLACEMENT: &str = "*";

pub enum MaskStrategy<C> {
    /// Every value, null included, becomes this text.
    Literal(String),
    /// Every match of `regex` in a non-null value is replaced. Nulls stay null.
    Pattern { regex: Regex, replacement: String },
    Function(StrTransform<C>),
}

impl<C> MaskStrategy<C> {
    pub fn literal(text: impl Into<String>) -> Self {
        MaskStrategy::Literal(text.into())
    }

    /// Compiles `pattern` and pairs it with a `regex` replacement template
    /// (`$1`, `${name}` are expanded).
    pub fn pattern(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .size_limit(MAX_PATTERN_SIZE)
            .build()
            .map_err(|e| JsonVeilError::RuleCompilationError(pattern.to_string(), e))?;
        Ok(MaskStrategy::Pattern {
            regex,
            replacement: replacement.into(),
        })
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(Option<&str>, &mut C) -> Option<String> + Send + Sync + 'static,
    {
        MaskStrategy::Function(Arc::new(f))
    }
}

impl<C: 'static> MaskStrategy<C> {
    pub(crate) fn into_transform(self) -> StrTransform<C> {
        match self {
            MaskStrategy::Literal(text) => Arc::new(move |_: Option<&str>, _: &mut C| Some(text.clone())),
            MaskStrategy::Pattern { regex, replacement } => Arc::new(move |value: Option<&str>, _: &mut C| {
                value.map(|v| regex.replace_all(v, replacement.as_str()).into_owned())
            }),
            MaskStrategy::Function(f) => f,
        }
    }
}

impl<C> fmt::Debug for MaskStrategy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskStrategy::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            MaskStrategy::Pattern { regex, replacement } => f
                .debug_struct("Pattern")
                .field("regex", &regex.as_str())
                .field("replacement", replacement)
                .finish(),
            MaskStrategy::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl<C> From<&str> for MaskStrategy<C> {
    fn from(text: &str) -> Self {
        MaskStrategy::Literal(text.to_string())
    }
}

impl<C> From<String> for MaskStrategy<C> {
    fn from(text: String) -> Self {
        MaskStrategy::Literal(text)
    }
}

impl<C> From<Regex> for MaskStrategy<C> {
    fn from(regex: Regex) -> Self {
        MaskStrategy::Pattern {
            regex,
            replacement: DEFAULT_PATTERN_REPLACEMENT.to_string(),
        }
    }
}
