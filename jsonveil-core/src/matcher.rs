// jsonveil-core/src/matcher.rs
//! Property-name predicates and the multi-segment path matchers built from them.
//!
//! A [`PathMatcher`] is an ordered list of [`PropMatch`] predicates, one per
//! path segment. It is evaluated in one of two modes:
//!
//! * **absolute**: predicate `i` is tested against the segment at
//!   `depth + i`, and the last predicate must land on the current tip. Used
//!   for rules declared inside a known scope.
//! * **relative**: the last predicate is tested against the tip, the one
//!   before it against the tip's parent, and so on. The total depth of the
//!   tip does not matter.
//!
//! Named predicates compare ASCII case-insensitively by default, falling back
//! to full Unicode lowercasing for non-ASCII names.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::errors::{JsonVeilError, Result};
use crate::path::{PropertyPath, Segment};

/// Upper bound on the compiled size of a property-name pattern.
pub const MAX_PATTERN_SIZE: usize = 10 * (1 << 20);

type NamePredicate = Arc<dyn Fn(Option<&str>) -> bool + Send + Sync>;

/// A predicate over a single path segment.
#[derive(Clone)]
pub enum PropMatch {
    Exact { value: String, case_sensitive: bool },
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Pattern(Regex),
    OneOf(Vec<String>),
    /// An array slot.
    Element,
    /// Any segment that exists, named or not.
    Any,
    /// Caller predicate. Receives `None` for array slots.
    Func(NamePredicate),
}

impl PropMatch {
    pub fn exact(value: impl Into<String>) -> Self {
        PropMatch::Exact {
            value: value.into(),
            case_sensitive: false,
        }
    }

    pub fn exact_case_sensitive(value: impl Into<String>) -> Self {
        PropMatch::Exact {
            value: value.into(),
            case_sensitive: true,
        }
    }

    pub fn starts_with(value: &str) -> Self {
        PropMatch::StartsWith(fold(value).into_owned())
    }

    pub fn ends_with(value: &str) -> Self {
        PropMatch::EndsWith(fold(value).into_owned())
    }

    pub fn contains(value: &str) -> Self {
        PropMatch::Contains(fold(value).into_owned())
    }

    pub fn one_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropMatch::OneOf(names.into_iter().map(Into::into).collect())
    }

    /// Compiles `pattern` as a case-insensitive regular expression.
    pub fn pattern(pattern: &str) -> Result<Self> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(MAX_PATTERN_SIZE)
            .build()
            .map(PropMatch::Pattern)
            .map_err(|e| JsonVeilError::RuleCompilationError(pattern.to_string(), e))
    }

    pub fn func<F>(predicate: F) -> Self
    where
        F: Fn(Option<&str>) -> bool + Send + Sync + 'static,
    {
        PropMatch::Func(Arc::new(predicate))
    }

    /// Tests one segment. An absent segment (past the tip or above the root)
    /// never matches.
    pub fn matches(&self, segment: Option<Segment<'_>>) -> bool {
        let Some(segment) = segment else {
            return false;
        };
        match (self, segment) {
            (PropMatch::Any, _) => true,
            (PropMatch::Element, segment) => segment == Segment::Element,
            (PropMatch::Func(predicate), segment) => predicate(segment.name()),
            (_, Segment::Element) => false,
            (PropMatch::Exact { value, case_sensitive: true }, Segment::Name(name)) => value == name,
            (PropMatch::Exact { value, .. }, Segment::Name(name)) => eq_ignore_case(value, name),
            (PropMatch::StartsWith(prefix), Segment::Name(name)) => fold(name).starts_with(prefix.as_str()),
            (PropMatch::EndsWith(suffix), Segment::Name(name)) => fold(name).ends_with(suffix.as_str()),
            (PropMatch::Contains(needle), Segment::Name(name)) => fold(name).contains(needle.as_str()),
            (PropMatch::Pattern(regex), Segment::Name(name)) => regex.is_match(name),
            (PropMatch::OneOf(names), Segment::Name(name)) => {
                names.iter().any(|candidate| eq_ignore_case(candidate, name))
            }
        }
    }
}

impl fmt::Debug for PropMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropMatch::Exact { value, case_sensitive } => f
                .debug_struct("Exact")
                .field("value", value)
                .field("case_sensitive", case_sensitive)
                .finish(),
            PropMatch::StartsWith(v) => f.debug_tuple("StartsWith").field(v).finish(),
            PropMatch::EndsWith(v) => f.debug_tuple("EndsWith").field(v).finish(),
            PropMatch::Contains(v) => f.debug_tuple("Contains").field(v).finish(),
            PropMatch::Pattern(r) => f.debug_tuple("Pattern").field(&r.as_str()).finish(),
            PropMatch::OneOf(v) => f.debug_tuple("OneOf").field(v).finish(),
            PropMatch::Element => f.write_str("Element"),
            PropMatch::Any => f.write_str("Any"),
            PropMatch::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<&str> for PropMatch {
    fn from(value: &str) -> Self {
        PropMatch::exact(value)
    }
}

impl From<String> for PropMatch {
    fn from(value: String) -> Self {
        PropMatch::exact(value)
    }
}

impl From<Regex> for PropMatch {
    fn from(regex: Regex) -> Self {
        PropMatch::Pattern(regex)
    }
}

fn fold(s: &str) -> Cow<'_, str> {
    if s.is_ascii() {
        if s.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(s.to_ascii_lowercase())
        } else {
            Cow::Borrowed(s)
        }
    } else {
        Cow::Owned(s.to_lowercase())
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// Anything that can describe the segments of a rule's path.
pub trait IntoPath {
    fn into_path(self) -> Vec<PropMatch>;
}

impl IntoPath for &str {
    fn into_path(self) -> Vec<PropMatch> {
        vec![self.into()]
    }
}

impl IntoPath for String {
    fn into_path(self) -> Vec<PropMatch> {
        vec![self.into()]
    }
}

impl IntoPath for PropMatch {
    fn into_path(self) -> Vec<PropMatch> {
        vec![self]
    }
}

impl<T: Into<PropMatch>, const N: usize> IntoPath for [T; N] {
    fn into_path(self) -> Vec<PropMatch> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<PropMatch>> IntoPath for Vec<T> {
    fn into_path(self) -> Vec<PropMatch> {
        self.into_iter().map(Into::into).collect()
    }
}

/// How a [`PathMatcher`] is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Absolute,
    Relative,
}

/// An ordered, non-empty list of segment predicates.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    predicates: Vec<PropMatch>,
}

impl PathMatcher {
    pub fn new(predicates: Vec<PropMatch>) -> Result<Self> {
        if predicates.is_empty() {
            return Err(JsonVeilError::InvalidRule(
                "a property path needs at least one segment".to_string(),
            ));
        }
        Ok(Self { predicates })
    }

    /// Number of segments the matcher consumes on success.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Returns the depth consumed when the path matches.
    pub fn matches(&self, mode: MatchMode, depth: usize, path: &PropertyPath) -> Option<usize> {
        let hit = match mode {
            MatchMode::Absolute => self.absolute_match(depth, path),
            MatchMode::Relative => self.relative_match(path),
        };
        hit.then_some(self.predicates.len())
    }

    fn absolute_match(&self, depth: usize, path: &PropertyPath) -> bool {
        if depth + self.predicates.len() != path.len() {
            return false;
        }
        self.predicates
            .iter()
            .enumerate()
            .all(|(i, predicate)| predicate.matches(path.get(depth + i)))
    }

    fn relative_match(&self, path: &PropertyPath) -> bool {
        self.predicates
            .iter()
            .rev()
            .enumerate()
            .all(|(offset, predicate)| predicate.matches(path.get_from_tip(offset)))
    }
}

impl fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match predicate {
                PropMatch::Exact { value, .. } => f.write_str(value)?,
                PropMatch::Element => f.write_str("[]")?,
                PropMatch::Any => f.write_str("*")?,
                other => write!(f, "{:?}", other)?,
            }
        }
        Ok(())
    }
}
