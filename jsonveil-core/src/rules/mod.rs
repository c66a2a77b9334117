// jsonveil-core/src/rules/mod.rs
//! The compiled rule tree.
//!
//! A rule tree is plain data: a [`Scope`] holds an ordered list of [`Rule`]s
//! and an optional policy override, each rule pairs a [`RuleMatcher`] with the
//! [`Node`] to run when it matches, and container nodes hold nested scopes.
//! The traversal engine interprets this tree; nothing in it is mutated after
//! [`build`](ObjectBuilder::build).
//!
//! Trees are assembled with the builders in [`builder`].

use std::fmt;
use std::sync::Arc;

use jsonveil_token::TokenKind;

use crate::matcher::{MatchMode, PathMatcher};
use crate::path::{PropertyPath, Segment};
use crate::policy::ValuePolicy;
use crate::strategy::StrTransform;

pub mod builder;

pub use builder::{ArrayBuilder, NestingHost, ObjectBuilder, RelativeBuilder, RuleHost, RuleSlot};

/// Token kinds a rule is willing to claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expects {
    /// Any value; the node decides what to do with a mismatch.
    Anything,
    /// Scalars only.
    Value,
    Object,
    Array,
    /// An object or an array.
    Container,
}

impl Expects {
    pub fn accepts(self, kind: TokenKind) -> bool {
        match self {
            Expects::Anything => kind.is_value() || kind.is_container_start(),
            Expects::Value => kind.is_value(),
            Expects::Object => kind == TokenKind::StartObject,
            Expects::Array => kind == TokenKind::StartArray,
            Expects::Container => kind.is_container_start(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RuleMatcher {
    /// Matches a property path.
    Path {
        matcher: PathMatcher,
        mode: MatchMode,
        expects: Expects,
    },
    /// Matches a slot of the array being walked whose token kind fits.
    Element(Expects),
}

impl RuleMatcher {
    /// Returns the depth the rule consumes when it claims the current token.
    pub fn matches(&self, depth: usize, path: &PropertyPath, kind: TokenKind) -> Option<usize> {
        match self {
            RuleMatcher::Path {
                matcher,
                mode,
                expects,
            } => {
                if !expects.accepts(kind) {
                    return None;
                }
                matcher.matches(*mode, depth, path)
            }
            RuleMatcher::Element(expects) => {
                let at_slot = path.len() == depth + 1 && path.get(depth) == Some(Segment::Element);
                (at_slot && expects.accepts(kind)).then_some(1)
            }
        }
    }
}

impl fmt::Display for RuleMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleMatcher::Path { matcher, mode, .. } => match mode {
                MatchMode::Absolute => write!(f, "{}", matcher),
                MatchMode::Relative => write!(f, "**.{}", matcher),
            },
            RuleMatcher::Element(expects) => write!(f, "[] ({:?})", expects),
        }
    }
}

pub type Transform<T, C> = Arc<dyn Fn(Option<T>, &mut C) -> Option<String> + Send + Sync>;

/// A typed leaf function. `None` input means the document held a null;
/// `None` output writes a null.
pub enum LeafTransform<C> {
    Str(StrTransform<C>),
    Int32(Transform<i32, C>),
    Int64(Transform<i64, C>),
    Decimal(Transform<f64, C>),
    Bool(Transform<bool, C>),
    /// Receives the literal token text (strings without quotes, escapes kept).
    Raw(StrTransform<C>),
}

impl<C> LeafTransform<C> {
    /// Whether the handler can decode a token of this kind.
    pub fn accepts(&self, kind: TokenKind) -> bool {
        match self {
            LeafTransform::Str(_) => matches!(kind, TokenKind::String | TokenKind::Null),
            LeafTransform::Int32(_) | LeafTransform::Int64(_) | LeafTransform::Decimal(_) => {
                matches!(kind, TokenKind::Number | TokenKind::Null)
            }
            LeafTransform::Bool(_) => {
                matches!(kind, TokenKind::True | TokenKind::False | TokenKind::Null)
            }
            LeafTransform::Raw(_) => kind.is_value(),
        }
    }

    pub fn expected(&self) -> &'static str {
        match self {
            LeafTransform::Str(_) => "a string",
            LeafTransform::Int32(_) => "a 32-bit integer",
            LeafTransform::Int64(_) => "a 64-bit integer",
            LeafTransform::Decimal(_) => "a decimal",
            LeafTransform::Bool(_) => "a boolean",
            LeafTransform::Raw(_) => "a scalar",
        }
    }
}

/// What a leaf writes after its function has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafOutput {
    /// The function's result, as a string or null.
    Replace,
    /// The original token, unchanged. Used by the `read_*` rules.
    PassThrough,
}

pub struct LeafHandler<C> {
    pub transform: LeafTransform<C>,
    pub output: LeafOutput,
}

/// What to do with a value once a rule claimed it.
pub enum Node<C> {
    Object(Scope<C>),
    Array(Scope<C>),
    Any { object: Scope<C>, array: Scope<C> },
    Leaf(LeafHandler<C>),
    /// Apply a policy to the value, or to every scalar below it.
    Policy(ValuePolicy<C>),
}

/// An ordered rule list plus an optional policy override for the subtree.
pub struct Scope<C> {
    pub(crate) rules: Vec<Rule<C>>,
    pub(crate) policy: Option<ValuePolicy<C>>,
}

impl<C> Scope<C> {
    pub(crate) fn new(rules: Vec<Rule<C>>, policy: Option<ValuePolicy<C>>) -> Self {
        Self { rules, policy }
    }

    pub fn rules(&self) -> &[Rule<C>] {
        &self.rules
    }

    pub fn policy(&self) -> Option<&ValuePolicy<C>> {
        self.policy.as_ref()
    }

    /// The scope's own policy if it has one, otherwise the inherited one.
    pub fn effective_policy<'a>(&'a self, inherited: &'a ValuePolicy<C>) -> &'a ValuePolicy<C> {
        self.policy.as_ref().unwrap_or(inherited)
    }
}

impl<C> Default for Scope<C> {
    fn default() -> Self {
        Self::new(Vec::new(), None)
    }
}

pub struct Rule<C> {
    pub matcher: RuleMatcher,
    pub node: Node<C>,
}

/// First rule, in declaration order, that claims the current token.
pub(crate) fn first_match<'r, C>(
    rules: &'r [Rule<C>],
    depth: usize,
    path: &PropertyPath,
    kind: TokenKind,
) -> Option<(&'r Rule<C>, usize)> {
    rules.iter().find_map(|rule| {
        rule.matcher
            .matches(depth, path, kind)
            .map(|consumed| (rule, depth + consumed))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{IntoPath, PropMatch};

    fn path_rule(path: Vec<PropMatch>, expects: Expects) -> Rule<()> {
        Rule {
            matcher: RuleMatcher::Path {
                matcher: PathMatcher::new(path).unwrap(),
                mode: MatchMode::Absolute,
                expects,
            },
            node: Node::Policy(ValuePolicy::BlockList),
        }
    }

    #[test]
    fn expects_filters_token_kinds() {
        assert!(Expects::Anything.accepts(TokenKind::StartObject));
        assert!(!Expects::Anything.accepts(TokenKind::Comment));
        assert!(Expects::Value.accepts(TokenKind::Null));
        assert!(!Expects::Value.accepts(TokenKind::StartArray));
        assert!(Expects::Container.accepts(TokenKind::StartArray));
        assert!(!Expects::Object.accepts(TokenKind::StartArray));
    }

    #[test]
    fn first_declared_rule_wins() {
        let rules = vec![
            path_rule("a".into_path(), Expects::Object),
            path_rule("a".into_path(), Expects::Anything),
            path_rule(vec![PropMatch::Any], Expects::Anything),
        ];
        let mut path = PropertyPath::new();
        path.push_name("a");

        let (rule, next) = first_match(&rules, 0, &path, TokenKind::StartObject).unwrap();
        assert!(std::ptr::eq(rule, &rules[0]));
        assert_eq!(next, 1);

        let (rule, _) = first_match(&rules, 0, &path, TokenKind::String).unwrap();
        assert!(std::ptr::eq(rule, &rules[1]));

        path.pop();
        path.push_name("b");
        let (rule, _) = first_match(&rules, 0, &path, TokenKind::Number).unwrap();
        assert!(std::ptr::eq(rule, &rules[2]));
    }

    #[test]
    fn element_rules_consume_one_segment() {
        let rule: Rule<()> = Rule {
            matcher: RuleMatcher::Element(Expects::Value),
            node: Node::Policy(ValuePolicy::NullList),
        };
        let mut path = PropertyPath::new();
        path.push_name("tags");
        path.push_element();
        let rules = [rule];
        assert_eq!(first_match(&rules, 1, &path, TokenKind::String).map(|m| m.1), Some(2));
        assert!(first_match(&rules, 1, &path, TokenKind::StartObject).is_none());

        // A property of an unclaimed object inside the array is not a slot.
        path.push_name("label");
        assert!(first_match(&rules, 1, &path, TokenKind::String).is_none());
    }

    #[test]
    fn leaf_kind_groups() {
        let s: LeafTransform<()> = LeafTransform::Str(Arc::new(|v: Option<&str>, _: &mut ()| v.map(str::to_string)));
        assert!(s.accepts(TokenKind::Null));
        assert!(!s.accepts(TokenKind::Number));
        let b: LeafTransform<()> = LeafTransform::Bool(Arc::new(|_: Option<bool>, _: &mut ()| None));
        assert!(b.accepts(TokenKind::False));
        assert!(!b.accepts(TokenKind::String));
        let raw: LeafTransform<()> = LeafTransform::Raw(Arc::new(|_: Option<&str>, _: &mut ()| None));
        assert!(raw.accepts(TokenKind::True));
        assert!(!raw.accepts(TokenKind::StartObject));
    }
}
