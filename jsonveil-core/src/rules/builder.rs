// jsonveil-core/src/rules/builder.rs
//! Two-phase construction of rule trees.
//!
//! Builders collect rules in declaration order and freeze them with `build()`.
//! Problems found along the way (an empty path, a pattern that does not
//! compile) are collected rather than returned one at a time, and `build()`
//! reports all of them together.
//!
//! ```
//! use jsonveil_core::ObjectBuilder;
//!
//! let scope = ObjectBuilder::<()>::new()
//!     .property("id").unmasked()
//!     .property("routing").object(|o| o.property("method").unmasked())
//!     .property(["customer", "email"]).mask_str("***")
//!     .build()
//!     .unwrap();
//! assert_eq!(scope.rules().len(), 3);
//! ```
//!
//! License: MIT OR APACHE 2.0

use std::marker::PhantomData;
use std::sync::Arc;

use log::debug;

use super::{Expects, LeafHandler, LeafOutput, LeafTransform, Node, Rule, RuleMatcher, Scope};
use crate::errors::{JsonVeilError, Result};
use crate::matcher::{IntoPath, MatchMode, PathMatcher, PropMatch};
use crate::policy::{RelativePolicy, ValuePolicy};
use crate::strategy::MaskStrategy;

/// A builder that rules can be added to.
pub trait RuleHost<C>: Sized {
    /// How property paths declared on this host are anchored.
    const MODE: MatchMode;

    fn push_rule(&mut self, rule: Rule<C>);

    fn push_error(&mut self, error: JsonVeilError);
}

/// Hosts whose rules may own nested object and array scopes.
pub trait NestingHost<C>: RuleHost<C> {}

enum Target {
    Path(PathMatcher),
    Element,
}

#[derive(Clone, Copy)]
enum Shape {
    Leaf,
    Object,
    Array,
    Container,
}

/// A rule whose target is known and whose action is not chosen yet.
///
/// Every terminal method returns the host builder so declarations can be
/// chained.
#[must_use = "a rule slot does nothing until an action is chosen"]
pub struct RuleSlot<H, C> {
    host: H,
    target: Result<Target>,
    _context: PhantomData<fn(&mut C)>,
}

impl<H: RuleHost<C>, C: 'static> RuleSlot<H, C> {
    fn new(host: H, target: Result<Target>) -> Self {
        Self {
            host,
            target,
            _context: PhantomData,
        }
    }

    fn finish(mut self, shape: Shape, node: Node<C>) -> H {
        match self.target {
            Ok(Target::Path(matcher)) => {
                let expects = match shape {
                    Shape::Leaf => Expects::Anything,
                    Shape::Object => Expects::Object,
                    Shape::Array => Expects::Array,
                    Shape::Container => Expects::Container,
                };
                self.host.push_rule(Rule {
                    matcher: RuleMatcher::Path {
                        matcher,
                        mode: H::MODE,
                        expects,
                    },
                    node,
                });
            }
            Ok(Target::Element) => {
                let expects = match shape {
                    Shape::Leaf => Expects::Value,
                    Shape::Object => Expects::Object,
                    Shape::Array => Expects::Array,
                    Shape::Container => Expects::Container,
                };
                self.host.push_rule(Rule {
                    matcher: RuleMatcher::Element(expects),
                    node,
                });
            }
            Err(error) => self.host.push_error(error),
        }
        self.host
    }

    fn leaf(self, transform: LeafTransform<C>, output: LeafOutput) -> H {
        self.finish(Shape::Leaf, Node::Leaf(LeafHandler { transform, output }))
    }

    /// Masks a string with a literal, a pattern or a function.
    pub fn mask_str(self, strategy: impl Into<MaskStrategy<C>>) -> H {
        let transform = strategy.into().into_transform();
        self.leaf(LeafTransform::Str(transform), LeafOutput::Replace)
    }

    pub fn mask_str_with<F>(self, f: F) -> H
    where
        F: Fn(Option<&str>, &mut C) -> Option<String> + Send + Sync + 'static,
    {
        self.mask_str(MaskStrategy::function(f))
    }

    pub fn read_str<F>(self, f: F) -> H
    where
        F: Fn(Option<&str>, &mut C) + Send + Sync + 'static,
    {
        self.leaf(
            LeafTransform::Str(Arc::new(move |v: Option<&str>, c: &mut C| {
                f(v, c);
                None
            })),
            LeafOutput::PassThrough,
        )
    }

    pub fn mask_int<F>(self, f: F) -> H
    where
        F: Fn(Option<i32>, &mut C) -> Option<String> + Send + Sync + 'static,
    {
        self.leaf(LeafTransform::Int32(Arc::new(f)), LeafOutput::Replace)
    }

    pub fn read_int<F>(self, f: F) -> H
    where
        F: Fn(Option<i32>, &mut C) + Send + Sync + 'static,
    {
        self.leaf(
            LeafTransform::Int32(Arc::new(move |v: Option<i32>, c: &mut C| {
                f(v, c);
                None
            })),
            LeafOutput::PassThrough,
        )
    }

    pub fn mask_long<F>(self, f: F) -> H
    where
        F: Fn(Option<i64>, &mut C) -> Option<String> + Send + Sync + 'static,
    {
        self.leaf(LeafTransform::Int64(Arc::new(f)), LeafOutput::Replace)
    }

    pub fn read_long<F>(self, f: F) -> H
    where
        F: Fn(Option<i64>, &mut C) + Send + Sync + 'static,
    {
        self.leaf(
            LeafTransform::Int64(Arc::new(move |v: Option<i64>, c: &mut C| {
                f(v, c);
                None
            })),
            LeafOutput::PassThrough,
        )
    }

    pub fn mask_decimal<F>(self, f: F) -> H
    where
        F: Fn(Option<f64>, &mut C) -> Option<String> + Send + Sync + 'static,
    {
        self.leaf(LeafTransform::Decimal(Arc::new(f)), LeafOutput::Replace)
    }

    pub fn read_decimal<F>(self, f: F) -> H
    where
        F: Fn(Option<f64>, &mut C) + Send + Sync + 'static,
    {
        self.leaf(
            LeafTransform::Decimal(Arc::new(move |v: Option<f64>, c: &mut C| {
                f(v, c);
                None
            })),
            LeafOutput::PassThrough,
        )
    }

    pub fn mask_bool<F>(self, f: F) -> H
    where
        F: Fn(Option<bool>, &mut C) -> Option<String> + Send + Sync + 'static,
    {
        self.leaf(LeafTransform::Bool(Arc::new(f)), LeafOutput::Replace)
    }

    pub fn read_bool<F>(self, f: F) -> H
    where
        F: Fn(Option<bool>, &mut C) + Send + Sync + 'static,
    {
        self.leaf(
            LeafTransform::Bool(Arc::new(move |v: Option<bool>, c: &mut C| {
                f(v, c);
                None
            })),
            LeafOutput::PassThrough,
        )
    }

    /// Masks any scalar given its literal text. Nulls arrive as `None`.
    pub fn mask_raw<F>(self, f: F) -> H
    where
        F: Fn(Option<&str>, &mut C) -> Option<String> + Send + Sync + 'static,
    {
        self.leaf(LeafTransform::Raw(Arc::new(f)), LeafOutput::Replace)
    }

    /// Reads any scalar as its literal text, so large numbers keep their
    /// precision.
    pub fn read_raw<F>(self, f: F) -> H
    where
        F: Fn(Option<&str>, &mut C) + Send + Sync + 'static,
    {
        self.leaf(
            LeafTransform::Raw(Arc::new(move |v: Option<&str>, c: &mut C| {
                f(v, c);
                None
            })),
            LeafOutput::PassThrough,
        )
    }

    /// Applies `policy` to the value, or to every scalar beneath it.
    pub fn mask_value(self, policy: ValuePolicy<C>) -> H {
        self.finish(Shape::Leaf, Node::Policy(policy))
    }

    /// Leaves the value, and everything beneath it, untouched.
    pub fn unmasked(self) -> H {
        self.mask_value(ValuePolicy::BlockList)
    }
}

impl<H: NestingHost<C>, C: 'static> RuleSlot<H, C> {
    /// Descends into an object with its own rules.
    pub fn object<F>(mut self, init: F) -> H
    where
        F: FnOnce(ObjectBuilder<C>) -> ObjectBuilder<C>,
    {
        let scope = init(ObjectBuilder::new()).into_scope(&mut self.host);
        self.finish(Shape::Object, Node::Object(scope))
    }

    /// Descends into an array with its own element rules.
    pub fn array<F>(mut self, init: F) -> H
    where
        F: FnOnce(ArrayBuilder<C>) -> ArrayBuilder<C>,
    {
        let scope = init(ArrayBuilder::new()).into_scope(&mut self.host);
        self.finish(Shape::Array, Node::Array(scope))
    }

    /// Accepts either an object or an array, each with its own rules.
    pub fn any<O, A>(mut self, object: O, array: A) -> H
    where
        O: FnOnce(ObjectBuilder<C>) -> ObjectBuilder<C>,
        A: FnOnce(ArrayBuilder<C>) -> ArrayBuilder<C>,
    {
        let object = object(ObjectBuilder::new()).into_scope(&mut self.host);
        let array = array(ArrayBuilder::new()).into_scope(&mut self.host);
        self.finish(Shape::Container, Node::Any { object, array })
    }
}

fn path_target(path: impl IntoPath) -> Result<Target> {
    PathMatcher::new(path.into_path()).map(Target::Path)
}

fn pattern_target(pattern: &str) -> Result<Target> {
    PropMatch::pattern(pattern).and_then(|p| PathMatcher::new(vec![p]).map(Target::Path))
}

fn report(kind: &str, errors: Vec<JsonVeilError>) -> JsonVeilError {
    let error_message = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<String>>()
        .join("\n");
    JsonVeilError::Fatal(format!(
        "Failed to compile {} {} rule(s):\n{}",
        errors.len(),
        kind,
        error_message
    ))
}

fn finish_scope<C>(kind: &str, rules: Vec<Rule<C>>, policy: Option<ValuePolicy<C>>, errors: Vec<JsonVeilError>) -> Result<Scope<C>> {
    if !errors.is_empty() {
        return Err(report(kind, errors));
    }
    debug!("Finished compiling {} rules. Total compiled: {}.", kind, rules.len());
    Ok(Scope::new(rules, policy))
}

/// Rules for the properties of one object, matched by absolute path from the
/// object's own depth.
pub struct ObjectBuilder<C> {
    rules: Vec<Rule<C>>,
    policy: Option<ValuePolicy<C>>,
    errors: Vec<JsonVeilError>,
}

impl<C: 'static> ObjectBuilder<C> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            policy: None,
            errors: Vec::new(),
        }
    }

    /// Overrides the inherited value policy for this object's subtree.
    pub fn with_policy(mut self, policy: ValuePolicy<C>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Targets a property path: one predicate per segment, starting with the
    /// object's own properties.
    pub fn property(self, path: impl IntoPath) -> RuleSlot<Self, C> {
        let target = path_target(path);
        RuleSlot::new(self, target)
    }

    /// Targets the properties whose name matches a case-insensitive regular
    /// expression.
    pub fn pattern(self, pattern: &str) -> RuleSlot<Self, C> {
        let target = pattern_target(pattern);
        RuleSlot::new(self, target)
    }

    pub fn build(self) -> Result<Scope<C>> {
        finish_scope("object", self.rules, self.policy, self.errors)
    }

    fn into_scope<H: RuleHost<C>>(self, parent: &mut H) -> Scope<C> {
        for error in self.errors {
            parent.push_error(error);
        }
        Scope::new(self.rules, self.policy)
    }
}

impl<C: 'static> Default for ObjectBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> RuleHost<C> for ObjectBuilder<C> {
    const MODE: MatchMode = MatchMode::Absolute;

    fn push_rule(&mut self, rule: Rule<C>) {
        self.rules.push(rule);
    }

    fn push_error(&mut self, error: JsonVeilError) {
        self.errors.push(error);
    }
}

impl<C> NestingHost<C> for ObjectBuilder<C> {}

/// Rules for the elements of one array, matched by element kind.
pub struct ArrayBuilder<C> {
    rules: Vec<Rule<C>>,
    policy: Option<ValuePolicy<C>>,
    errors: Vec<JsonVeilError>,
}

impl<C: 'static> ArrayBuilder<C> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            policy: None,
            errors: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: ValuePolicy<C>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Targets elements. Leaf actions claim scalar elements; `object` and
    /// `array` claim elements of that shape.
    pub fn element(self) -> RuleSlot<Self, C> {
        RuleSlot::new(self, Ok(Target::Element))
    }

    /// Shorthand for `element().object(init)`.
    pub fn objects<F>(self, init: F) -> Self
    where
        F: FnOnce(ObjectBuilder<C>) -> ObjectBuilder<C>,
    {
        self.element().object(init)
    }

    /// Shorthand for `element().array(init)`.
    pub fn arrays<F>(self, init: F) -> Self
    where
        F: FnOnce(ArrayBuilder<C>) -> ArrayBuilder<C>,
    {
        self.element().array(init)
    }

    pub fn build(self) -> Result<Scope<C>> {
        finish_scope("array", self.rules, self.policy, self.errors)
    }

    fn into_scope<H: RuleHost<C>>(self, parent: &mut H) -> Scope<C> {
        for error in self.errors {
            parent.push_error(error);
        }
        Scope::new(self.rules, self.policy)
    }
}

impl<C: 'static> Default for ArrayBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> RuleHost<C> for ArrayBuilder<C> {
    const MODE: MatchMode = MatchMode::Absolute;

    fn push_rule(&mut self, rule: Rule<C>) {
        self.rules.push(rule);
    }

    fn push_error(&mut self, error: JsonVeilError) {
        self.errors.push(error);
    }
}

impl<C> NestingHost<C> for ArrayBuilder<C> {}

/// Depth-independent value rules, frozen into a [`ValuePolicy::Relative`].
///
/// Paths are matched backwards from the value being written, so
/// `property("email")` claims an `email` property at any depth, and
/// `property([PropMatch::ends_with("card"), PropMatch::Element, "id".into()])`
/// claims the `id` of any element of any `...card` array. When several rules
/// could claim a value, the first declared wins.
pub struct RelativeBuilder<C> {
    rules: Vec<Rule<C>>,
    fallback: ValuePolicy<C>,
    errors: Vec<JsonVeilError>,
}

impl<C: 'static> RelativeBuilder<C> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: ValuePolicy::AllowList,
            errors: Vec::new(),
        }
    }

    /// Policy for values no relative rule claims. Defaults to `AllowList`.
    pub fn fallback(mut self, policy: ValuePolicy<C>) -> Self {
        self.fallback = policy;
        self
    }

    pub fn property(self, path: impl IntoPath) -> RuleSlot<Self, C> {
        let target = path_target(path);
        RuleSlot::new(self, target)
    }

    pub fn pattern(self, pattern: &str) -> RuleSlot<Self, C> {
        let target = pattern_target(pattern);
        RuleSlot::new(self, target)
    }

    pub fn build(self) -> Result<ValuePolicy<C>> {
        if !self.errors.is_empty() {
            return Err(report("relative", self.errors));
        }
        debug!(
            "Finished compiling relative rules. Total compiled: {}.",
            self.rules.len()
        );
        Ok(ValuePolicy::Relative(Arc::new(RelativePolicy {
            rules: self.rules,
            fallback: self.fallback,
        })))
    }
}

impl<C: 'static> Default for RelativeBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> RuleHost<C> for RelativeBuilder<C> {
    const MODE: MatchMode = MatchMode::Relative;

    fn push_rule(&mut self, rule: Rule<C>) {
        self.rules.push(rule);
    }

    fn push_error(&mut self, error: JsonVeilError) {
        self.errors.push(error);
    }
}
