// jsonveil-core/src/policy.rs
//! Default value policies.
//!
//! A value policy decides what happens to a scalar that no rule claimed. It is
//! inherited down the document and can be replaced for a subtree by a scope.
//!
//! * [`ValuePolicy::AllowList`] (the default) replaces strings and numbers with
//!   type-tagged placeholders and keeps booleans and nulls.
//! * [`ValuePolicy::BlockList`] keeps every scalar as written.
//! * [`ValuePolicy::NullList`] turns every scalar into null.
//! * [`ValuePolicy::Relative`] runs depth-independent rules first and falls
//!   back to another policy.
//! * [`ValuePolicy::Custom`] hands the scalar to a caller function.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::path::PropertyPath;
use crate::rules::Rule;

/// Written in place of a string under [`ValuePolicy::AllowList`].
pub const STRING_PLACEHOLDER: &str = "#str#*****";
/// Written in place of a number under [`ValuePolicy::AllowList`].
pub const NUMBER_PLACEHOLDER: &str = "#number#*****";

/// A scalar as seen by a custom policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar<'a> {
    Str(Cow<'a, str>),
    /// Literal number text, exactly as written in the document.
    Number(&'a str),
    Bool(bool),
    Null,
}

/// What a custom policy wants written.
#[derive(Debug, Clone, PartialEq)]
pub enum Emit {
    /// Re-emit the original token.
    Keep,
    Null,
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

pub type CustomPolicy<C> =
    Arc<dyn Fn(Scalar<'_>, &mut C, &PropertyPath) -> anyhow::Result<Emit> + Send + Sync>;

pub enum ValuePolicy<C> {
    AllowList,
    BlockList,
    NullList,
    Relative(Arc<RelativePolicy<C>>),
    Custom(CustomPolicy<C>),
}

impl<C> ValuePolicy<C> {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Scalar<'_>, &mut C, &PropertyPath) -> anyhow::Result<Emit> + Send + Sync + 'static,
    {
        ValuePolicy::Custom(Arc::new(f))
    }

    /// The three built-in policies leave booleans and nulls alone when they
    /// are reached through default dispatch.
    pub fn is_canonical(&self) -> bool {
        matches!(
            self,
            ValuePolicy::AllowList | ValuePolicy::BlockList | ValuePolicy::NullList
        )
    }
}

impl<C> Default for ValuePolicy<C> {
    fn default() -> Self {
        ValuePolicy::AllowList
    }
}

impl<C> Clone for ValuePolicy<C> {
    fn clone(&self) -> Self {
        match self {
            ValuePolicy::AllowList => ValuePolicy::AllowList,
            ValuePolicy::BlockList => ValuePolicy::BlockList,
            ValuePolicy::NullList => ValuePolicy::NullList,
            ValuePolicy::Relative(policy) => ValuePolicy::Relative(Arc::clone(policy)),
            ValuePolicy::Custom(f) => ValuePolicy::Custom(Arc::clone(f)),
        }
    }
}

impl<C> fmt::Debug for ValuePolicy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuePolicy::AllowList => f.write_str("AllowList"),
            ValuePolicy::BlockList => f.write_str("BlockList"),
            ValuePolicy::NullList => f.write_str("NullList"),
            ValuePolicy::Relative(policy) => f
                .debug_struct("Relative")
                .field("rules", &policy.rules.len())
                .field("fallback", &policy.fallback)
                .finish(),
            ValuePolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Depth-independent rules applied to scalars, with a policy for whatever
/// they do not match. Built with [`RelativeBuilder`](crate::RelativeBuilder).
pub struct RelativePolicy<C> {
    pub(crate) rules: Vec<Rule<C>>,
    pub(crate) fallback: ValuePolicy<C>,
}

impl<C> RelativePolicy<C> {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn fallback(&self) -> &ValuePolicy<C> {
        &self.fallback
    }
}
