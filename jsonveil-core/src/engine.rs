// jsonveil-core/src/engine.rs
//! The traversal engine.
//!
//! A [`Walk`] pulls tokens from a [`JsonCursor`] exactly once, keeps the
//! [`PropertyPath`] in step with the nesting, and interprets the rule tree:
//! at every property or array slot the first rule that claims the value runs
//! its node, and unclaimed values go through the default dispatcher under the
//! value policy in force. Every token that survives is pushed to a
//! [`JsonSink`] in source order.
//!
//! Two recursion levels exist per container: `walk_object`/`walk_array` own
//! the token loop of one container, and `dispatch` decides what happens to a
//! single value. Unclaimed containers are walked with the same rule list at
//! the same depth, which is what lets a multi-segment absolute rule reach
//! through intermediate objects.
//!
//! License: MIT OR APACHE 2.0

use jsonveil_token::{JsonCursor, ParseError, TokenKind};
use log::trace;

use crate::diagnostics::log_fallback;
use crate::errors::{JsonVeilError, Result};
use crate::path::PropertyPath;
use crate::policy::{CustomPolicy, Emit, RelativePolicy, Scalar, ValuePolicy, NUMBER_PLACEHOLDER, STRING_PLACEHOLDER};
use crate::rules::{first_match, LeafHandler, LeafOutput, LeafTransform, Node, Rule};
use crate::sinks::JsonSink;

/// Whether a policy reached the value through default dispatch or was applied
/// to it directly (by a policy rule or a leaf fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    Default,
    Direct,
}

/// One traversal of one document.
pub(crate) struct Walk<'c, R, S, C> {
    cursor: R,
    sink: S,
    ctx: &'c mut C,
    path: PropertyPath,
}

impl<'c, R: JsonCursor, S: JsonSink, C> Walk<'c, R, S, C> {
    pub(crate) fn new(cursor: R, sink: S, ctx: &'c mut C, path: PropertyPath) -> Self {
        Self {
            cursor,
            sink,
            ctx,
            path,
        }
    }

    pub(crate) fn path(&self) -> &PropertyPath {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn into_sink(self) -> S {
        self.sink
    }

    /// Walks the root value under `policy`, then drains trailing comments and
    /// finishes the sink.
    pub(crate) fn run(&mut self, root: &Node<C>, policy: &ValuePolicy<C>) -> Result<()> {
        let kind = self.next_significant()?;
        match (root, kind) {
            (_, TokenKind::None) => return Err(JsonVeilError::UnexpectedEnd),
            (Node::Object(scope), TokenKind::StartObject) => {
                self.walk_object(scope.rules(), 0, scope.effective_policy(policy))?
            }
            (Node::Array(scope), TokenKind::StartArray) => {
                self.walk_array(scope.rules(), 0, scope.effective_policy(policy))?
            }
            (Node::Any { object, .. }, TokenKind::StartObject) => {
                self.walk_object(object.rules(), 0, object.effective_policy(policy))?
            }
            (Node::Any { array, .. }, TokenKind::StartArray) => {
                self.walk_array(array.rules(), 0, array.effective_policy(policy))?
            }
            (Node::Any { .. }, TokenKind::Null) => self.sink.write_null()?,
            (Node::Object(_) | Node::Array(_) | Node::Any { .. }, found) => {
                return Err(JsonVeilError::wrong_path(found, self.cursor.position()))
            }
            (node, _) => self.apply(node, 0, policy)?,
        }
        if self.next_significant()? != TokenKind::None {
            return Err(JsonVeilError::wrong_path(
                self.cursor.token_kind(),
                self.cursor.position(),
            ));
        }
        self.sink.finish()
    }

    /// Advances past comments, copying them to the sink. Returns
    /// `TokenKind::None` at the end of input.
    fn next_significant(&mut self) -> Result<TokenKind> {
        loop {
            if !self.cursor.advance()? {
                return Ok(TokenKind::None);
            }
            match self.cursor.token_kind() {
                TokenKind::Comment => self.comment()?,
                kind => return Ok(kind),
            }
        }
    }

    fn advance_in_scope(&mut self) -> Result<TokenKind> {
        if !self.cursor.advance()? {
            return Err(JsonVeilError::UnexpectedEnd);
        }
        Ok(self.cursor.token_kind())
    }

    fn comment(&mut self) -> Result<()> {
        let text = self.cursor.decode_comment()?;
        self.sink.write_comment(text)
    }

    fn walk_object(&mut self, rules: &[Rule<C>], depth: usize, policy: &ValuePolicy<C>) -> Result<()> {
        self.sink.write_start_object()?;
        loop {
            match self.advance_in_scope()? {
                TokenKind::PropertyName => {
                    {
                        let name = self.cursor.decode_string()?;
                        self.sink.write_property_name(&name)?;
                        self.path.push_name(&name);
                    }
                    let kind = self.advance_in_scope()?;
                    if !(kind.is_value() || kind.is_container_start()) {
                        return Err(JsonVeilError::wrong_path(kind, self.cursor.position()));
                    }
                    self.dispatch(rules, depth, kind, policy)?;
                    self.path.pop();
                }
                TokenKind::Comment => self.comment()?,
                TokenKind::EndObject => return self.sink.write_end_object(),
                found => return Err(JsonVeilError::wrong_path(found, self.cursor.position())),
            }
        }
    }

    fn walk_array(&mut self, rules: &[Rule<C>], depth: usize, policy: &ValuePolicy<C>) -> Result<()> {
        self.sink.write_start_array()?;
        loop {
            match self.advance_in_scope()? {
                TokenKind::EndArray => return self.sink.write_end_array(),
                TokenKind::Comment => self.comment()?,
                kind if kind.is_value() || kind.is_container_start() => {
                    self.path.push_element();
                    self.dispatch(rules, depth, kind, policy)?;
                    self.path.pop();
                }
                found => return Err(JsonVeilError::wrong_path(found, self.cursor.position())),
            }
        }
    }

    fn dispatch(&mut self, rules: &[Rule<C>], depth: usize, kind: TokenKind, policy: &ValuePolicy<C>) -> Result<()> {
        match first_match(rules, depth, &self.path, kind) {
            Some((rule, next)) => self.apply(&rule.node, next, policy),
            None => match kind {
                TokenKind::StartObject => self.walk_object(rules, depth, policy),
                TokenKind::StartArray => self.walk_array(rules, depth, policy),
                _ => self.scalar(policy, kind, Reach::Default),
            },
        }
    }

    /// Runs a claimed node on the current token. `inherited` is the policy in
    /// force where the rule was declared.
    fn apply(&mut self, node: &Node<C>, depth: usize, inherited: &ValuePolicy<C>) -> Result<()> {
        let kind = self.cursor.token_kind();
        match (node, kind) {
            (Node::Object(scope), TokenKind::StartObject)
            | (Node::Any { object: scope, .. }, TokenKind::StartObject) => {
                self.walk_object(scope.rules(), depth, scope.effective_policy(inherited))
            }
            (Node::Array(scope), TokenKind::StartArray)
            | (Node::Any { array: scope, .. }, TokenKind::StartArray) => {
                self.walk_array(scope.rules(), depth, scope.effective_policy(inherited))
            }
            (Node::Leaf(handler), _) => self.leaf(handler, kind, depth, inherited),
            (Node::Policy(policy), _) => self.apply_policy(policy, kind, depth),
            _ => self.apply_policy(inherited, kind, depth),
        }
    }

    /// Applies a policy to the current value: every scalar beneath a
    /// container, or the scalar itself.
    fn apply_policy(&mut self, policy: &ValuePolicy<C>, kind: TokenKind, depth: usize) -> Result<()> {
        match kind {
            TokenKind::StartObject => self.walk_object(&[], depth, policy),
            TokenKind::StartArray => self.walk_array(&[], depth, policy),
            _ => self.scalar(policy, kind, Reach::Direct),
        }
    }

    fn scalar(&mut self, policy: &ValuePolicy<C>, kind: TokenKind, reach: Reach) -> Result<()> {
        match policy {
            ValuePolicy::AllowList => match kind {
                TokenKind::String => self.sink.write_string(STRING_PLACEHOLDER),
                TokenKind::Number => self.sink.write_string(NUMBER_PLACEHOLDER),
                _ => self.pass_through(kind),
            },
            ValuePolicy::BlockList => self.pass_through(kind),
            ValuePolicy::NullList => match kind {
                TokenKind::True | TokenKind::False if reach == Reach::Default => {
                    self.pass_through(kind)
                }
                _ => self.sink.write_null(),
            },
            ValuePolicy::Relative(relative) => self.relative(relative, kind, reach),
            ValuePolicy::Custom(f) => self.custom(f, kind),
        }
    }

    fn relative(&mut self, relative: &RelativePolicy<C>, kind: TokenKind, reach: Reach) -> Result<()> {
        match first_match(&relative.rules, self.path.len(), &self.path, kind) {
            Some((rule, next)) => self.apply(&rule.node, next, &relative.fallback),
            None => self.scalar(&relative.fallback, kind, reach),
        }
    }

    fn custom(&mut self, f: &CustomPolicy<C>, kind: TokenKind) -> Result<()> {
        let emit = {
            let scalar = match kind {
                TokenKind::String => Scalar::Str(self.cursor.decode_string()?),
                TokenKind::Number => Scalar::Number(self.cursor.decode_raw()?),
                TokenKind::True => Scalar::Bool(true),
                TokenKind::False => Scalar::Bool(false),
                TokenKind::Null => Scalar::Null,
                found => return Err(JsonVeilError::wrong_path(found, self.cursor.position())),
            };
            f(scalar, &mut *self.ctx, &self.path)?
        };
        match emit {
            Emit::Keep => self.pass_through(kind),
            Emit::Null => self.sink.write_null(),
            Emit::Str(s) => self.sink.write_string(&s),
            Emit::Bool(b) => self.sink.write_bool(b),
            Emit::Int(i) => self.sink.write_i64(i),
            Emit::Float(x) => self.sink.write_f64(x),
        }
    }

    /// Re-emits the current scalar exactly as read.
    fn pass_through(&mut self, kind: TokenKind) -> Result<()> {
        match kind {
            TokenKind::String => {
                let value = self.cursor.decode_string()?;
                self.sink.write_string(&value)
            }
            TokenKind::Number => {
                let text = self.cursor.decode_raw()?;
                self.sink.write_raw_number(text)
            }
            TokenKind::True => self.sink.write_bool(true),
            TokenKind::False => self.sink.write_bool(false),
            TokenKind::Null => self.sink.write_null(),
            found => Err(JsonVeilError::wrong_path(found, self.cursor.position())),
        }
    }

    /// `Some(None)` for a null, `None` when the number does not decode.
    fn decode_number<T>(&self, kind: TokenKind, decode: impl Fn(&R) -> Result<T, ParseError>) -> Option<Option<T>> {
        if kind == TokenKind::Null {
            return Some(None);
        }
        decode(&self.cursor).ok().map(Some)
    }

    fn leaf(&mut self, handler: &LeafHandler<C>, kind: TokenKind, depth: usize, inherited: &ValuePolicy<C>) -> Result<()> {
        if !handler.transform.accepts(kind) {
            return self.leaf_fallback(handler, kind, depth, inherited);
        }
        let replacement = match &handler.transform {
            LeafTransform::Str(f) => {
                let value = match kind {
                    TokenKind::Null => None,
                    _ => Some(self.cursor.decode_string()?),
                };
                f(value.as_deref(), &mut *self.ctx)
            }
            LeafTransform::Int32(f) => match self.decode_number(kind, R::decode_i32) {
                Some(value) => f(value, &mut *self.ctx),
                None => return self.leaf_fallback(handler, kind, depth, inherited),
            },
            LeafTransform::Int64(f) => match self.decode_number(kind, R::decode_i64) {
                Some(value) => f(value, &mut *self.ctx),
                None => return self.leaf_fallback(handler, kind, depth, inherited),
            },
            LeafTransform::Decimal(f) => match self.decode_number(kind, R::decode_f64) {
                Some(value) => f(value, &mut *self.ctx),
                None => return self.leaf_fallback(handler, kind, depth, inherited),
            },
            LeafTransform::Bool(f) => {
                let value = match kind {
                    TokenKind::Null => None,
                    _ => Some(self.cursor.decode_bool()?),
                };
                f(value, &mut *self.ctx)
            }
            LeafTransform::Raw(f) => {
                let value = match kind {
                    TokenKind::Null => None,
                    _ => Some(self.cursor.decode_raw()?),
                };
                f(value, &mut *self.ctx)
            }
        };
        match handler.output {
            LeafOutput::PassThrough => self.pass_through(kind),
            LeafOutput::Replace => match replacement {
                Some(text) => self.sink.write_string(&text),
                None => self.sink.write_null(),
            },
        }
    }

    fn leaf_fallback(&mut self, handler: &LeafHandler<C>, kind: TokenKind, depth: usize, inherited: &ValuePolicy<C>) -> Result<()> {
        let raw = if kind.is_value() {
            self.cursor.decode_raw().ok()
        } else {
            None
        };
        log_fallback(&self.path, handler.transform.expected(), kind.as_str(), raw);
        trace!("Falling back to {:?} at depth {}.", inherited, depth);
        self.apply_policy(inherited, kind, depth)
    }
}
