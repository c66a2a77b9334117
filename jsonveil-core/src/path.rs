// jsonveil-core/src/path.rs
//! The path buffer threaded through a traversal, and the depth hint that
//! sizes it.
//!
//! [`PropertyPath`] is a stack of segments whose length always equals the
//! current nesting depth. Slots are reused between pushes, so a name pushed
//! at a depth that was visited before only copies bytes into an existing
//! `String`. It can be indexed from the root ([`PropertyPath::get`]) or from
//! the tip ([`PropertyPath::get_from_tip`]); the two modes back absolute and
//! relative rule matching respectively.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;

/// One level of nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// An object property.
    Name(&'a str),
    /// A slot in an array.
    Element,
}

impl<'a> Segment<'a> {
    pub fn name(self) -> Option<&'a str> {
        match self {
            Segment::Name(name) => Some(name),
            Segment::Element => None,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    name: String,
    element: bool,
}

/// Mutable, invocation-scoped stack of path segments.
#[derive(Debug, Default)]
pub struct PropertyPath {
    slots: Vec<Slot>,
    len: usize,
    max_len: usize,
}

impl PropertyPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocates `depth` slots.
    pub fn with_capacity(depth: usize) -> Self {
        let mut slots = Vec::with_capacity(depth);
        slots.resize_with(depth, Slot::default);
        Self {
            slots,
            len: 0,
            max_len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Deepest length reached since construction.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn push_name(&mut self, name: &str) {
        let slot = self.next_slot();
        slot.name.clear();
        slot.name.push_str(name);
        slot.element = false;
    }

    pub fn push_element(&mut self) {
        let slot = self.next_slot();
        slot.name.clear();
        slot.element = true;
    }

    pub fn pop(&mut self) {
        debug_assert!(self.len > 0, "pop on an empty property path");
        self.len = self.len.saturating_sub(1);
    }

    /// Segment at `index`, counted from the root. `None` past the tip.
    pub fn get(&self, index: usize) -> Option<Segment<'_>> {
        if index >= self.len {
            return None;
        }
        let slot = &self.slots[index];
        Some(if slot.element {
            Segment::Element
        } else {
            Segment::Name(&slot.name)
        })
    }

    /// Segment `offset` levels above the tip; `0` is the tip itself.
    pub fn get_from_tip(&self, offset: usize) -> Option<Segment<'_>> {
        if offset >= self.len {
            return None;
        }
        self.get(self.len - 1 - offset)
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment<'_>> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    fn next_slot(&mut self) -> &mut Slot {
        if self.len == self.slots.len() {
            self.slots.push(Slot::default());
        }
        self.len += 1;
        self.max_len = self.max_len.max(self.len);
        &mut self.slots[self.len - 1]
    }
}

/// Renders as `a.b[].c`.
impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments().enumerate() {
            match segment {
                Segment::Name(name) if i == 0 => f.write_str(name)?,
                Segment::Name(name) => write!(f, ".{}", name)?,
                Segment::Element => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}

/// Initial pre-size for a fresh rule tree.
pub const INITIAL_DEPTH_HINT: usize = 6;

/// Lock-free, monotonically increasing record of the deepest path a rule tree
/// has walked. Shared by every thread using the same observer.
#[derive(Debug)]
pub struct DepthHint(AtomicUsize);

impl DepthHint {
    pub fn new(initial: usize) -> Self {
        Self(AtomicUsize::new(initial))
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Raises the mark to `depth` unless another thread already stored an
    /// equal or larger value.
    pub fn raise(&self, depth: usize) {
        let mut current = self.0.load(Ordering::Relaxed);
        while depth > current {
            match self
                .0
                .compare_exchange_weak(current, depth, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => {
                    debug!("Depth hint raised from {} to {}.", current, depth);
                    return;
                }
                Err(observed) => current = observed,
            }
        }
    }
}

impl Default for DepthHint {
    fn default() -> Self {
        Self::new(INITIAL_DEPTH_HINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_tracks_length_and_maximum() {
        let mut path = PropertyPath::with_capacity(1);
        path.push_name("a");
        path.push_element();
        path.push_name("b");
        assert_eq!(path.len(), 3);
        path.pop();
        path.pop();
        assert_eq!(path.len(), 1);
        assert_eq!(path.max_len(), 3);
        assert_eq!(path.get(1), None);
    }

    #[test]
    fn indexing_from_root_and_tip() {
        let mut path = PropertyPath::new();
        path.push_name("order");
        path.push_element();
        path.push_name("sku");
        assert_eq!(path.get(0), Some(Segment::Name("order")));
        assert_eq!(path.get(1), Some(Segment::Element));
        assert_eq!(path.get_from_tip(0), Some(Segment::Name("sku")));
        assert_eq!(path.get_from_tip(2), Some(Segment::Name("order")));
        assert_eq!(path.get_from_tip(3), None);
        assert_eq!(path.to_string(), "order[].sku");
    }

    #[test]
    fn reused_slots_do_not_leak_old_names() {
        let mut path = PropertyPath::new();
        path.push_name("customer");
        path.push_name("email");
        path.pop();
        path.push_element();
        assert_eq!(path.get_from_tip(0), Some(Segment::Element));
        path.pop();
        path.push_name("id");
        assert_eq!(path.get_from_tip(0), Some(Segment::Name("id")));
        assert_eq!(path.to_string(), "customer.id");
    }

    #[test]
    fn depth_hint_only_grows() {
        let hint = DepthHint::default();
        assert_eq!(hint.get(), INITIAL_DEPTH_HINT);
        hint.raise(3);
        assert_eq!(hint.get(), INITIAL_DEPTH_HINT);
        hint.raise(11);
        hint.raise(9);
        assert_eq!(hint.get(), 11);
    }

    #[test]
    fn depth_hint_survives_concurrent_raises() {
        let hint = DepthHint::new(0);
        std::thread::scope(|s| {
            for depth in 1..=16 {
                let hint = &hint;
                s.spawn(move || hint.raise(depth));
            }
        });
        assert_eq!(hint.get(), 16);
    }
}
