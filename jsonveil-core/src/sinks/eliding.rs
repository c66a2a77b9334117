// jsonveil-core/src/sinks/eliding.rs
//! A sink decorator that removes nulls from the output.
//!
//! Structural events are held back until a real value shows up beneath them.
//! A null never causes anything to be written: it is dropped together with
//! the property name that introduced it, and a container that ends without
//! having received a real value is dropped along with its own name. The
//! surrounding structure of surviving values is written exactly as received.
//!
//! ```
//! use jsonveil_core::{JsonSink, NullElidingSink, TextSink};
//!
//! let mut sink = NullElidingSink::new(TextSink::compact(Vec::new()));
//! sink.write_start_object().unwrap();
//! sink.write_property_name("gone").unwrap();
//! sink.write_start_array().unwrap();
//! sink.write_null().unwrap();
//! sink.write_end_array().unwrap();
//! sink.write_property_name("kept").unwrap();
//! sink.write_bool(false).unwrap();
//! sink.write_end_object().unwrap();
//! sink.finish().unwrap();
//! assert_eq!(sink.into_inner().into_inner(), br#"{"kept":false}"#);
//! ```
//!
//! License: MIT OR APACHE 2.0

use super::JsonSink;
use crate::errors::{JsonVeilError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Marker {
    PendingObject,
    PendingArray,
    OpenedObject,
    OpenedArray,
    PendingName(String),
}

impl Marker {
    fn is_pending(&self) -> bool {
        !matches!(self, Marker::OpenedObject | Marker::OpenedArray)
    }
}

pub struct NullElidingSink<S> {
    inner: S,
    stack: Vec<Marker>,
    /// Length of the prefix of `stack` that has been written.
    opened: usize,
    ignore_comments: bool,
}

impl<S: JsonSink> NullElidingSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            stack: Vec::new(),
            opened: 0,
            ignore_comments: false,
        }
    }

    pub fn ignore_comments(mut self, ignore: bool) -> Self {
        self.ignore_comments = ignore;
        self
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Writes every held-back marker, oldest first.
    fn materialize(&mut self) -> Result<()> {
        if self.opened == self.stack.len() {
            return Ok(());
        }
        let pending: Vec<Marker> = self.stack.drain(self.opened..).collect();
        for marker in pending {
            match marker {
                Marker::PendingObject => {
                    self.inner.write_start_object()?;
                    self.stack.push(Marker::OpenedObject);
                }
                Marker::PendingArray => {
                    self.inner.write_start_array()?;
                    self.stack.push(Marker::OpenedArray);
                }
                Marker::PendingName(name) => self.inner.write_property_name(&name)?,
                Marker::OpenedObject | Marker::OpenedArray => {
                    return Err(JsonVeilError::SinkState("opened container above a pending one"))
                }
            }
        }
        self.opened = self.stack.len();
        Ok(())
    }

    fn push(&mut self, marker: Marker) {
        debug_assert!(marker.is_pending());
        self.stack.push(marker);
    }

    fn end(&mut self, pending: Marker, opened: Marker) -> Result<()> {
        match self.stack.pop() {
            Some(marker) if marker == pending => {
                if matches!(self.stack.last(), Some(Marker::PendingName(_))) {
                    self.stack.pop();
                }
                Ok(())
            }
            Some(marker) if marker == opened => {
                self.opened -= 1;
                match opened {
                    Marker::OpenedObject => self.inner.write_end_object(),
                    _ => self.inner.write_end_array(),
                }
            }
            _ => Err(JsonVeilError::SinkState("mismatched end of object or array")),
        }
    }
}

impl<S: JsonSink> JsonSink for NullElidingSink<S> {
    fn write_start_object(&mut self) -> Result<()> {
        self.push(Marker::PendingObject);
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<()> {
        self.end(Marker::PendingObject, Marker::OpenedObject)
    }

    fn write_start_array(&mut self) -> Result<()> {
        self.push(Marker::PendingArray);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.end(Marker::PendingArray, Marker::OpenedArray)
    }

    fn write_property_name(&mut self, name: &str) -> Result<()> {
        self.push(Marker::PendingName(name.to_string()));
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.materialize()?;
        self.inner.write_string(value)
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.materialize()?;
        self.inner.write_i64(value)
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.materialize()?;
        self.inner.write_f64(value)
    }

    fn write_raw_number(&mut self, text: &str) -> Result<()> {
        self.materialize()?;
        self.inner.write_raw_number(text)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.materialize()?;
        self.inner.write_bool(value)
    }

    fn write_null(&mut self) -> Result<()> {
        if matches!(self.stack.last(), Some(Marker::PendingName(_))) {
            self.stack.pop();
        }
        Ok(())
    }

    fn write_comment(&mut self, text: &str) -> Result<()> {
        if self.ignore_comments {
            return Ok(());
        }
        self.materialize()?;
        self.inner.write_comment(text)
    }

    fn finish(&mut self) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(JsonVeilError::SinkState("unclosed object or array"));
        }
        self.inner.finish()
    }
}
