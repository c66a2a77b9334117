// jsonveil-core/src/sinks/mod.rs
//! Output side of a traversal.
//!
//! The engine pushes structural and value events into a [`JsonSink`]. It does
//! not know how they are encoded, whether they are buffered, or whether they
//! go anywhere at all.
//!
//! * [`TextSink`] encodes events as JSON text, compact or indented.
//! * [`NullElidingSink`] wraps another sink and drops nulls together with the
//!   names and containers they leave empty.
//! * [`NoopSink`] discards everything; extraction runs use it.
//!
//! License: MIT OR APACHE 2.0

pub mod eliding;
pub mod noop;
pub mod text;

pub use eliding::NullElidingSink;
pub use noop::NoopSink;
pub use text::TextSink;

use crate::errors::Result;

/// Push-style receiver of JSON events, in document order.
pub trait JsonSink {
    fn write_start_object(&mut self) -> Result<()>;

    fn write_end_object(&mut self) -> Result<()>;

    fn write_start_array(&mut self) -> Result<()>;

    fn write_end_array(&mut self) -> Result<()>;

    fn write_property_name(&mut self, name: &str) -> Result<()>;

    fn write_string(&mut self, value: &str) -> Result<()>;

    fn write_i64(&mut self, value: i64) -> Result<()>;

    fn write_f64(&mut self, value: f64) -> Result<()>;

    /// Writes a number from its literal text, byte for byte.
    fn write_raw_number(&mut self, text: &str) -> Result<()>;

    fn write_bool(&mut self, value: bool) -> Result<()>;

    fn write_null(&mut self) -> Result<()>;

    /// Writes a comment body (without its delimiters).
    fn write_comment(&mut self, text: &str) -> Result<()>;

    /// Called once after the root value. Checks that every container was
    /// closed and flushes buffered output.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: JsonSink + ?Sized> JsonSink for &mut S {
    fn write_start_object(&mut self) -> Result<()> {
        (**self).write_start_object()
    }

    fn write_end_object(&mut self) -> Result<()> {
        (**self).write_end_object()
    }

    fn write_start_array(&mut self) -> Result<()> {
        (**self).write_start_array()
    }

    fn write_end_array(&mut self) -> Result<()> {
        (**self).write_end_array()
    }

    fn write_property_name(&mut self, name: &str) -> Result<()> {
        (**self).write_property_name(name)
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        (**self).write_string(value)
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        (**self).write_i64(value)
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        (**self).write_f64(value)
    }

    fn write_raw_number(&mut self, text: &str) -> Result<()> {
        (**self).write_raw_number(text)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        (**self).write_bool(value)
    }

    fn write_null(&mut self) -> Result<()> {
        (**self).write_null()
    }

    fn write_comment(&mut self, text: &str) -> Result<()> {
        (**self).write_comment(text)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}
