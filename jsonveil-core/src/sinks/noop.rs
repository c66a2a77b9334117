// jsonveil-core/src/sinks/noop.rs
//! A sink that discards every event.
//!
//! License: MIT OR APACHE 2.0

use super::JsonSink;
use crate::errors::Result;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl JsonSink for NoopSink {
    fn write_start_object(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_property_name(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn write_string(&mut self, _value: &str) -> Result<()> {
        Ok(())
    }

    fn write_i64(&mut self, _value: i64) -> Result<()> {
        Ok(())
    }

    fn write_f64(&mut self, _value: f64) -> Result<()> {
        Ok(())
    }

    fn write_raw_number(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn write_bool(&mut self, _value: bool) -> Result<()> {
        Ok(())
    }

    fn write_null(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_comment(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }
}
