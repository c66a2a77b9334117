// jsonveil-core/src/sinks/text.rs
//! JSON text encoding on top of `serde_json`'s formatters.
//!
//! [`serde_json::ser::Formatter`] already knows where commas, colons and
//! indentation go; this sink only tracks enough nesting state to call it in
//! the right order and to reject unbalanced event sequences.
//!
//! License: MIT OR APACHE 2.0

use std::io::Write;

use serde_json::ser::{CharEscape, CompactFormatter, Formatter, PrettyFormatter};

use super::JsonSink;
use crate::errors::{JsonVeilError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    container: Container,
    first: bool,
    has_name: bool,
}

/// Writes events as JSON text to any `io::Write`.
pub struct TextSink<W, F = CompactFormatter> {
    writer: W,
    formatter: F,
    frames: Vec<Frame>,
    root_written: bool,
    skip_comments: bool,
}

impl<W: Write> TextSink<W, CompactFormatter> {
    /// No whitespace between tokens.
    pub fn compact(writer: W) -> Self {
        Self::with_formatter(writer, CompactFormatter)
    }
}

impl<'a, W: Write> TextSink<W, PrettyFormatter<'a>> {
    /// One entry per line, nested entries indented by `indent`.
    pub fn pretty(writer: W, indent: &'a [u8]) -> Self {
        Self::with_formatter(writer, PrettyFormatter::with_indent(indent))
    }
}

impl<W: Write, F: Formatter> TextSink<W, F> {
    pub fn with_formatter(writer: W, formatter: F) -> Self {
        Self {
            writer,
            formatter,
            frames: Vec::new(),
            root_written: false,
            skip_comments: false,
        }
    }

    /// Drops comments instead of writing them.
    pub fn skip_comments(mut self, skip: bool) -> Self {
        self.skip_comments = skip;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn before_value(&mut self) -> Result<()> {
        match self.frames.last_mut() {
            None if self.root_written => Err(JsonVeilError::SinkState("a second root value")),
            None => Ok(()),
            Some(frame) => match frame.container {
                Container::Array => {
                    self.formatter.begin_array_value(&mut self.writer, frame.first)?;
                    frame.first = false;
                    Ok(())
                }
                Container::Object if frame.has_name => Ok(()),
                Container::Object => Err(JsonVeilError::SinkState(
                    "object value written without a property name",
                )),
            },
        }
    }

    fn after_value(&mut self) -> Result<()> {
        match self.frames.last_mut() {
            None => self.root_written = true,
            Some(frame) => match frame.container {
                Container::Array => self.formatter.end_array_value(&mut self.writer)?,
                Container::Object => {
                    self.formatter.end_object_value(&mut self.writer)?;
                    frame.has_name = false;
                }
            },
        }
        Ok(())
    }

    fn close(&mut self, container: Container) -> Result<()> {
        match self.frames.pop() {
            Some(frame) if frame.container == container && !frame.has_name => Ok(()),
            Some(_) => Err(JsonVeilError::SinkState("mismatched end of object or array")),
            None => Err(JsonVeilError::SinkState("end written with nothing open")),
        }
    }

    fn write_escaped(&mut self, value: &str) -> Result<()> {
        self.formatter.begin_string(&mut self.writer)?;
        let bytes = value.as_bytes();
        let mut start = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            let escape = match byte {
                b'"' => CharEscape::Quote,
                b'\\' => CharEscape::ReverseSolidus,
                b'\x08' => CharEscape::Backspace,
                b'\x0c' => CharEscape::FormFeed,
                b'\n' => CharEscape::LineFeed,
                b'\r' => CharEscape::CarriageReturn,
                b'\t' => CharEscape::Tab,
                0x00..=0x1f => CharEscape::AsciiControl(byte),
                _ => continue,
            };
            if start < i {
                self.formatter
                    .write_string_fragment(&mut self.writer, &value[start..i])?;
            }
            self.formatter.write_char_escape(&mut self.writer, escape)?;
            start = i + 1;
        }
        if start < bytes.len() {
            self.formatter
                .write_string_fragment(&mut self.writer, &value[start..])?;
        }
        self.formatter.end_string(&mut self.writer)?;
        Ok(())
    }
}

impl<W: Write, F: Formatter> JsonSink for TextSink<W, F> {
    fn write_start_object(&mut self) -> Result<()> {
        self.before_value()?;
        self.formatter.begin_object(&mut self.writer)?;
        self.frames.push(Frame {
            container: Container::Object,
            first: true,
            has_name: false,
        });
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<()> {
        self.close(Container::Object)?;
        self.formatter.end_object(&mut self.writer)?;
        self.after_value()
    }

    fn write_start_array(&mut self) -> Result<()> {
        self.before_value()?;
        self.formatter.begin_array(&mut self.writer)?;
        self.frames.push(Frame {
            container: Container::Array,
            first: true,
            has_name: false,
        });
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.close(Container::Array)?;
        self.formatter.end_array(&mut self.writer)?;
        self.after_value()
    }

    fn write_property_name(&mut self, name: &str) -> Result<()> {
        let first = match self.frames.last_mut() {
            Some(frame) if frame.container == Container::Object && !frame.has_name => {
                let first = frame.first;
                frame.first = false;
                frame.has_name = true;
                first
            }
            _ => {
                return Err(JsonVeilError::SinkState(
                    "property name written outside an object",
                ))
            }
        };
        self.formatter.begin_object_key(&mut self.writer, first)?;
        self.write_escaped(name)?;
        self.formatter.end_object_key(&mut self.writer)?;
        self.formatter.begin_object_value(&mut self.writer)?;
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.before_value()?;
        self.write_escaped(value)?;
        self.after_value()
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.before_value()?;
        self.formatter.write_i64(&mut self.writer, value)?;
        self.after_value()
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.before_value()?;
        if value.is_finite() {
            self.formatter.write_f64(&mut self.writer, value)?;
        } else {
            self.formatter.write_null(&mut self.writer)?;
        }
        self.after_value()
    }

    fn write_raw_number(&mut self, text: &str) -> Result<()> {
        self.before_value()?;
        self.formatter.write_number_str(&mut self.writer, text)?;
        self.after_value()
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.before_value()?;
        self.formatter.write_bool(&mut self.writer, value)?;
        self.after_value()
    }

    fn write_null(&mut self) -> Result<()> {
        self.before_value()?;
        self.formatter.write_null(&mut self.writer)?;
        self.after_value()
    }

    fn write_comment(&mut self, text: &str) -> Result<()> {
        if self.skip_comments {
            return Ok(());
        }
        // A line comment may contain the block terminator.
        if text.contains("*/") {
            writeln!(self.writer, "//{}", text)?;
        } else {
            write!(self.writer, "/*{}*/", text)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if !self.frames.is_empty() {
            return Err(JsonVeilError::SinkState("unclosed object or array"));
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(events: impl FnOnce(&mut TextSink<Vec<u8>>) -> Result<()>) -> Result<String> {
        let mut sink = TextSink::compact(Vec::new());
        events(&mut sink)?;
        sink.finish()?;
        Ok(String::from_utf8(sink.into_inner())?)
    }

    #[test]
    fn writes_compact_json() -> anyhow::Result<()> {
        let out = compact(|s| {
            s.write_start_object()?;
            s.write_property_name("a")?;
            s.write_start_array()?;
            s.write_raw_number("1.50")?;
            s.write_i64(-2)?;
            s.write_bool(true)?;
            s.write_null()?;
            s.write_end_array()?;
            s.write_property_name("b")?;
            s.write_string("x")?;
            s.write_end_object()
        })?;
        assert_eq!(out, r#"{"a":[1.50,-2,true,null],"b":"x"}"#);
        Ok(())
    }

    #[test]
    fn escapes_strings_and_names() -> anyhow::Result<()> {
        let out = compact(|s| {
            s.write_start_object()?;
            s.write_property_name("q\"k")?;
            s.write_string("line\nbreak\t\u{1}\\ é")?;
            s.write_end_object()
        })?;
        assert_eq!(out, r#"{"q\"k":"line\nbreak\t\u0001\\ é"}"#);
        let parsed: serde_json::Value = serde_json::from_str(&out)?;
        assert_eq!(parsed["q\"k"], "line\nbreak\t\u{1}\\ é");
        Ok(())
    }

    #[test]
    fn pretty_output_matches_serde_json() -> anyhow::Result<()> {
        let mut sink = TextSink::pretty(Vec::new(), b"  ");
        sink.write_start_object()?;
        sink.write_property_name("a")?;
        sink.write_start_array()?;
        sink.write_i64(1)?;
        sink.write_i64(2)?;
        sink.write_end_array()?;
        sink.write_property_name("b")?;
        sink.write_start_object()?;
        sink.write_end_object()?;
        sink.write_end_object()?;
        sink.finish()?;
        let out = String::from_utf8(sink.into_inner())?;
        let expected = serde_json::to_string_pretty(&serde_json::json!({"a": [1, 2], "b": {}}))?;
        assert_eq!(out, expected);
        Ok(())
    }

    #[test]
    fn non_finite_floats_become_null() -> anyhow::Result<()> {
        let out = compact(|s| {
            s.write_start_array()?;
            s.write_f64(f64::NAN)?;
            s.write_f64(2.5)?;
            s.write_end_array()
        })?;
        assert_eq!(out, "[null,2.5]");
        Ok(())
    }

    #[test]
    fn comments_are_written_or_skipped() -> anyhow::Result<()> {
        let out = compact(|s| {
            s.write_comment(" lead ")?;
            s.write_start_array()?;
            s.write_comment(" a */ b")?;
            s.write_end_array()
        })?;
        assert_eq!(out, "/* lead */[// a */ b\n]");

        let mut sink = TextSink::compact(Vec::new()).skip_comments(true);
        sink.write_comment("gone")?;
        sink.write_null()?;
        assert_eq!(sink.into_inner(), b"null");
        Ok(())
    }

    #[test]
    fn unbalanced_sequences_are_rejected() {
        let mut sink = TextSink::compact(Vec::new());
        assert!(matches!(sink.write_end_object(), Err(JsonVeilError::SinkState(_))));

        let mut sink = TextSink::compact(Vec::new());
        sink.write_start_object().unwrap();
        assert!(matches!(sink.write_null(), Err(JsonVeilError::SinkState(_))));
        assert!(matches!(sink.write_end_array(), Err(JsonVeilError::SinkState(_))));

        let mut sink = TextSink::compact(Vec::new());
        sink.write_start_array().unwrap();
        assert!(matches!(sink.finish(), Err(JsonVeilError::SinkState(_))));

        let mut sink = TextSink::compact(Vec::new());
        sink.write_i64(1).unwrap();
        assert!(matches!(sink.write_i64(2), Err(JsonVeilError::SinkState(_))));
    }
}
