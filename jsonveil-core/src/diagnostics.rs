// jsonveil-core/src/diagnostics.rs
//! Logging helpers that keep document values out of debug output.
//!
//! Values seen by the engine are, by definition, the data being masked. They
//! are only written to logs verbatim when `JSONVEIL_ALLOW_DEBUG_PII=true` is
//! set in the environment; otherwise a length summary is logged instead.

use lazy_static::lazy_static;
use log::trace;

lazy_static! {
    /// A static boolean that is initialized once to determine if PII is allowed in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("JSONVEIL_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

pub(crate) fn loggable(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

/// Records that a typed rule did not apply and the inherited policy took over.
pub(crate) fn log_fallback(path: &dyn std::fmt::Display, expected: &str, found: &str, raw: Option<&str>) {
    if !log::log_enabled!(log::Level::Trace) {
        return;
    }
    trace!(
        "Rule at '{}' expects {} but found {} ({}); applying the inherited value policy.",
        path,
        expected,
        found,
        raw.map(loggable).unwrap_or_else(|| "container".to_string())
    );
}
