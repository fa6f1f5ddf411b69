//! Sensor readings as the control engine sees them.
//!
//! Readings arrive as raw state strings from whatever publishes them. A
//! reading is either a finite number or unavailable; there is no third case.

use std::collections::HashMap;

/// Parse a raw sensor state into a temperature.
///
/// `"unknown"`, `"unavailable"`, empty, non-numeric and non-finite states all
/// map to `None`.
pub fn parse_reading(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty()
        || raw.eq_ignore_ascii_case("unknown")
        || raw.eq_ignore_ascii_case("unavailable")
    {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Source of current readings, keyed by sensor reference.
pub trait ReadingProvider {
    /// Latest value of `source`, `None` when it is unavailable.
    fn reading(&self, source: &str) -> Option<f64>;
}

impl ReadingProvider for HashMap<String, f64> {
    fn reading(&self, source: &str) -> Option<f64> {
        self.get(source).copied().filter(|v| v.is_finite())
    }
}

impl ReadingProvider for HashMap<String, String> {
    fn reading(&self, source: &str) -> Option<f64> {
        self.get(source).and_then(|raw| parse_reading(raw))
    }
}
