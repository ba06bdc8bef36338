//! Numeric decoders for log drain values
//!
//! Heroku reports most samples as a number with a unit suffix glued on
//! (`42ms`, `512MB`, `7pages`). Each decoder strips the suffix it knows
//! about and parses the rest as an `f64`.

use crate::error::RecordError;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Byte-size suffixes, checked in this order against the end of the value
const SIZE_SUFFIXES: [(&str, f64); 4] = [("GB", GIB), ("MB", MIB), ("kB", KIB), ("bytes", 1.0)];

/// Unit-aware value decoder attached to a metric binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    /// `123.4` → 123.4
    Number,
    /// `42ms` → 0.042 (seconds)
    Millis,
    /// `7pages` → 7.0
    Pages,
    /// `512MB` → 536870912.0 (bytes)
    Size,
}

impl Decoder {
    /// Short name used in diagnostics and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Decoder::Number => "number",
            Decoder::Millis => "millis",
            Decoder::Pages => "pages",
            Decoder::Size => "size",
        }
    }

    /// Decode a raw token into a finite number
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Decode`] when the token (after suffix stripping)
    /// is not a number, or parses to NaN or infinity.
    pub fn decode(&self, raw: &str) -> Result<f64, RecordError> {
        let value = match self {
            Decoder::Number => parse_number(raw),
            Decoder::Millis => parse_millis(raw),
            Decoder::Pages => parse_pages(raw),
            Decoder::Size => parse_size(raw),
        };

        value.ok_or_else(|| RecordError::Decode {
            value: raw.to_string(),
            decoder: self.as_str(),
        })
    }
}

/// Parse a plain number, rejecting NaN and infinities
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a number that may carry `suffix`; a bare number is accepted too
pub fn parse_with_suffix(raw: &str, suffix: &str) -> Option<f64> {
    parse_number(raw.strip_suffix(suffix).unwrap_or(raw))
}

/// Parse a page count such as `7pages`
pub fn parse_pages(raw: &str) -> Option<f64> {
    parse_with_suffix(raw, "pages")
}

/// Parse a millisecond duration such as `42ms` into seconds
pub fn parse_millis(raw: &str) -> Option<f64> {
    parse_with_suffix(raw, "ms").map(|ms| ms / 1000.0)
}

/// Parse a byte size such as `512MB`, `3kB`, `1GB` or `200bytes` into bytes
///
/// Unknown suffixes leave the multiplier at 1 and the value is parsed as-is,
/// so a bare number is read as a byte count.
pub fn parse_size(raw: &str) -> Option<f64> {
    for (suffix, multiplier) in SIZE_SUFFIXES {
        if let Some(number) = raw.strip_suffix(suffix) {
            return parse_number(number)
                .map(|n| n * multiplier)
                .filter(|v| v.is_finite());
        }
    }

    parse_number(raw)
}
