//! Line decoding
//!
//! Each received line either becomes a [`TelemetryFrame`] or is discarded for
//! exactly one [`DiscardReason`]. Nothing here fails in any other way.

use std::fmt;

use greensat_core::TelemetryFrame;
use serde_json::Value;

/// Why a received line was not persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// Blank line, or only whitespace
    Empty,
    /// Does not start with `{` (boot chatter, console output)
    NotStructured,
    /// Not valid UTF-8
    InvalidEncoding,
    /// Starts like a record but does not parse (garbled or partial line)
    Malformed,
    /// The producer marked the record with an `error` field
    ProducerError,
}

impl DiscardReason {
    /// All reasons, for per-reason counters
    pub const ALL: [DiscardReason; 5] = [
        Self::Empty,
        Self::NotStructured,
        Self::InvalidEncoding,
        Self::Malformed,
        Self::ProducerError,
    ];

    /// Short label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::NotStructured => "not_structured",
            Self::InvalidEncoding => "invalid_encoding",
            Self::Malformed => "malformed",
            Self::ProducerError => "producer_error",
        }
    }
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode one raw line (terminator optional)
pub fn decode_line(raw: &[u8]) -> Result<TelemetryFrame, DiscardReason> {
    let text = std::str::from_utf8(raw).map_err(|_| DiscardReason::InvalidEncoding)?;
    let line = text.trim();

    if line.is_empty() {
        return Err(DiscardReason::Empty);
    }
    if !line.starts_with('{') {
        return Err(DiscardReason::NotStructured);
    }

    let value: Value = serde_json::from_str(line).map_err(|_| DiscardReason::Malformed)?;
    if value.get("error").is_some() {
        return Err(DiscardReason::ProducerError);
    }

    serde_json::from_value(value).map_err(|_| DiscardReason::Malformed)
}
