//! Telemetry wire frame and line emitter
//!
//! One reading becomes one compact JSON object terminated by `\n`:
//!
//! ```text
//! {"temp":22.5,"hum":40.0,"gaz_pct":5.43,"lux":300.0,"press":1013.2}
//! {"temp":22.5,"hum":40.0,"gaz_pct":5.43,"lux":0.0,"press":0.0,"faults":["lux","press"]}
//! ```
//!
//! A faulted field goes out as `0`, the value older consumers expect, and is
//! named in `faults` so newer ones can tell the default from a measurement.
//! The whole line, newline included, is handed to the transport in a single
//! write and flushed, so the receiver sees a complete record or nothing.

use alloc::vec::Vec;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::EmitError;
use crate::math::{round1, round_to};
use crate::reading::{FaultList, Field, Measurement, Reading};

/// Wire representation of a reading
///
/// Missing numeric fields decode as `0`, matching what the producer sends
/// for a faulted sensor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryFrame {
    /// °C
    pub temp: f64,
    /// % RH
    pub hum: f64,
    /// Gas level, %
    pub gaz_pct: f64,
    /// lux
    pub lux: f64,
    /// hPa
    pub press: f64,
    /// Air quality %, when the producer computes it itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_pct: Option<f64>,
    /// Fields sent as a default rather than a measurement
    #[serde(skip_serializing_if = "FaultList::is_empty")]
    pub faults: FaultList,
}

fn wire(m: Measurement, places: i32) -> f64 {
    match m.value() {
        Some(v) => round_to(v as f64, places),
        None => 0.0,
    }
}

impl From<&Reading> for TelemetryFrame {
    fn from(r: &Reading) -> Self {
        Self {
            temp: wire(r.temperature_c, 1),
            hum: wire(r.humidity_pct, 1),
            gaz_pct: wire(r.gas_pct, 2),
            lux: wire(r.lux, 1),
            press: wire(r.pressure_hpa, 1),
            air_pct: None,
            faults: r.faults(),
        }
    }
}

impl TelemetryFrame {
    /// Value of `field`, or `None` when the producer listed it in `faults`
    pub fn measured(&self, field: Field) -> Option<f64> {
        if self.faults.contains(&field) {
            return None;
        }
        Some(match field {
            Field::Temperature => self.temp,
            Field::Humidity => self.hum,
            Field::Gas => self.gaz_pct,
            Field::Light => self.lux,
            Field::Pressure => self.press,
        })
    }

    /// Supplied `air_pct`, else `100 - gaz_pct` (clamped, one decimal) unless gas is faulted
    pub fn air_quality(&self) -> Option<f64> {
        self.air_pct.or_else(|| {
            self.measured(Field::Gas)
                .map(|g| round1(100.0 - g.clamp(0.0, 100.0)))
        })
    }

    /// Compact JSON plus trailing newline
    pub fn encode_line(&self) -> Result<Vec<u8>, EmitError> {
        let mut line = serde_json::to_vec(self).map_err(|_| EmitError::Encode)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// Line-oriented transport
pub trait LineWriter {
    /// Write the whole buffer and flush it
    fn write_line(&mut self, line: &[u8]) -> Result<(), EmitError>;
}

#[cfg(feature = "std")]
impl<W: std::io::Write> LineWriter for W {
    fn write_line(&mut self, line: &[u8]) -> Result<(), EmitError> {
        self.write_all(line).map_err(|_| EmitError::Transport)?;
        self.flush().map_err(|_| EmitError::Transport)
    }
}

/// Emitter counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitterStats {
    /// Lines handed to the transport
    pub lines_written: u32,
    /// Encode or transport failures
    pub write_failures: u32,
}

/// Writes one frame per reading
pub struct TelemetryEmitter<W> {
    writer: W,
    stats: EmitterStats,
}

impl<W: LineWriter> TelemetryEmitter<W> {
    /// Emitter over a line transport
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            stats: EmitterStats::default(),
        }
    }

    /// Encode and send one reading
    pub fn emit(&mut self, reading: &Reading) -> Result<(), EmitError> {
        let result = TelemetryFrame::from(reading)
            .encode_line()
            .and_then(|line| self.writer.write_line(&line));

        match result {
            Ok(()) => self.stats.lines_written += 1,
            Err(e) => {
                warn!("telemetry line dropped: {}", e);
                self.stats.write_failures += 1;
            }
        }
        result
    }

    /// Counters since construction
    pub fn stats(&self) -> EmitterStats {
        self.stats
    }

    /// Borrow the transport
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Give the transport back
    pub fn into_inner(self) -> W {
        self.writer
    }
}
