//! Error Types for Sensor Acquisition
//!
//! ## Design Philosophy
//!
//! Acquisition runs every cycle on a microcontroller, so the error types follow
//! the same rules as the readings they replace:
//!
//! 1. **Small Size**: `SensorFault` is `Copy` and carries only `&'static str`
//!    context. It is stored inside every `Reading`, so it has to stay cheap.
//!
//! 2. **No Heap Allocation**: nothing here allocates. A fault can be raised from
//!    a driver running without an allocator.
//!
//! 3. **Local Recovery**: a `SensorFault` degrades one field of one reading.
//!    Nothing in this crate turns a sensor fault into a halted acquisition loop.
//!
//! ## Fault Categories
//!
//! ### Bus Faults
//! - `Bus`: the I2C transaction or ADC conversion failed
//! - `InvalidData`: the device answered but the payload is unusable
//!
//! ### Calibration Faults
//! - `NotCalibrated`: factory constants were never read, or the gas baseline
//!   was never learned, so the value cannot be trusted
//! - `DegenerateCalibration`: the compensation formula hit its zero
//!   denominator
//!
//! ## Handling Strategy
//!
//! ```rust
//! use greensat_core::{Measurement, SensorFault};
//!
//! fn describe(pressure: Measurement) -> &'static str {
//!     match pressure {
//!         Measurement::Valid(_) => "ok",
//!         Measurement::Fault(SensorFault::Bus { .. }) => "check wiring",
//!         Measurement::Fault(SensorFault::DegenerateCalibration) => "replace sensor",
//!         Measurement::Fault(_) => "degraded",
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for driver reads
pub type SensorResult<T> = Result<T, SensorFault>;

/// A single sensor read failed. Degrades one field, never the whole cycle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// Bus transaction (I2C, ADC, one-wire) failed
    #[error("{sensor}: bus transaction failed")]
    Bus {
        /// Part number of the sensor that failed
        sensor: &'static str,
    },

    /// The device answered with data that cannot be a measurement
    #[error("{sensor}: invalid data ({reason})")]
    InvalidData {
        /// Part number of the sensor that failed
        sensor: &'static str,
        /// What was wrong with the payload
        reason: &'static str,
    },

    /// Compensation constants or reference baseline were never loaded
    #[error("{sensor}: calibration not loaded")]
    NotCalibrated {
        /// Part number of the sensor that failed
        sensor: &'static str,
    },

    /// Pressure compensation denominator evaluated to exactly zero
    #[error("pressure compensation denominator is zero")]
    DegenerateCalibration,
}

/// Telemetry line could not be delivered
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitError {
    /// Reading could not be encoded as a structured line
    #[error("failed to encode telemetry frame")]
    Encode,

    /// Transport rejected the write or the flush
    #[error("transport write failed")]
    Transport,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorFault {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Bus { sensor } => defmt::write!(fmt, "{}: bus fault", sensor),
            Self::InvalidData { sensor, reason } =>
                defmt::write!(fmt, "{}: invalid data ({})", sensor, reason),
            Self::NotCalibrated { sensor } => defmt::write!(fmt, "{}: not calibrated", sensor),
            Self::DegenerateCalibration => defmt::write!(fmt, "degenerate calibration"),
        }
    }
}
