//! Sensor acquisition core for GreenSat
//!
//! Reads the board's sensors, folds the results into one reading per cycle
//! and writes it to the serial link as a line of JSON.
//! Designed for the microcontroller first, host second.
//!
//! Key constraints:
//! - Runs without `std` (disable default features)
//! - One failed sensor degrades one field, never the cycle
//! - BMP280 compensation matches the Bosch datasheet reference
//!
//! ```no_run
//! use greensat_core::{compensation, PressureCalibration};
//!
//! let cal = PressureCalibration::DATASHEET_EXAMPLE;
//! let raw = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00];
//!
//! match compensation::decode_pressure(&raw, &cal) {
//!     Ok(hpa) => {}, // 1006.5
//!     Err(fault) => {}, // degraded pressure field
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod aggregator;
pub mod alarm;
pub mod compensation;
pub mod config;
pub mod constants;
pub mod errors;
pub mod math;
pub mod producer;
pub mod reading;
pub mod sensors;
pub mod telemetry;

// Public API
pub use aggregator::{Acquire, Cycle, ReadingAggregator};
pub use alarm::{Alarm, AlarmAction, AlarmThresholds, Buzzer};
pub use compensation::{Compensated, FixedCompensated, PressureCalibration, RawSample};
pub use config::AcquisitionConfig;
pub use errors::{EmitError, SensorFault, SensorResult};
pub use producer::Producer;
pub use reading::{ClimateSample, Field, GasSample, Measurement, Reading, SENTINEL};
pub use sensors::{
    Bh1750, Bmp280, CalibrationBaseline, ClimateSensor, GasEstimator, GasSensor, LightSensor,
    PressureSensor,
};
pub use telemetry::{EmitterStats, LineWriter, TelemetryEmitter, TelemetryFrame};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
