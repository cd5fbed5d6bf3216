//! One acquisition-cycle snapshot
//!
//! Drivers report `SensorResult<f32>`. The aggregator folds those into
//! [`Measurement`]s so a failed read stays visibly failed all the way to the
//! wire encoder. Nothing in here ever turns `-1` into a number that looks
//! like a measurement; callers who need the legacy sentinel ask for it.

use serde::{Deserialize, Serialize};

use crate::errors::{SensorFault, SensorResult};

/// Legacy in-band marker for "no valid measurement"
pub const SENTINEL: f32 = -1.0;

/// One field of a reading: a value, or the reason there is none
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// The sensor produced a physical value
    Valid(f32),
    /// The sensor failed this cycle
    Fault(SensorFault),
}

impl Measurement {
    /// The value, if the read succeeded
    pub fn value(&self) -> Option<f32> {
        match self {
            Self::Valid(v) => Some(*v),
            Self::Fault(_) => None,
        }
    }

    /// The value, or `default` when the read failed
    pub fn value_or(&self, default: f32) -> f32 {
        self.value().unwrap_or(default)
    }

    /// The value, or [`SENTINEL`] when the read failed
    pub fn sentinel_value(&self) -> f32 {
        self.value_or(SENTINEL)
    }

    /// Whether this field degraded
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }

    /// The fault, if any
    pub fn fault(&self) -> Option<SensorFault> {
        match self {
            Self::Valid(_) => None,
            Self::Fault(f) => Some(*f),
        }
    }
}

impl From<SensorResult<f32>> for Measurement {
    fn from(result: SensorResult<f32>) -> Self {
        match result {
            Ok(v) => Self::Valid(v),
            Err(f) => Self::Fault(f),
        }
    }
}

/// Reading fields, named as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    /// Air temperature
    #[serde(rename = "temp")]
    Temperature,
    /// Relative humidity
    #[serde(rename = "hum")]
    Humidity,
    /// Gas level
    #[serde(rename = "gaz_pct")]
    Gas,
    /// Illuminance
    #[serde(rename = "lux")]
    Light,
    /// Barometric pressure
    #[serde(rename = "press")]
    Pressure,
}

impl Field {
    /// All fields in wire order
    pub const ALL: [Field; 5] = [
        Field::Temperature,
        Field::Humidity,
        Field::Gas,
        Field::Light,
        Field::Pressure,
    ];

    /// Wire key
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Temperature => "temp",
            Self::Humidity => "hum",
            Self::Gas => "gaz_pct",
            Self::Light => "lux",
            Self::Pressure => "press",
        }
    }
}

/// Gas estimator output for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasSample {
    /// Raw 16-bit ADC count, kept for diagnostics
    pub raw: u16,
    /// Level above baseline, 0..=100
    pub percent: f32,
    /// False when no baseline was learned before this read
    pub calibrated: bool,
}

/// Temperature and humidity from one climate sensor measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    /// °C
    pub temperature_c: f32,
    /// % RH
    pub humidity_pct: f32,
}

/// Fields that can be reported as degraded in one reading
pub type FaultList = heapless::Vec<Field, 5>;

/// Producer-side snapshot of one acquisition cycle
///
/// No timestamp: the board has no real-time clock. The bridge stamps the
/// receipt time when the line arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// °C
    pub temperature_c: Measurement,
    /// % RH
    pub humidity_pct: Measurement,
    /// Gas level %, always within 0..=100 when valid
    pub gas_pct: Measurement,
    /// Raw gas ADC count behind `gas_pct`
    pub gas_raw: Option<u16>,
    /// lux
    pub lux: Measurement,
    /// hPa
    pub pressure_hpa: Measurement,
}

impl Reading {
    /// Measurement for a given field
    pub fn get(&self, field: Field) -> Measurement {
        match field {
            Field::Temperature => self.temperature_c,
            Field::Humidity => self.humidity_pct,
            Field::Gas => self.gas_pct,
            Field::Light => self.lux,
            Field::Pressure => self.pressure_hpa,
        }
    }

    /// Fields whose sensor failed this cycle, in wire order
    pub fn faults(&self) -> FaultList {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| self.get(*f).is_fault())
            .collect()
    }

    /// True when every sensor produced a value
    pub fn is_complete(&self) -> bool {
        self.faults().is_empty()
    }
}
