//! Reading Aggregator
//!
//! Owns one driver per quantity and turns a round of reads into a single
//! [`Reading`]. A failed driver degrades its own field(s) and nothing else:
//! the aggregator has no error path.
//!
//! A gas sample taken without a learned baseline is reported as a
//! `NotCalibrated` fault; its raw count is still kept.
//!
//! ```rust,ignore
//! let mut aggregator = ReadingAggregator::new(gas, dht11, bh1750, bmp280);
//! aggregator.prepare(&mut delay, &config);
//! let cycle = aggregator.acquire();
//! buzzer.sound(cycle.alarm);
//! ```

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::alarm::{AlarmAction, AlarmThresholds};
use crate::config::AcquisitionConfig;
use crate::errors::SensorFault;
use crate::reading::{Measurement, Reading};
use crate::sensors::{ClimateSensor, GasSensor, LightSensor, PressureSensor};

/// Result of one acquisition cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cycle {
    /// The assembled snapshot
    pub reading: Reading,
    /// What the alarm should do about it
    pub alarm: AlarmAction,
}

/// Anything that can produce one cycle on demand
pub trait Acquire {
    /// One-time setup before the first cycle
    fn prepare<D: DelayNs>(&mut self, _delay: &mut D, _config: &AcquisitionConfig) {}

    /// Read every sensor once
    fn acquire(&mut self) -> Cycle;
}

/// Owns the drivers and assembles readings
pub struct ReadingAggregator<G, C, L, P> {
    gas: G,
    climate: C,
    light: L,
    pressure: P,
    thresholds: AlarmThresholds,
}

impl<G, C, L, P> ReadingAggregator<G, C, L, P>
where
    G: GasSensor,
    C: ClimateSensor,
    L: LightSensor,
    P: PressureSensor,
{
    /// Aggregator with default alarm thresholds
    pub fn new(gas: G, climate: C, light: L, pressure: P) -> Self {
        Self {
            gas,
            climate,
            light,
            pressure,
            thresholds: AlarmThresholds::default(),
        }
    }

    /// Override alarm thresholds
    pub fn with_thresholds(mut self, thresholds: AlarmThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Read every sensor once and assemble the snapshot
    pub fn read_all(&mut self) -> Reading {
        let (gas_pct, gas_raw) = match self.gas.read_gas() {
            Ok(sample) if sample.calibrated => (Measurement::Valid(sample.percent), Some(sample.raw)),
            Ok(sample) => (
                Measurement::Fault(SensorFault::NotCalibrated { sensor: "MQ-2" }),
                Some(sample.raw),
            ),
            Err(fault) => {
                warn!("gas read failed: {}", fault);
                (Measurement::Fault(fault), None)
            }
        };

        let (temperature_c, humidity_pct) = match self.climate.measure() {
            Ok(sample) => (
                Measurement::Valid(sample.temperature_c),
                Measurement::Valid(sample.humidity_pct),
            ),
            Err(fault) => {
                warn!("climate read failed: {}", fault);
                (Measurement::Fault(fault), Measurement::Fault(fault))
            }
        };

        let lux = Measurement::from(self.light.read_lux());
        if let Some(fault) = lux.fault() {
            warn!("light read failed: {}", fault);
        }

        let pressure_hpa = Measurement::from(self.pressure.read_pressure());
        if let Some(fault) = pressure_hpa.fault() {
            warn!("pressure read failed: {}", fault);
        }

        Reading {
            temperature_c,
            humidity_pct,
            gas_pct,
            gas_raw,
            lux,
            pressure_hpa,
        }
    }

    /// Hand the drivers back
    pub fn into_parts(self) -> (G, C, L, P) {
        (self.gas, self.climate, self.light, self.pressure)
    }
}

impl<G, C, L, P> Acquire for ReadingAggregator<G, C, L, P>
where
    G: GasSensor,
    C: ClimateSensor,
    L: LightSensor,
    P: PressureSensor,
{
    /// Learn the gas baseline; a failure leaves gas faulted, not the board
    fn prepare<D: DelayNs>(&mut self, delay: &mut D, config: &AcquisitionConfig) {
        info!("learning gas baseline over {} ms", config.calibration_time_ms());
        let result = self.gas.calibrate_baseline(
            delay,
            config.gas_calibration_samples,
            config.gas_calibration_interval_ms,
        );
        if let Err(fault) = result {
            warn!("gas calibration failed: {}", fault);
        }
    }

    fn acquire(&mut self) -> Cycle {
        let reading = self.read_all();
        let alarm = self.thresholds.evaluate(&reading);
        Cycle { reading, alarm }
    }
}
