//! Producer-side settings

use crate::alarm::AlarmThresholds;
use crate::constants::{CYCLE_INTERVAL_MS, GAS_CALIBRATION_INTERVAL_MS, GAS_CALIBRATION_SAMPLES};

/// Acquisition loop configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionConfig {
    /// Sleep between two cycles (ms)
    pub cycle_interval_ms: u32,
    /// Idle samples averaged into the gas baseline
    pub gas_calibration_samples: u16,
    /// Sleep between two calibration samples (ms)
    pub gas_calibration_interval_ms: u32,
    /// Buzzer trigger levels
    pub thresholds: AlarmThresholds,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: CYCLE_INTERVAL_MS,
            gas_calibration_samples: GAS_CALIBRATION_SAMPLES,
            gas_calibration_interval_ms: GAS_CALIBRATION_INTERVAL_MS,
            thresholds: AlarmThresholds::default(),
        }
    }
}

impl AcquisitionConfig {
    /// Override the cycle interval
    pub fn with_cycle_interval(mut self, ms: u32) -> Self {
        self.cycle_interval_ms = ms;
        self
    }

    /// Override the alarm thresholds
    pub fn with_thresholds(mut self, thresholds: AlarmThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Total time spent learning the gas baseline (ms)
    pub fn calibration_time_ms(&self) -> u32 {
        self.gas_calibration_samples as u32 * self.gas_calibration_interval_ms
    }
}
