//! Gas level estimation from an analog MQ-series sensor
//!
//! ## Model
//!
//! The MQ-2 output rises with combustible gas concentration but its clean-air
//! level drifts from board to board and with heater age. Rather than a ppm
//! curve, the estimator reports a relative level:
//!
//! ```text
//! baseline = mean(N idle samples)           (once, at startup)
//! diff     = max(0, raw - baseline)
//! percent  = min(100, diff / 10000 * 100)
//! ```
//!
//! A raw value below baseline clamps to zero: negative concentration is
//! meaningless, the sensor simply reads a little cleaner than at startup.
//!
//! ## Precondition
//!
//! [`GasEstimator::calibrate`] must run before the first read. Reading without
//! a baseline falls back to a zero baseline, which overstates the level by the
//! whole clean-air offset. The estimator still answers, but every such sample
//! carries `calibrated = false` and the first one logs a warning.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use super::{AnalogInput, GasSensor};
use crate::constants::GAS_FULL_SCALE_COUNTS;
use crate::errors::{SensorFault, SensorResult};
use crate::reading::GasSample;

const PART: &str = "MQ-2";

/// Clean-air reference learned at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationBaseline {
    baseline_raw: f32,
}

impl CalibrationBaseline {
    /// Baseline from a known raw level; negative input clamps to zero
    pub fn new(baseline_raw: f32) -> Self {
        Self {
            baseline_raw: if baseline_raw > 0.0 { baseline_raw } else { 0.0 },
        }
    }

    /// Mean of idle samples, `None` for an empty slice
    pub fn from_samples(samples: &[u16]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let total: u32 = samples.iter().map(|&s| s as u32).sum();
        Some(Self::new(total as f32 / samples.len() as f32))
    }

    /// Mean idle raw count
    pub fn raw(&self) -> f32 {
        self.baseline_raw
    }
}

/// Percentage above baseline, clamped to 0..=100
pub fn gas_percent(raw: u16, baseline: f32) -> f32 {
    let diff = raw as f32 - baseline;
    let diff = if diff < 0.0 { 0.0 } else { diff };
    let percent = (diff / GAS_FULL_SCALE_COUNTS) * 100.0;
    if percent > 100.0 {
        100.0
    } else {
        percent
    }
}

/// MQ-series gas estimator over one analog channel
pub struct GasEstimator<A> {
    input: A,
    baseline: Option<CalibrationBaseline>,
    warned_uncalibrated: bool,
}

impl<A: AnalogInput> GasEstimator<A> {
    /// Uncalibrated estimator
    pub fn new(input: A) -> Self {
        Self {
            input,
            baseline: None,
            warned_uncalibrated: false,
        }
    }

    /// Estimator with a baseline learned elsewhere
    pub fn with_baseline(input: A, baseline: CalibrationBaseline) -> Self {
        Self {
            input,
            baseline: Some(baseline),
            warned_uncalibrated: false,
        }
    }

    /// Average `samples` idle readings, `interval_ms` apart
    ///
    /// Runs once per session. A second call returns the existing baseline
    /// without sampling. Failed conversions are skipped; if none succeed the
    /// estimator stays uncalibrated and the bus fault is returned.
    pub fn calibrate<D: DelayNs>(
        &mut self,
        delay: &mut D,
        samples: u16,
        interval_ms: u32,
    ) -> SensorResult<CalibrationBaseline> {
        if let Some(existing) = self.baseline {
            return Ok(existing);
        }

        let mut total: u32 = 0;
        let mut taken: u32 = 0;
        for _ in 0..samples {
            if let Ok(raw) = self.input.read_u16() {
                total += raw as u32;
                taken += 1;
            }
            delay.delay_ms(interval_ms);
        }

        if taken == 0 {
            warn!("{} calibration got no samples", PART);
            return Err(SensorFault::Bus { sensor: PART });
        }

        let baseline = CalibrationBaseline::new(total as f32 / taken as f32);
        info!(
            "{} baseline {:.1} from {}/{} samples",
            PART,
            baseline.raw(),
            taken,
            samples
        );
        self.baseline = Some(baseline);
        Ok(baseline)
    }

    /// Learned baseline, if any
    pub fn baseline(&self) -> Option<CalibrationBaseline> {
        self.baseline
    }

    /// One raw sample and its percentage
    pub fn read(&mut self) -> SensorResult<GasSample> {
        let raw = self.input.read_u16()?;

        let (baseline, calibrated) = match self.baseline {
            Some(b) => (b.raw(), true),
            None => {
                if !self.warned_uncalibrated {
                    warn!("{} read before calibration, using zero baseline", PART);
                    self.warned_uncalibrated = true;
                }
                (0.0, false)
            }
        };

        Ok(GasSample {
            raw,
            percent: gas_percent(raw, baseline),
            calibrated,
        })
    }
}

impl<A: AnalogInput> GasSensor for GasEstimator<A> {
    fn read_gas(&mut self) -> SensorResult<GasSample> {
        self.read()
    }

    fn calibrate_baseline<D: DelayNs>(
        &mut self,
        delay: &mut D,
        samples: u16,
        interval_ms: u32,
    ) -> SensorResult<()> {
        self.calibrate(delay, samples, interval_ms).map(|_| ())
    }
}
