//! Sensor drivers
//!
//! ## Overview
//!
//! One trait per physical quantity, one driver per part. The aggregator is
//! generic over the traits, so the firmware passes real drivers and the tests
//! pass fakes.
//!
//! | Quantity            | Trait             | Driver in this crate |
//! |---------------------|-------------------|----------------------|
//! | Pressure            | `PressureSensor`  | `Bmp280` (I2C)       |
//! | Illuminance         | `LightSensor`     | `Bh1750` (I2C)       |
//! | Gas level           | `GasSensor`       | `GasEstimator` (ADC) |
//! | Temperature + RH    | `ClimateSensor`   | board-specific       |
//!
//! Every read returns `SensorResult`. A driver never panics on a bus error and
//! never substitutes a sentinel itself; that decision belongs to the reading
//! model.
//!
//! The DHT11 one-wire protocol is timing-critical and lives with the board
//! support code; it only has to implement [`ClimateSensor`].

mod bh1750;
mod bmp280;
mod gas;

pub use bh1750::{counts_to_lux, Bh1750};
pub use bmp280::Bmp280;
pub use gas::{gas_percent, CalibrationBaseline, GasEstimator};

use embedded_hal::delay::DelayNs;

use crate::errors::SensorResult;
use crate::reading::{ClimateSample, GasSample};

/// Barometric pressure source
pub trait PressureSensor {
    /// Pressure in hPa, one decimal
    fn read_pressure(&mut self) -> SensorResult<f32>;
}

/// Ambient light source
pub trait LightSensor {
    /// Illuminance in lux, one decimal
    fn read_lux(&mut self) -> SensorResult<f32>;
}

/// Combined temperature / humidity source
pub trait ClimateSensor {
    /// Trigger and read one measurement
    fn measure(&mut self) -> SensorResult<ClimateSample>;
}

/// Gas level source
pub trait GasSensor {
    /// Raw count and percentage above baseline
    fn read_gas(&mut self) -> SensorResult<GasSample>;

    /// Learn the clean-air reference from `samples` idle reads
    ///
    /// Sources that need no reference accept the call and do nothing.
    fn calibrate_baseline<D: DelayNs>(
        &mut self,
        _delay: &mut D,
        _samples: u16,
        _interval_ms: u32,
    ) -> SensorResult<()> {
        Ok(())
    }
}

/// One analog channel, scaled to 16 bits like `read_u16` on most HALs
pub trait AnalogInput {
    /// Single conversion
    fn read_u16(&mut self) -> SensorResult<u16>;
}

impl<T: PressureSensor + ?Sized> PressureSensor for &mut T {
    fn read_pressure(&mut self) -> SensorResult<f32> {
        (**self).read_pressure()
    }
}

impl<T: LightSensor + ?Sized> LightSensor for &mut T {
    fn read_lux(&mut self) -> SensorResult<f32> {
        (**self).read_lux()
    }
}

impl<T: ClimateSensor + ?Sized> ClimateSensor for &mut T {
    fn measure(&mut self) -> SensorResult<ClimateSample> {
        (**self).measure()
    }
}

impl<T: GasSensor + ?Sized> GasSensor for &mut T {
    fn read_gas(&mut self) -> SensorResult<GasSample> {
        (**self).read_gas()
    }

    fn calibrate_baseline<D: DelayNs>(
        &mut self,
        delay: &mut D,
        samples: u16,
        interval_ms: u32,
    ) -> SensorResult<()> {
        (**self).calibrate_baseline(delay, samples, interval_ms)
    }
}
