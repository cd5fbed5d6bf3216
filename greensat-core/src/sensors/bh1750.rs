//! ROHM BH1750 ambient light sensor over I2C

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::{error, warn};

use super::LightSensor;
use crate::constants::{
    BH1750_CONTINUOUS_HIGH_RES, BH1750_COUNTS_PER_LUX, BH1750_MEASUREMENT_MS, BH1750_POWER_ON,
};
use crate::errors::{SensorFault, SensorResult};
use crate::math::round1;

const PART: &str = "BH1750";

/// BH1750 driver
pub struct Bh1750<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    measurement_ms: u32,
}

impl<I: I2c, D: DelayNs> Bh1750<I, D> {
    /// Power the sensor on. A failed power-on is logged; reads will report it.
    pub fn new(i2c: I, delay: D, address: u8) -> Self {
        let mut sensor = Self {
            i2c,
            delay,
            address,
            measurement_ms: BH1750_MEASUREMENT_MS,
        };

        if let Err(e) = sensor.i2c.write(address, &[BH1750_POWER_ON]) {
            warn!("BH1750 power-on at {:#04x} failed: {:?}", address, e.kind());
        }

        sensor
    }

    /// Override the conversion wait
    pub fn with_measurement_time(mut self, ms: u32) -> Self {
        self.measurement_ms = ms;
        self
    }

    /// Raw 16-bit count from one conversion
    pub fn read_counts(&mut self) -> SensorResult<u16> {
        let bus_fault = |e: I::Error| {
            error!("BH1750 read failed: {:?}", e.kind());
            SensorFault::Bus { sensor: PART }
        };

        self.i2c
            .write(self.address, &[BH1750_CONTINUOUS_HIGH_RES])
            .map_err(bus_fault)?;
        self.delay.delay_ms(self.measurement_ms);

        let mut data = [0u8; 2];
        self.i2c.read(self.address, &mut data).map_err(bus_fault)?;

        Ok(u16::from_be_bytes(data))
    }

    /// Give the bus and delay back
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }
}

/// Convert a raw count to lux, one decimal
pub fn counts_to_lux(counts: u16) -> f32 {
    round1(counts as f64 / BH1750_COUNTS_PER_LUX as f64) as f32
}

impl<I: I2c, D: DelayNs> LightSensor for Bh1750<I, D> {
    fn read_lux(&mut self) -> SensorResult<f32> {
        self.read_counts().map(counts_to_lux)
    }
}
