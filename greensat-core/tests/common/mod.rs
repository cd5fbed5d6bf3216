//! Fake board hardware for integration tests
//!
//! Everything here implements `embedded-hal` 1.0 traits directly, so the real
//! drivers run unchanged against it.

#![allow(dead_code)]

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

use greensat_core::reading::ClimateSample;
use greensat_core::sensors::{AnalogInput, ClimateSensor};
use greensat_core::{PressureCalibration, SensorFault, SensorResult};

/// adc_P = 415148, adc_T = 519888 (datasheet worked example)
pub const DATASHEET_BURST: [u8; 6] = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00];

/// Register-addressed I2C device with an auto-incrementing pointer
pub struct RegisterDevice {
    pub registers: [u8; 256],
    pub writes: Vec<Vec<u8>>,
    pub reads_fail: bool,
}

impl RegisterDevice {
    pub fn new() -> Self {
        Self {
            registers: [0; 256],
            writes: Vec::new(),
            reads_fail: false,
        }
    }

    /// BMP280 loaded with the datasheet calibration and sample
    pub fn bmp280() -> Self {
        Self::bmp280_with(&PressureCalibration::DATASHEET_EXAMPLE, DATASHEET_BURST)
    }

    pub fn bmp280_with(cal: &PressureCalibration, burst: [u8; 6]) -> Self {
        let mut device = Self::new();
        for (i, c) in cal.coefficients().iter().enumerate() {
            let bytes = (*c as u16).to_le_bytes();
            device.registers[0x88 + 2 * i] = bytes[0];
            device.registers[0x88 + 2 * i + 1] = bytes[1];
        }
        device.registers[0xF7..0xFD].copy_from_slice(&burst);
        device
    }
}

impl ErrorType for RegisterDevice {
    type Error = ErrorKind;
}

impl I2c for RegisterDevice {
    fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        let mut pointer = 0usize;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    pointer = bytes[0] as usize;
                    self.writes.push(bytes.to_vec());
                }
                Operation::Read(buf) => {
                    if self.reads_fail {
                        return Err(ErrorKind::Other);
                    }
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = self.registers[(pointer + i) % 256];
                    }
                }
            }
        }
        Ok(())
    }
}

/// Command-driven light sensor: answers every read with `counts`
pub struct LightDevice {
    pub counts: u16,
    pub commands: Vec<u8>,
}

impl LightDevice {
    pub fn new(counts: u16) -> Self {
        Self { counts, commands: Vec::new() }
    }
}

impl ErrorType for LightDevice {
    type Error = ErrorKind;
}

impl I2c for LightDevice {
    fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => self.commands.extend_from_slice(bytes),
                Operation::Read(buf) => buf.copy_from_slice(&self.counts.to_be_bytes()),
            }
        }
        Ok(())
    }
}

/// ADC that replays a script, then repeats its last value
pub struct ScriptedAdc {
    script: VecDeque<SensorResult<u16>>,
    last: SensorResult<u16>,
}

impl ScriptedAdc {
    pub fn new(values: &[SensorResult<u16>]) -> Self {
        Self {
            script: values.iter().copied().collect(),
            last: Err(SensorFault::Bus { sensor: "ADC" }),
        }
    }
}

impl AnalogInput for ScriptedAdc {
    fn read_u16(&mut self) -> SensorResult<u16> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last
    }
}

/// Climate sensor with a fixed answer
pub struct FixedClimate(pub SensorResult<ClimateSample>);

impl ClimateSensor for FixedClimate {
    fn measure(&mut self) -> SensorResult<ClimateSample> {
        self.0
    }
}

/// Delay that only counts
#[derive(Default, Clone, Copy)]
pub struct CountingDelay {
    pub total_ms: u32,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += ns / 1_000_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms;
    }
}

/// Output pin that counts rising edges
#[derive(Default)]
pub struct EdgeCounter {
    pub rising: u32,
    pub high: bool,
}

impl PinErrorType for EdgeCounter {
    type Error = core::convert::Infallible;
}

impl OutputPin for EdgeCounter {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.rising += 1;
        }
        self.high = true;
        Ok(())
    }
}
