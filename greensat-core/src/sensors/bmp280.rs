//! Bosch BMP280 barometric pressure sensor over I2C

use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, error};

use super::PressureSensor;
use crate::compensation::{compensate, Compensated, PressureCalibration, RawSample};
use crate::constants::{
    BMP280_CALIBRATION_LEN, BMP280_CONFIG_STANDBY_1000MS, BMP280_CTRL_NORMAL_X1,
    BMP280_REG_CALIBRATION, BMP280_REG_CONFIG, BMP280_REG_CTRL_MEAS, BMP280_REG_DATA,
    BMP280_SAMPLE_LEN,
};
use crate::errors::{SensorFault, SensorResult};

const PART: &str = "BMP280";

/// BMP280 driver
///
/// Owns the bus handle and the factory calibration read at construction.
/// Calibration is read exactly once; if that fails the driver stays alive and
/// every read reports [`SensorFault::NotCalibrated`] so the acquisition loop
/// keeps running with a degraded pressure field.
pub struct Bmp280<I> {
    i2c: I,
    address: u8,
    calibration: Option<PressureCalibration>,
}

impl<I: I2c> Bmp280<I> {
    /// Read calibration and put the sensor in normal mode
    pub fn new(i2c: I, address: u8) -> Self {
        let mut sensor = Self {
            i2c,
            address,
            calibration: None,
        };

        match sensor.initialise() {
            Ok(calibration) => {
                debug!("BMP280 at {:#04x}: calibration {:?}", address, calibration);
                sensor.calibration = Some(calibration);
            }
            Err(e) => {
                error!(
                    "BMP280 init failed at {:#04x} ({:?}), check address (0x76 or 0x77)",
                    address,
                    e.kind()
                );
            }
        }

        sensor
    }

    /// Driver with known constants, skipping the calibration read
    pub fn with_calibration(i2c: I, address: u8, calibration: PressureCalibration) -> Self {
        Self {
            i2c,
            address,
            calibration: Some(calibration),
        }
    }

    fn initialise(&mut self) -> Result<PressureCalibration, I::Error> {
        let mut block = [0u8; BMP280_CALIBRATION_LEN];
        self.i2c
            .write_read(self.address, &[BMP280_REG_CALIBRATION], &mut block)?;
        self.i2c
            .write(self.address, &[BMP280_REG_CTRL_MEAS, BMP280_CTRL_NORMAL_X1])?;
        self.i2c
            .write(self.address, &[BMP280_REG_CONFIG, BMP280_CONFIG_STANDBY_1000MS])?;

        Ok(PressureCalibration::from_registers(&block))
    }

    /// Factory constants, if they were read
    pub fn calibration(&self) -> Option<&PressureCalibration> {
        self.calibration.as_ref()
    }

    /// Burst-read the six data registers
    pub fn read_raw(&mut self) -> SensorResult<RawSample> {
        let mut data = [0u8; BMP280_SAMPLE_LEN];
        self.i2c
            .write_read(self.address, &[BMP280_REG_DATA], &mut data)
            .map_err(|e| {
                error!("BMP280 data read failed: {:?}", e.kind());
                SensorFault::Bus { sensor: PART }
            })?;

        Ok(RawSample::from_registers(&data))
    }

    /// Read and compensate one sample
    pub fn measure(&mut self) -> SensorResult<Compensated> {
        let calibration = self
            .calibration
            .ok_or(SensorFault::NotCalibrated { sensor: PART })?;
        let raw = self.read_raw()?;

        compensate(raw, &calibration)
    }

    /// Give the bus back
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> PressureSensor for Bmp280<I> {
    fn read_pressure(&mut self) -> SensorResult<f32> {
        self.measure().map(|c| c.pressure_hpa())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    /// Register-file fake: answers reads from a 256-byte map
    struct FakeBus {
        registers: [u8; 256],
        writes: heapless::Vec<(u8, u8), 8>,
        fail: bool,
    }

    impl FakeBus {
        fn new() -> Self {
            Self {
                registers: [0; 256],
                writes: heapless::Vec::new(),
                fail: false,
            }
        }

        fn with_datasheet_example() -> Self {
            let c = PressureCalibration::DATASHEET_EXAMPLE;
            let mut bus = Self::new();
            let words: [[u8; 2]; 12] = [
                c.dig_t1.to_le_bytes(),
                c.dig_t2.to_le_bytes(),
                c.dig_t3.to_le_bytes(),
                c.dig_p1.to_le_bytes(),
                c.dig_p2.to_le_bytes(),
                c.dig_p3.to_le_bytes(),
                c.dig_p4.to_le_bytes(),
                c.dig_p5.to_le_bytes(),
                c.dig_p6.to_le_bytes(),
                c.dig_p7.to_le_bytes(),
                c.dig_p8.to_le_bytes(),
                c.dig_p9.to_le_bytes(),
            ];
            for (i, w) in words.iter().enumerate() {
                bus.registers[0x88 + 2 * i] = w[0];
                bus.registers[0x88 + 2 * i + 1] = w[1];
            }
            // adc_P = 415148, adc_T = 519888
            bus.registers[0xF7..0xFD].copy_from_slice(&[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00]);
            bus
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            let mut pointer = 0usize;
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        pointer = bytes[0] as usize;
                        if bytes.len() == 2 {
                            self.writes.push((bytes[0], bytes[1])).ok();
                        }
                    }
                    Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = self.registers[pointer + i];
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn init_reads_calibration_and_configures() {
        let sensor = Bmp280::new(FakeBus::with_datasheet_example(), 0x76);
        assert_eq!(sensor.calibration(), Some(&PressureCalibration::DATASHEET_EXAMPLE));

        let bus = sensor.release();
        assert_eq!(bus.writes.as_slice(), &[(0xF4, 0x27), (0xF5, 0xA0)]);
    }

    #[test]
    fn reads_pressure_in_hpa() {
        let mut sensor = Bmp280::new(FakeBus::with_datasheet_example(), 0x76);
        assert_eq!(sensor.read_pressure(), Ok(1006.5));
    }

    #[test]
    fn bus_failure_degrades_to_fault() {
        let mut sensor = Bmp280::new(FakeBus::with_datasheet_example(), 0x76);
        sensor.i2c.fail = true;
        assert_eq!(sensor.read_pressure(), Err(SensorFault::Bus { sensor: "BMP280" }));
    }

    #[test]
    fn failed_init_reports_not_calibrated() {
        let mut bus = FakeBus::with_datasheet_example();
        bus.fail = true;
        let mut sensor = Bmp280::new(bus, 0x77);
        assert!(sensor.calibration().is_none());

        sensor.i2c.fail = false;
        assert_eq!(
            sensor.read_pressure(),
            Err(SensorFault::NotCalibrated { sensor: "BMP280" })
        );
    }
}
