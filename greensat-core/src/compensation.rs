//! BMP280 Raw Register Compensation
//!
//! ## Background
//!
//! The BMP280 does not output pressure. It outputs two 20-bit ADC counts, one
//! for the pressure bridge and one for the on-die temperature diode, and ships
//! twelve factory trimming constants in NVM. Turning counts into Pascal is a
//! two-stage process documented in the Bosch datasheet (BST-BMP280-DS001,
//! section 3.11):
//!
//! ```text
//! adc_T ──► temperature stage ──► t_fine ──┐
//!            (dig_T1..dig_T3)               │
//!                                           ▼
//! adc_P ──────────────────────────► pressure stage ──► Pa
//!                                   (dig_P1..dig_P9)
//! ```
//!
//! `t_fine` is the coupling term: the pressure polynomial is evaluated around
//! the die temperature of the *same* burst sample, so pressure cannot be
//! computed without running the temperature stage first.
//!
//! ## Register Layout
//!
//! Burst read from `0xF7`, six bytes, MSB first:
//!
//! ```text
//! byte  0        1        2          3        4        5
//!      press_msb press_lsb press_xlsb temp_msb temp_lsb temp_xlsb
//!      [19:12]  [11:4]   [3:0]<<4   [19:12]  [11:4]   [3:0]<<4
//! ```
//!
//! The low nibble of each xlsb byte is unused and discarded.
//!
//! Calibration block from `0x88`, 24 bytes, little-endian words in this order:
//! `dig_T1 (u16)`, `dig_T2 (i16)`, `dig_T3 (i16)`, `dig_P1 (u16)`,
//! `dig_P2..dig_P9 (i16)`.
//!
//! ## Two Implementations
//!
//! - [`compensate`]: the datasheet double-precision reference. This is what
//!   the driver uses.
//! - [`compensate_fixed`]: the datasheet 32-bit temperature / 64-bit pressure
//!   integer path, for targets without an FPU.
//!
//! Both follow the datasheet operation order exactly (including the truncation
//! of `t_fine` to `i32` in the float path) so results stay inside the
//! datasheet accuracy budget. Both guard the one division that can hit zero
//! and report [`SensorFault::DegenerateCalibration`] instead of dividing.
//!
//! ## Reference Vector
//!
//! Datasheet example: `adc_T = 519888`, `adc_P = 415148` with the constants in
//! [`PressureCalibration::DATASHEET_EXAMPLE`] give `t_fine = 128422`,
//! 25.08 °C and 100653.27 Pa.

use crate::constants::{BMP280_CALIBRATION_LEN, BMP280_SAMPLE_LEN};
use crate::errors::{SensorFault, SensorResult};
use crate::math::round1;

/// Factory compensation constants, read once per session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct PressureCalibration {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
}

impl PressureCalibration {
    /// Constants from the datasheet worked example
    pub const DATASHEET_EXAMPLE: Self = Self {
        dig_t1: 27504,
        dig_t2: 26435,
        dig_t3: -1000,
        dig_p1: 36477,
        dig_p2: -10685,
        dig_p3: 3024,
        dig_p4: 2855,
        dig_p5: 140,
        dig_p6: -7,
        dig_p7: 15500,
        dig_p8: -14600,
        dig_p9: 6000,
    };

    /// Decode the 24-byte block starting at register `0x88`
    pub fn from_registers(block: &[u8; BMP280_CALIBRATION_LEN]) -> Self {
        let word = |i: usize| [block[2 * i], block[2 * i + 1]];
        let unsigned = |i: usize| u16::from_le_bytes(word(i));
        let signed = |i: usize| i16::from_le_bytes(word(i));

        Self {
            dig_t1: unsigned(0),
            dig_t2: signed(1),
            dig_t3: signed(2),
            dig_p1: unsigned(3),
            dig_p2: signed(4),
            dig_p3: signed(5),
            dig_p4: signed(6),
            dig_p5: signed(7),
            dig_p6: signed(8),
            dig_p7: signed(9),
            dig_p8: signed(10),
            dig_p9: signed(11),
        }
    }

    /// The twelve constants in register order, widened to `i32`
    pub fn coefficients(&self) -> [i32; 12] {
        [
            self.dig_t1 as i32,
            self.dig_t2 as i32,
            self.dig_t3 as i32,
            self.dig_p1 as i32,
            self.dig_p2 as i32,
            self.dig_p3 as i32,
            self.dig_p4 as i32,
            self.dig_p5 as i32,
            self.dig_p6 as i32,
            self.dig_p7 as i32,
            self.dig_p8 as i32,
            self.dig_p9 as i32,
        ]
    }
}

/// Uncompensated 20-bit ADC counts from one burst read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// `adc_P`
    pub pressure: i32,
    /// `adc_T`
    pub temperature: i32,
}

impl RawSample {
    /// Split the 6-byte burst read into the two 20-bit counts
    pub fn from_registers(bytes: &[u8; BMP280_SAMPLE_LEN]) -> Self {
        let assemble = |msb: u8, lsb: u8, xlsb: u8| {
            ((msb as i32) << 12) | ((lsb as i32) << 4) | ((xlsb as i32) >> 4)
        };

        Self {
            pressure: assemble(bytes[0], bytes[1], bytes[2]),
            temperature: assemble(bytes[3], bytes[4], bytes[5]),
        }
    }
}

/// Output of the double-precision path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compensated {
    /// Fine temperature shared between the two stages
    pub t_fine: i32,
    /// Die temperature (°C)
    pub temperature_c: f64,
    /// Pressure (Pa)
    pub pressure_pa: f64,
}

impl Compensated {
    /// Pressure in hPa, rounded to one decimal
    pub fn pressure_hpa(&self) -> f32 {
        round1(self.pressure_pa / 100.0) as f32
    }
}

/// Output of the integer path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCompensated {
    /// Fine temperature shared between the two stages
    pub t_fine: i32,
    /// Die temperature in 0.01 °C
    pub temperature_centi_c: i32,
    /// Pressure in Pa as unsigned Q24.8 (divide by 256 for Pa)
    pub pressure_q24_8: u32,
}

impl FixedCompensated {
    /// Pressure in Pa
    pub fn pressure_pa(&self) -> f64 {
        self.pressure_q24_8 as f64 / 256.0
    }
}

/// Temperature stage, double precision. Returns `(t_fine, °C)`.
pub fn fine_temperature(adc_t: i32, cal: &PressureCalibration) -> (i32, f64) {
    let adc_t = adc_t as f64;
    let t1 = cal.dig_t1 as f64;

    let var1 = (adc_t / 16384.0 - t1 / 1024.0) * cal.dig_t2 as f64;
    let delta = adc_t / 131072.0 - t1 / 8192.0;
    let var2 = delta * delta * cal.dig_t3 as f64;

    let t_fine = (var1 + var2) as i32;
    (t_fine, (var1 + var2) / 5120.0)
}

/// Pressure stage, double precision. Returns Pa.
pub fn pressure_from_fine(adc_p: i32, t_fine: i32, cal: &PressureCalibration) -> SensorResult<f64> {
    let mut var1 = t_fine as f64 / 2.0 - 64000.0;
    let mut var2 = var1 * var1 * cal.dig_p6 as f64 / 32768.0;
    var2 += var1 * cal.dig_p5 as f64 * 2.0;
    var2 = var2 / 4.0 + cal.dig_p4 as f64 * 65536.0;
    var1 = (cal.dig_p3 as f64 * var1 * var1 / 524288.0 + cal.dig_p2 as f64 * var1) / 524288.0;
    var1 = (1.0 + var1 / 32768.0) * cal.dig_p1 as f64;

    if var1 == 0.0 {
        return Err(SensorFault::DegenerateCalibration);
    }

    let mut p = 1048576.0 - adc_p as f64;
    p = (p - var2 / 4096.0) * 6250.0 / var1;
    var1 = cal.dig_p9 as f64 * p * p / 2147483648.0;
    var2 = p * cal.dig_p8 as f64 / 32768.0;

    Ok(p + (var1 + var2 + cal.dig_p7 as f64) / 16.0)
}

/// Full double-precision compensation of one burst sample
pub fn compensate(raw: RawSample, cal: &PressureCalibration) -> SensorResult<Compensated> {
    let (t_fine, temperature_c) = fine_temperature(raw.temperature, cal);
    let pressure_pa = pressure_from_fine(raw.pressure, t_fine, cal)?;

    Ok(Compensated { t_fine, temperature_c, pressure_pa })
}

/// Full integer compensation of one burst sample
///
/// The pressure stage runs in `i128`, wide enough for any counts and any
/// calibration. A result outside the unsigned Q24.8 range is reported as
/// invalid data rather than wrapped.
pub fn compensate_fixed(raw: RawSample, cal: &PressureCalibration) -> SensorResult<FixedCompensated> {
    // Widened to i64: the datasheet's 32-bit products overflow near full-scale adc_T.
    let adc_t = raw.temperature as i64;
    let t1 = cal.dig_t1 as i64;

    let var1 = (((adc_t >> 3) - (t1 << 1)) * cal.dig_t2 as i64) >> 11;
    let delta = (adc_t >> 4) - t1;
    let var2 = (((delta * delta) >> 12) * cal.dig_t3 as i64) >> 14;
    let t_fine = (var1 + var2) as i32;
    let temperature_centi_c = ((t_fine as i64 * 5 + 128) >> 8) as i32;

    let mut var1 = t_fine as i128 - 128000;
    let mut var2 = var1 * var1 * cal.dig_p6 as i128;
    var2 += (var1 * cal.dig_p5 as i128) << 17;
    var2 += (cal.dig_p4 as i128) << 35;
    var1 = ((var1 * var1 * cal.dig_p3 as i128) >> 8) + ((var1 * cal.dig_p2 as i128) << 12);
    var1 = (((1i128 << 47) + var1) * cal.dig_p1 as i128) >> 33;

    if var1 == 0 {
        return Err(SensorFault::DegenerateCalibration);
    }

    let out_of_range = SensorFault::InvalidData {
        sensor: "BMP280",
        reason: "pressure out of range",
    };

    let p = 1048576 - raw.pressure as i128;
    let p = (((p << 31) - var2) * 3125) / var1;
    // Bounded to i64 so the squared term below stays inside i128
    let p = i64::try_from(p).map_err(|_| out_of_range)? as i128;
    let var1 = (cal.dig_p9 as i128 * (p >> 13) * (p >> 13)) >> 25;
    let var2 = (cal.dig_p8 as i128 * p) >> 19;
    let p = ((p + var1 + var2) >> 8) + ((cal.dig_p7 as i128) << 4);

    Ok(FixedCompensated {
        t_fine,
        temperature_centi_c,
        pressure_q24_8: u32::try_from(p).map_err(|_| out_of_range)?,
    })
}

/// Burst bytes plus calibration straight to hPa (one decimal)
pub fn decode_pressure(bytes: &[u8; BMP280_SAMPLE_LEN], cal: &PressureCalibration) -> SensorResult<f32> {
    compensate(RawSample::from_registers(bytes), cal).map(|c| c.pressure_hpa())
}
