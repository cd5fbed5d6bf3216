//! Constants for GreenSat acquisition
//!
//! Register maps, scale factors and default intervals in one place. Values
//! come from the part datasheets (BMP280, BH1750) or from the way the board
//! was characterised in the field (gas scale, alarm thresholds).

// ===== ACQUISITION CYCLE =====

/// Delay between two acquisition cycles (ms).
pub const CYCLE_INTERVAL_MS: u32 = 2_000;

/// Number of idle samples averaged into the gas baseline.
pub const GAS_CALIBRATION_SAMPLES: u16 = 20;

/// Delay between two gas calibration samples (ms).
pub const GAS_CALIBRATION_INTERVAL_MS: u32 = 100;

/// Raw ADC delta (16-bit counts) that maps to 100% gas level.
///
/// Empirical: a lighter held next to the MQ-2 moves the reading by roughly
/// this much above the clean-air baseline.
pub const GAS_FULL_SCALE_COUNTS: f32 = 10_000.0;

// ===== ALARM THRESHOLDS =====

/// Gas level above which the buzzer sounds the full alert (%).
pub const GAS_ALERT_PCT: f32 = 30.0;

/// Temperature above which the buzzer beeps once (°C).
pub const TEMPERATURE_ALERT_C: f32 = 35.0;

/// Beep length used for a temperature warning (ms).
pub const WARNING_BEEP_MS: u32 = 500;

/// Beep and gap length used inside a gas alert (ms).
pub const ALERT_BEEP_MS: u32 = 100;

/// Number of beeps in a gas alert.
pub const ALERT_BEEP_COUNT: u8 = 3;

/// Startup chirp length (ms).
pub const STARTUP_BEEP_MS: u32 = 100;

// ===== BMP280 =====

/// Default I2C address (SDO tied low).
pub const BMP280_ADDRESS: u8 = 0x76;

/// Alternate I2C address (SDO tied high).
pub const BMP280_ADDRESS_ALT: u8 = 0x77;

/// First factory calibration register (`dig_T1` LSB).
pub const BMP280_REG_CALIBRATION: u8 = 0x88;

/// Measurement control register.
pub const BMP280_REG_CTRL_MEAS: u8 = 0xF4;

/// Standby / filter configuration register.
pub const BMP280_REG_CONFIG: u8 = 0xF5;

/// First data register (`press_msb`). Burst read covers pressure then temperature.
pub const BMP280_REG_DATA: u8 = 0xF7;

/// Normal mode, temperature and pressure oversampling x1.
pub const BMP280_CTRL_NORMAL_X1: u8 = 0x27;

/// 1000 ms standby between conversions, IIR filter off.
pub const BMP280_CONFIG_STANDBY_1000MS: u8 = 0xA0;

/// Length of the calibration block (12 little-endian words).
pub const BMP280_CALIBRATION_LEN: usize = 24;

/// Length of one pressure + temperature burst sample.
pub const BMP280_SAMPLE_LEN: usize = 6;

// ===== BH1750 =====

/// Default I2C address (ADDR pin low).
pub const BH1750_ADDRESS: u8 = 0x23;

/// Power-on opcode.
pub const BH1750_POWER_ON: u8 = 0x01;

/// Continuous high resolution mode opcode (1 lx resolution).
pub const BH1750_CONTINUOUS_HIGH_RES: u8 = 0x10;

/// Wait after starting a conversion before reading (ms). Datasheet max is 180.
pub const BH1750_MEASUREMENT_MS: u32 = 200;

/// Counts per lux at default sensitivity.
pub const BH1750_COUNTS_PER_LUX: f32 = 1.2;
