//! Threshold alarm
//!
//! The only actuation in the system: a buzzer that chirps on startup, beeps
//! once when it is too hot and sounds a three-beep alert on gas. Evaluated
//! after each reading is assembled; never part of the reading itself.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::warn;

use crate::constants::{
    ALERT_BEEP_COUNT, ALERT_BEEP_MS, GAS_ALERT_PCT, TEMPERATURE_ALERT_C, WARNING_BEEP_MS,
};
use crate::reading::Reading;

/// What the buzzer should do after a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmAction {
    /// Nothing to report
    Quiet,
    /// Single long beep (temperature)
    Beep,
    /// Repeated short beeps (gas)
    Alert,
}

/// Trigger levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmThresholds {
    /// Gas level strictly above this sounds the alert (%)
    pub gas_pct: f32,
    /// Temperature strictly above this beeps (°C)
    pub temperature_c: f32,
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            gas_pct: GAS_ALERT_PCT,
            temperature_c: TEMPERATURE_ALERT_C,
        }
    }
}

impl AlarmThresholds {
    /// Gas takes precedence over temperature. Faulted fields never trigger.
    pub fn evaluate(&self, reading: &Reading) -> AlarmAction {
        if matches!(reading.gas_pct.value(), Some(g) if g > self.gas_pct) {
            return AlarmAction::Alert;
        }
        if matches!(reading.temperature_c.value(), Some(t) if t > self.temperature_c) {
            return AlarmAction::Beep;
        }
        AlarmAction::Quiet
    }
}

/// Anything that can make noise
pub trait Alarm {
    /// Sound for `duration_ms`
    fn beep(&mut self, duration_ms: u32);

    /// Three short beeps
    fn alert(&mut self);

    /// Carry out an evaluated action
    fn sound(&mut self, action: AlarmAction) {
        match action {
            AlarmAction::Quiet => {}
            AlarmAction::Beep => self.beep(WARNING_BEEP_MS),
            AlarmAction::Alert => self.alert(),
        }
    }
}

/// Active buzzer on a GPIO
pub struct Buzzer<P, D> {
    pin: P,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> Buzzer<P, D> {
    /// Drive the pin low and take ownership
    pub fn new(mut pin: P, delay: D) -> Self {
        if pin.set_low().is_err() {
            warn!("buzzer pin could not be driven low");
        }
        Self { pin, delay }
    }

    /// Give the pin and delay back
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

impl<P: OutputPin, D: DelayNs> Alarm for Buzzer<P, D> {
    fn beep(&mut self, duration_ms: u32) {
        if self.pin.set_high().is_err() {
            warn!("buzzer pin write failed");
            return;
        }
        self.delay.delay_ms(duration_ms);
        if self.pin.set_low().is_err() {
            warn!("buzzer pin stuck high");
        }
    }

    fn alert(&mut self) {
        for _ in 0..ALERT_BEEP_COUNT {
            self.beep(ALERT_BEEP_MS);
            self.delay.delay_ms(ALERT_BEEP_MS);
        }
    }
}
