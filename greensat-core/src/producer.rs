//! Producer acquisition loop
//!
//! Runs on the board, forever:
//!
//! ```text
//! chirp ─► calibrate ─► [ acquire ─► emit ─► alarm ─► sleep ] ─► ...
//! ```
//!
//! Calibration blocks for `gas_calibration_samples * gas_calibration_interval_ms`
//! before the first cycle. Nothing in a cycle can stop the loop. Sensor faults are already folded into
//! the reading by the aggregator; a failed emit is logged, counted and
//! forgotten.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::aggregator::{Acquire, Cycle};
use crate::alarm::Alarm;
use crate::config::AcquisitionConfig;
use crate::constants::STARTUP_BEEP_MS;
use crate::telemetry::{EmitterStats, LineWriter, TelemetryEmitter};

/// Board-side pipeline: sensors in, telemetry lines and buzzer out
pub struct Producer<A, W, B, D> {
    source: A,
    emitter: TelemetryEmitter<W>,
    alarm: B,
    delay: D,
    config: AcquisitionConfig,
    cycles: u32,
}

impl<A, W, B, D> Producer<A, W, B, D>
where
    A: Acquire,
    W: LineWriter,
    B: Alarm,
    D: DelayNs,
{
    /// Wire the pipeline together
    pub fn new(source: A, writer: W, alarm: B, delay: D, config: &AcquisitionConfig) -> Self {
        Self {
            source,
            emitter: TelemetryEmitter::new(writer),
            alarm,
            delay,
            config: *config,
            cycles: 0,
        }
    }

    /// Startup chirp, then one-time sensor preparation
    pub fn start(&mut self) {
        info!("producer starting, cycle every {} ms", self.config.cycle_interval_ms);
        self.alarm.beep(STARTUP_BEEP_MS);
        self.source.prepare(&mut self.delay, &self.config);
    }

    /// One acquire, emit, alarm pass. Never fails.
    pub fn run_cycle(&mut self) -> Cycle {
        let cycle = self.source.acquire();
        self.cycles = self.cycles.wrapping_add(1);

        // Emit errors are already logged and counted by the emitter
        let _ = self.emitter.emit(&cycle.reading);

        debug!("cycle {}: alarm {:?}", self.cycles, cycle.alarm);
        self.alarm.sound(cycle.alarm);
        cycle
    }

    /// Start, then cycle forever
    pub fn run(&mut self) -> ! {
        self.start();
        loop {
            self.run_cycle();
            self.delay.delay_ms(self.config.cycle_interval_ms);
        }
    }

    /// Completed cycles
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Telemetry counters
    pub fn emitter_stats(&self) -> EmitterStats {
        self.emitter.stats()
    }

    /// Borrow the telemetry transport
    pub fn writer(&self) -> &W {
        self.emitter.writer()
    }

    /// Borrow the alarm
    pub fn alarm(&self) -> &B {
        &self.alarm
    }

    /// Borrow the acquisition source
    pub fn source(&self) -> &A {
        &self.source
    }
}
