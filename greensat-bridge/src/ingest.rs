//! Bridge ingestion loop
//!
//! ## State machine
//!
//! ```text
//!  Idle ──line──► LineReceived ──decode ok──► Parsed ──write ok──► Persisted
//!   ▲  │                │                       │                    │
//!   │  └─timeout─┐      └──discard──► Discarded │ write failed       │
//!   │            │                       │      │ (logged)           │
//!   └────────────┴───────────────────────┴──────┴────────────────────┘
//! ```
//!
//! One [`IngestLoop::step`] walks this graph once. Every line ends in
//! `Persisted` or `Discarded`, or is dropped after a logged sink failure; all
//! of them return to `Idle`. Only a transport failure leaves the loop.

use std::future::Future;

use log::{debug, error, info, warn};

use crate::clock::{format_timestamp, Clock};
use crate::decode::{decode_line, DiscardReason};
use crate::error::TransportError;
use crate::reading::Reading;
use crate::sink::ReadingSink;
use crate::source::{LineEvent, LineSource};

/// Where the loop is in the current pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    /// Waiting for a line
    Idle,
    /// Line read, not yet decoded
    LineReceived,
    /// Frame decoded, sink write pending
    Parsed,
    /// Sink accepted the reading
    Persisted,
    /// Line dropped by the decoder
    Discarded,
}

/// Result of one pass
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Read timed out with nothing to do
    Idle,
    /// Reading written to the sink
    Persisted(Reading),
    /// Line dropped before parsing completed
    Discarded(DiscardReason),
    /// Sink rejected the reading; it is gone
    SinkFailed,
}

/// Counters per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Complete lines read from the source
    pub lines_received: u64,
    /// Timeouts with no line
    pub idle_polls: u64,
    /// Readings the sink accepted
    pub persisted: u64,
    /// Readings lost to a sink error
    pub sink_failures: u64,
    discarded: [u64; DiscardReason::ALL.len()],
}

impl IngestStats {
    fn record_discard(&mut self, reason: DiscardReason) {
        self.discarded[reason as usize] += 1;
    }

    /// Lines dropped for `reason`
    pub fn discarded(&self, reason: DiscardReason) -> u64 {
        self.discarded[reason as usize]
    }

    /// Lines dropped for any reason
    pub fn total_discarded(&self) -> u64 {
        self.discarded.iter().sum()
    }
}

/// Reads lines, turns them into readings and hands them to a sink
pub struct IngestLoop<S, K, C> {
    source: S,
    sink: K,
    clock: C,
    state: IngestState,
    stats: IngestStats,
}

impl<S, K, C> IngestLoop<S, K, C>
where
    S: LineSource,
    K: ReadingSink,
    C: Clock,
{
    /// Loop starting in `Idle` with zeroed counters
    pub fn new(source: S, sink: K, clock: C) -> Self {
        Self {
            source,
            sink,
            clock,
            state: IngestState::Idle,
            stats: IngestStats::default(),
        }
    }

    /// Last state reached
    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Counters so far
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Borrow the sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Give the source and sink back
    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }

    /// One pass: wait for a line and take it as far as it goes
    ///
    /// Returns `Err` only for a transport failure.
    pub async fn step(&mut self) -> Result<Outcome, TransportError> {
        self.state = IngestState::Idle;

        let raw = match self.source.next_line().await? {
            LineEvent::Idle => {
                self.stats.idle_polls += 1;
                return Ok(Outcome::Idle);
            }
            LineEvent::Line(raw) => raw,
        };
        self.state = IngestState::LineReceived;
        self.stats.lines_received += 1;

        let frame = match decode_line(&raw) {
            Ok(frame) => frame,
            Err(reason) => {
                self.state = IngestState::Discarded;
                self.stats.record_discard(reason);
                match reason {
                    DiscardReason::Empty | DiscardReason::NotStructured => {
                        debug!("discarded line ({}): {:?}", reason, String::from_utf8_lossy(&raw));
                    }
                    _ => warn!("discarded line ({}): {:?}", reason, String::from_utf8_lossy(&raw)),
                }
                return Ok(Outcome::Discarded(reason));
            }
        };
        self.state = IngestState::Parsed;

        if !frame.faults.is_empty() {
            let names: Vec<&str> = frame.faults.iter().map(|f| f.wire_name()).collect();
            warn!("producer sent defaults for: {}", names.join(", "));
        }

        let reading = Reading::from_frame(&frame, self.clock.now());
        match self.sink.write(&reading).await {
            Ok(()) => {
                self.state = IngestState::Persisted;
                self.stats.persisted += 1;
                info!(
                    "stored reading at {} (temp {:?} °C, gas {:?} %)",
                    format_timestamp(&reading.captured_at),
                    reading.temperature_c,
                    reading.gas_pct
                );
                Ok(Outcome::Persisted(reading))
            }
            Err(e) => {
                self.state = IngestState::Idle;
                self.stats.sink_failures += 1;
                error!("sink write failed, reading dropped: {}", e);
                Ok(Outcome::SinkFailed)
            }
        }
    }

    /// Step until `shutdown` resolves or the transport fails
    ///
    /// Shutdown is checked between passes and also interrupts a pending read.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<IngestStats, TransportError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("shutdown requested, stopping ingestion");
                    return Ok(self.stats);
                }
                step = self.step() => {
                    if let Err(e) = step {
                        error!("transport failure: {}", e);
                        return Err(e);
                    }
                }
            }
        }
    }
}
