//! Host-side bridge for GreenSat telemetry
//!
//! Listens on the serial port the board writes to, turns each line into a
//! timestamped [`Reading`] and hands it to one persistence policy: the SQLite
//! history or a single latest-value file.
//!
//! Key constraints:
//! - A bad line is discarded, never fatal
//! - A failed write loses one reading, never the loop
//! - Only losing the serial link stops the bridge
//!
//! ```no_run
//! use greensat_bridge::{AnySink, BridgeConfig, IngestLoop, SystemClock};
//!
//! # async fn run() -> greensat_bridge::Result<()> {
//! let config = BridgeConfig::default().with_env();
//! let sink = AnySink::open(&config.sink).await?;
//! let source = greensat_bridge::source::open_serial(&config)?;
//!
//! let mut ingest = IngestLoop::new(source, sink, SystemClock);
//! ingest.run_until(std::future::pending()).await?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod decode;
pub mod error;
pub mod ingest;
pub mod reading;
pub mod sink;
pub mod source;

// Public API
pub use clock::{Clock, FixedClock, SystemClock, DATE_TIME_FORMAT};
pub use config::{BridgeConfig, SinkSelector};
pub use decode::{decode_line, DiscardReason};
pub use error::{BridgeError, ConfigError, Result, SinkError, TransportError};
pub use ingest::{IngestLoop, IngestState, IngestStats, Outcome};
pub use reading::Reading;
pub use sink::{AnySink, DailySummary, HistoryStore, LatestValueFile, ReadingSink, TimeBounds};
pub use source::{BlockingLineSource, LineEvent, LineSource, MemoryLineSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
