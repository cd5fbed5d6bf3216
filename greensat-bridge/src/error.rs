//! Bridge error types
//!
//! Only [`TransportError`] is fatal. Everything else is reported by the
//! ingestion loop and the loop moves on to the next line.

use std::path::PathBuf;

use thiserror::Error;

/// Serial link failures. Ends the bridge.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("serial read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport closed")]
    Closed,

    #[error("reader task failed: {0}")]
    Task(String),
}

/// One record could not be persisted. Logged and dropped.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Bad or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Anything that stops the bridge process
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("cannot open sink: {0}")]
    Sink(#[from] SinkError),
}

/// Bridge result, [`BridgeError`] by default
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
