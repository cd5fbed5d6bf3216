//! Bridge configuration
//!
//! Read from an optional JSON file; anything left out takes its default.
//!
//! ```json
//! {
//!   "port": "/dev/ttyACM0",
//!   "baud_rate": 115200,
//!   "read_timeout_ms": 1000,
//!   "sink": { "kind": "history", "database_url": "sqlite://greensat.db" }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable that overrides the serial port
pub const PORT_ENV: &str = "GREENSAT_PORT";

fn default_database_url() -> String {
    "sqlite://greensat.db".to_string()
}

fn default_latest_path() -> PathBuf {
    PathBuf::from("data.json")
}

/// Which persistence policy to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkSelector {
    /// Append every reading to the SQLite history
    History {
        #[serde(default = "default_database_url")]
        database_url: String,
    },
    /// Overwrite a single JSON file with the latest reading
    Latest {
        #[serde(default = "default_latest_path")]
        path: PathBuf,
    },
}

impl Default for SinkSelector {
    fn default() -> Self {
        Self::History {
            database_url: default_database_url(),
        }
    }
}

/// Serial link and sink settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Serial device path or COM name
    pub port: String,
    /// Line speed
    pub baud_rate: u32,
    /// Blocking read timeout (ms)
    pub read_timeout_ms: u64,
    /// Persistence policy
    pub sink: SinkSelector,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 1_000,
            sink: SinkSelector::default(),
        }
    }
}

impl BridgeConfig {
    /// Defaults on the given port
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON document
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set line speed
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set read timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Append to a SQLite history
    pub fn history(mut self, database_url: impl Into<String>) -> Self {
        self.sink = SinkSelector::History {
            database_url: database_url.into(),
        };
        self
    }

    /// Overwrite a latest-value file
    pub fn latest(mut self, path: impl Into<PathBuf>) -> Self {
        self.sink = SinkSelector::Latest { path: path.into() };
        self
    }

    /// Replace the port when an override is present
    pub fn with_port_override(mut self, port: Option<String>) -> Self {
        if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
            self.port = port;
        }
        self
    }

    /// Apply [`PORT_ENV`] from the process environment
    pub fn with_env(self) -> Self {
        self.with_port_override(std::env::var(PORT_ENV).ok())
    }

    /// Read timeout as a `Duration`
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Reject settings the serial port cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::Invalid("port must not be empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be > 0".into()));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("read_timeout_ms must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = BridgeConfig::from_json("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.read_timeout(), Duration::from_secs(1));
        assert_eq!(
            config.sink,
            SinkSelector::History { database_url: "sqlite://greensat.db".into() }
        );
    }

    #[test]
    fn latest_sink_takes_default_path() {
        let config =
            BridgeConfig::from_json(r#"{"port":"COM5","sink":{"kind":"latest"}}"#).unwrap();
        assert_eq!(config.port, "COM5");
        assert_eq!(config.sink, SinkSelector::Latest { path: "data.json".into() });
    }

    #[test]
    fn builder_sets_fields() {
        let config = BridgeConfig::new("/dev/ttyUSB0")
            .baud_rate(9_600)
            .timeout(Duration::from_millis(250))
            .latest("/tmp/live.json");

        assert_eq!(config.baud_rate, 9_600);
        assert_eq!(config.read_timeout_ms, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unusable_settings() {
        assert!(BridgeConfig::from_json(r#"{"baud_rate":0}"#).is_err());
        assert!(BridgeConfig::from_json(r#"{"read_timeout_ms":0}"#).is_err());
        assert!(BridgeConfig::from_json(r#"{"port":"  "}"#).is_err());
        assert!(matches!(
            BridgeConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn port_override_wins_unless_blank() {
        let config = BridgeConfig::default().with_port_override(Some("COM7".into()));
        assert_eq!(config.port, "COM7");

        let config = BridgeConfig::default().with_port_override(Some("".into()));
        assert_eq!(config.port, "/dev/ttyACM0");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = BridgeConfig::load("/nonexistent/greensat.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
