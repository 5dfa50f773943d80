//! Bridge configuration
//!
//! Every section has defaults matching the apparatus as installed, so an empty
//! file (or no file at all) is a valid configuration.
//!
//! ```yaml
//! serial:
//!   port: /dev/ttyUSB0
//!   baud_rate: 38400
//!   poll_interval_ms: 100
//! ingest:
//!   frame_timeout_ms: 1000
//!   max_errors: 10
//! http:
//!   listen: 0.0.0.0:8080
//!   path: /data.json
//! diagnostics:
//!   log_file: data_log.txt
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::{BridgeError, Result};

#[cfg(windows)]
const DEFAULT_PORT: &str = "COM3";
#[cfg(not(windows))]
const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub serial: SerialConfig,
    pub ingest: IngestConfig,
    pub http: HttpConfig,
    pub diagnostics: DiagnosticsConfig,
}

/// Serial line settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound on one blocking read, so frame timeouts and shutdown stay responsive
    pub poll_interval_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT.to_string(), baud_rate: 38400, poll_interval_ms: 100 }
    }
}

impl SerialConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Ingest loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Time allowed from a start marker to its end marker
    pub frame_timeout_ms: u64,
    /// Consecutive source errors tolerated before ingestion stops
    pub max_errors: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { frame_timeout_ms: 1000, max_errors: 10 }
    }
}

impl IngestConfig {
    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}

/// Status endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub listen: SocketAddr,
    /// Request path serving the snapshot
    pub path: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { listen: SocketAddr::from(([0, 0, 0, 0], 8080)), path: "/data.json".to_string() }
    }
}

/// Diagnostic output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Append-only text log of every merged snapshot; `None` disables it
    pub log_file: Option<PathBuf>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { log_file: Some(PathBuf::from("data_log.txt")) }
    }
}

impl BridgeConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: BridgeConfig = if yaml.trim().is_empty() {
            BridgeConfig::default()
        } else {
            serde_yaml_ng::from_str(yaml).map_err(|e| BridgeError::config(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::file_error(path.to_path_buf(), e))?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_yaml_str(&yaml)
    }

    /// Reject values the bridge cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.trim().is_empty() {
            return Err(BridgeError::config("serial.port must not be empty"));
        }
        if self.serial.baud_rate == 0 {
            return Err(BridgeError::config("serial.baud_rate must be positive"));
        }
        if self.serial.poll_interval_ms == 0 {
            return Err(BridgeError::config("serial.poll_interval_ms must be positive"));
        }
        if self.ingest.frame_timeout_ms == 0 {
            return Err(BridgeError::config("ingest.frame_timeout_ms must be positive"));
        }
        if self.ingest.max_errors == 0 {
            return Err(BridgeError::config("ingest.max_errors must be positive"));
        }
        if !self.http.path.starts_with('/') {
            return Err(BridgeError::config(format!(
                "http.path must start with '/', got {:?}",
                self.http.path
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = BridgeConfig::from_yaml_str("").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.serial.baud_rate, 38400);
        assert_eq!(config.ingest.frame_timeout(), Duration::from_secs(1));
        assert_eq!(config.http.path, "/data.json");
        assert_eq!(config.diagnostics.log_file, Some(PathBuf::from("data_log.txt")));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "serial:\n  port: COM7\nhttp:\n  listen: 127.0.0.1:9000\n";
        let config = BridgeConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.serial.port, "COM7");
        assert_eq!(config.serial.baud_rate, 38400);
        assert_eq!(config.http.listen, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.http.path, "/data.json");
    }

    #[test]
    fn log_file_can_be_disabled() {
        let config = BridgeConfig::from_yaml_str("diagnostics:\n  log_file: null\n").unwrap();
        assert_eq!(config.diagnostics.log_file, None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for yaml in [
            "serial:\n  baud_rate: 0\n",
            "serial:\n  poll_interval_ms: 0\n",
            "ingest:\n  frame_timeout_ms: 0\n",
            "http:\n  path: data.json\n",
            "serial:\n  parity: odd\n",
        ] {
            let result = BridgeConfig::from_yaml_str(yaml);
            assert!(matches!(result, Err(BridgeError::Config { .. })), "{}", yaml);
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let result = BridgeConfig::load("/nonexistent/piste.yaml");
        assert!(matches!(result, Err(BridgeError::File { .. })));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.yaml");
        std::fs::write(&path, "ingest:\n  max_errors: 3\n").unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.ingest.max_errors, 3);
    }
}
