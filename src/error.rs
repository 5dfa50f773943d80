//! Error types for the piste bridge.
//!
//! Two families of errors exist and they never mix:
//!
//! - [`BridgeError`] covers the I/O edges of the process: opening the serial
//!   device, reading configuration, binding the status endpoint, and losing the
//!   byte source mid-stream. These propagate to the caller.
//! - [`DecodeError`] covers a single frame that could not be turned into a
//!   message. It is always recovered inside the ingest loop: logged, counted, and
//!   otherwise ignored. No state is mutated for a frame that fails to decode.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use piste_bridge::BridgeError;
//!
//! let error = BridgeError::device_unavailable("/dev/ttyUSB0", "no such file");
//! if !error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::Variant;

/// Result type alias for bridge operations.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Main error type for bridge operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("Failed to open serial device {port}: {reason}")]
    Device {
        port: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Byte source lost: {reason}")]
    DeviceLost {
        reason: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Status endpoint error: {reason}")]
    Http {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },
}

impl BridgeError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Device { .. } => false,
            BridgeError::DeviceLost { .. } => true,
            BridgeError::File { .. } => false,
            BridgeError::Config { .. } => false,
            BridgeError::Http { .. } => false,
            BridgeError::Timeout { .. } => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BridgeError::Device { .. } => vec![
                "Check the apparatus is powered and the cable is connected",
                "Verify the configured serial port name",
                "Check permissions on the serial device",
            ],
            BridgeError::DeviceLost { .. } => vec![
                "Check the serial cable and USB adapter",
                "Restart the bridge once the apparatus is reachable again",
            ],
            BridgeError::File { .. } => vec![
                "Check file exists and is readable",
                "Check directory permissions for log output",
            ],
            BridgeError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Compare values against the documented defaults",
            ],
            BridgeError::Http { .. } => vec![
                "Check the listen address is not already in use",
                "Choose a different port in the http section",
            ],
            BridgeError::Timeout { .. } => vec![
                "Increase timeout duration",
                "Verify the apparatus is transmitting",
            ],
        }
    }

    /// Helper constructor for a serial device that could not be opened.
    pub fn device_unavailable(port: impl Into<String>, reason: impl Into<String>) -> Self {
        BridgeError::Device { port: port.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for a serial device error with its source.
    pub fn device_unavailable_with_source(
        port: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        BridgeError::Device { port: port.into(), reason: source.to_string(), source: Some(source) }
    }

    /// Helper constructor for a byte source failing after it was opened.
    pub fn device_lost(reason: impl Into<String>, source: std::io::Error) -> Self {
        BridgeError::DeviceLost { reason: reason.into(), source }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        BridgeError::File { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        BridgeError::Config { reason: reason.into() }
    }

    /// Helper constructor for status endpoint errors.
    pub fn http(
        reason: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        BridgeError::Http { reason: reason.into(), source }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

/// Why a complete frame produced no message.
///
/// Neither case is fatal. The ingest loop logs it and moves on to the next frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The frame matched none of the known layouts.
    #[error("Unrecognized frame ({len} bytes): {sanitized}")]
    MalformedFrame { len: usize, sanitized: String },

    /// The frame matched a layout but a field could not be extracted.
    #[error("Failed to extract {field} from {variant} frame: {reason}")]
    DecodeFault { variant: Variant, field: &'static str, reason: String },
}

impl DecodeError {
    /// The variant this error is attributed to.
    ///
    /// Malformed frames report [`Variant::Unknown`].
    pub fn variant(&self) -> Variant {
        match self {
            DecodeError::MalformedFrame { .. } => Variant::Unknown,
            DecodeError::DecodeFault { variant, .. } => *variant,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, DecodeError::DecodeFault { .. })
    }
}
