//! Bridge from a fencing-piste scoring apparatus to a polled JSON snapshot.
//!
//! The apparatus streams short marker-delimited frames over a serial line:
//! lights, the bout clock, competitor scores and cards, and a piste status
//! word. This crate recovers those frames, decodes them into named fields, and
//! keeps a single accumulated snapshot that scoreboards and overlays can read
//! at any time.
//!
//! # Features
//!
//! - **Frame recovery**: restart on a repeated start marker, drop frames that
//!   stall past the timeout
//! - **Declarative layouts**: each message shape is a table of offsets and
//!   expected bytes
//! - **Consistent reads**: a snapshot always reflects whole messages
//! - **Status endpoint**: `GET /data.json` over HTTP
//!
//! ## Example (capture replay)
//!
//! ```rust,no_run
//! use piste_bridge::{IngestOptions, PisteBridge, UpdateRate};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> piste_bridge::Result<()> {
//!     let connection = PisteBridge::replay("bout.bin", IngestOptions::default()).await?;
//!     let mut updates = connection.updates(UpdateRate::Max(10));
//!
//!     while let Some(snapshot) = updates.next().await {
//!         println!("{}", snapshot.to_json().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire protocol
pub mod protocol;

// Ingestion and state
pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod driver;
pub mod provider;
pub mod providers;
pub mod state;
pub mod stream;

// Outer surface
pub mod http;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use config::BridgeConfig;
pub use connection::PisteConnection;
pub use driver::{IngestOptions, IngestStats, Ingestor};
pub use http::{StatusServerHandle, spawn_status_server};
pub use protocol::{FrameAssembler, Message, decode};
pub use provider::Provider;
pub use state::{SharedState, StateReader};

/// Unified entry point for bridge connections.
///
/// # Examples
///
/// ## Serial apparatus
/// ```rust,no_run
/// use piste_bridge::{BridgeConfig, PisteBridge};
///
/// #[tokio::main]
/// async fn main() -> piste_bridge::Result<()> {
///     let config = BridgeConfig::load("bridge.yaml")?;
///     let connection = PisteBridge::connect(&config).await?;
///     println!("{:?}", connection.snapshot());
///     Ok(())
/// }
/// ```
pub struct PisteBridge;

impl PisteBridge {
    /// Open the configured serial device and start ingesting.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the device cannot
    /// be opened. Read failures after that are handled by the ingest task.
    pub async fn connect(config: &BridgeConfig) -> Result<PisteConnection> {
        PisteConnection::connect(config).await
    }

    /// Replay a raw byte capture as if it came from the apparatus.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub async fn replay<P: AsRef<std::path::Path>>(
        path: P,
        options: IngestOptions,
    ) -> Result<PisteConnection> {
        PisteConnection::replay(path, options).await
    }
}
