//! Running bridge connection
//!
//! A [`PisteConnection`] owns the ingest task for one byte source and hands out
//! read access to the decoded state. Dropping it cancels ingestion.

use futures::{Stream, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::driver::{IngestOptions, IngestStats, Ingestor};
use crate::provider::Provider;
use crate::providers::{ReplayProvider, SerialProvider};
use crate::state::StateReader;
use crate::stream::ThrottleExt;
use crate::types::{Snapshot, UpdateRate};
use crate::Result;


/// Connection to a byte source with ingestion running in the background
pub struct PisteConnection {
    /// Read side of the decoded state
    state: StateReader,

    /// Name of the byte source
    source: String,

    /// Cancellation token for stopping the ingest task
    cancel: CancellationToken,

    /// Ingest task, taken on shutdown
    task: Option<JoinHandle<IngestStats>>,
}

impl PisteConnection {
    /// Open the configured serial device and start ingesting.
    ///
    /// Fails if the device cannot be opened.
    pub async fn connect(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;
        info!("Connecting to apparatus on {}", config.serial.port);

        let provider = SerialProvider::open(&config.serial)?;
        Ok(Self::from_provider(provider, IngestOptions::from(config)))
    }

    /// Replay a raw capture file.
    pub async fn replay<P: AsRef<Path>>(path: P, options: IngestOptions) -> Result<Self> {
        let provider = ReplayProvider::open(path).await?;
        Ok(Self::from_provider(provider, options))
    }

    /// Start ingesting from any provider.
    pub fn from_provider<P: Provider>(provider: P, options: IngestOptions) -> Self {
        let source = provider.describe();
        let handle = Ingestor::spawn(provider, options);
        debug!("Ingest task spawned for {}", source);

        Self { state: handle.state, source, cancel: handle.cancel, task: Some(handle.task) }
    }

    /// Current decoded state
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.snapshot()
    }

    /// A cloneable read-only handle, e.g. for the status endpoint
    pub fn reader(&self) -> StateReader {
        self.state.clone()
    }

    /// State changes as a stream, starting with the current state.
    ///
    /// With [`UpdateRate::Max`] bursts of merges collapse to the latest
    /// snapshot. Must be called within a Tokio runtime.
    pub fn updates(&self, rate: UpdateRate) -> impl Stream<Item = Arc<Snapshot>> + 'static {
        let snapshots = self.state.stream();
        match rate.throttle_interval() {
            None => snapshots.boxed(),
            Some(period) => snapshots.throttle(period).boxed(),
        }
    }

    /// Token that stops ingestion when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the ingest task has ended (source closed, failed, or cancelled)
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Wait for the ingest task to end on its own, without cancelling it.
    pub async fn join(&mut self) -> Option<IngestStats> {
        let task = self.task.take()?;
        match task.await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("Ingest task failed: {}", e);
                None
            }
        }
    }

    /// Stop ingestion and wait for the task to finish.
    pub async fn shutdown(mut self) -> Option<IngestStats> {
        info!("Shutting down connection to {}", self.source);
        self.cancel.cancel();
        self.join().await
    }
}

impl Drop for PisteConnection {
    fn drop(&mut self) {
        debug!("Dropping connection to {}", self.source);
        self.cancel.cancel();
    }
}
