//! Shared decoded state
//!
//! The ingest task is the only writer; any number of readers take snapshots.
//! State lives in a watch channel holding an `Arc<Snapshot>`. A merge runs
//! entirely inside the channel's write lock and copies the snapshot first if a
//! reader still holds the previous one, so a reader either sees all fields of a
//! merge or none of them. Taking a snapshot is an `Arc` clone under the read
//! lock.

use futures::Stream;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::trace;

use crate::types::{FieldSet, Snapshot, Variant};

/// Writer side of the decoded state
#[derive(Debug)]
pub struct SharedState {
    tx: watch::Sender<Arc<Snapshot>>,
}

impl SharedState {
    /// Empty state with all counters at zero
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Snapshot::new()));
        Self { tx }
    }

    /// Apply one decoded message as a single indivisible update.
    ///
    /// `Unknown` carries no state and is ignored.
    pub fn merge(&self, variant: Variant, fields: &FieldSet) {
        if variant == Variant::Unknown {
            return;
        }
        self.tx.send_modify(|current| {
            Arc::make_mut(current).apply(variant, fields);
        });
        trace!("Merged {} ({} fields)", variant, fields.len());
    }

    /// Current state
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.tx.borrow())
    }

    /// A cloneable read-only handle
    pub fn reader(&self) -> StateReader {
        StateReader { rx: self.tx.subscribe() }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only handle to the decoded state
#[derive(Debug, Clone)]
pub struct StateReader {
    rx: watch::Receiver<Arc<Snapshot>>,
}

impl StateReader {
    /// Current state
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.rx.borrow())
    }

    /// Wait for the next merge.
    ///
    /// Returns `None` once the writer is gone.
    pub async fn changed(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.changed().await.ok()?;
        Some(Arc::clone(&self.rx.borrow_and_update()))
    }

    /// Every state change as a stream, starting with the current state
    pub fn stream(&self) -> impl Stream<Item = Arc<Snapshot>> + 'static {
        WatchStream::new(self.rx.clone())
    }
}
