//! Replay provider for raw captures and in-memory streams

use std::path::Path;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::provider::Provider;
use crate::{BridgeError, Result};

/// Default bound on a single read
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Replay provider over any async byte reader
///
/// Typically a raw capture of the serial line saved to a file, or one end of a
/// `tokio::io::duplex` pipe in tests. End of input ends the stream.
pub struct ReplayProvider {
    /// Byte source
    reader: Pin<Box<dyn AsyncRead + Send>>,

    /// Name for logs
    name: String,

    /// Upper bound on a single read
    poll_interval: Duration,

    /// Largest chunk handed out per read
    chunk_size: usize,

    /// Optional pacing between chunks
    pacing: Option<Interval>,

    /// Total bytes handed out
    bytes_read: u64,
}

impl ReplayProvider {
    /// Open a raw capture file
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| BridgeError::file_error(path.to_path_buf(), e))?;

        info!("Opened capture file: {}", path.display());

        Ok(Self::from_reader(file, path.display().to_string()))
    }

    /// Wrap an arbitrary reader
    pub fn from_reader<R>(reader: R, name: impl Into<String>) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self {
            reader: Box::pin(reader),
            name: name.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            chunk_size: usize::MAX,
            pacing: None,
            bytes_read: 0,
        }
    }

    /// Set the bound on a single read
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Hand out at most `chunk_size` bytes per chunk, one chunk per `period`
    ///
    /// Approximates the device's own pacing when replaying a capture.
    pub fn with_pacing(mut self, chunk_size: usize, period: Duration) -> Self {
        let mut pacing = interval(period);
        pacing.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.chunk_size = chunk_size.max(1);
        self.pacing = Some(pacing);
        debug!("Replay pacing set to {} bytes every {:?}", self.chunk_size, period);
        self
    }

    /// Total bytes read so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

#[async_trait::async_trait]
impl Provider for ReplayProvider {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        if let Some(pacing) = self.pacing.as_mut() {
            pacing.tick().await;
        }

        let limit = buf.len().min(self.chunk_size);
        let read = tokio::time::timeout(self.poll_interval, self.reader.read(&mut buf[..limit]));

        match read.await {
            Err(_elapsed) => Ok(Some(0)),
            Ok(Ok(0)) if limit > 0 => {
                debug!("Reached end of {} after {} bytes", self.name, self.bytes_read);
                Ok(None)
            }
            Ok(Ok(n)) => {
                self.bytes_read += n as u64;
                trace!("Replayed {} bytes from {}", n, self.name);
                Ok(Some(n))
            }
            Ok(Err(e)) => {
                Err(BridgeError::device_lost(format!("read from {} failed", self.name), e))
            }
        }
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
