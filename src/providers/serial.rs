//! Serial provider for the live apparatus

use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{info, trace};

use crate::config::SerialConfig;
use crate::provider::Provider;
use crate::{BridgeError, Result};

/// Live provider reading the apparatus serial line
pub struct SerialProvider {
    /// Open serial stream
    port: SerialStream,

    /// Port name as configured
    name: String,

    /// Upper bound on a single read
    poll_interval: Duration,
}

impl SerialProvider {
    /// Open the configured port (8N1, no flow control)
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = tokio_serial::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()
            .map_err(|e| BridgeError::device_unavailable_with_source(&config.port, Box::new(e)))?;

        info!("Opened serial port {} at {} baud", config.port, config.baud_rate);

        Ok(Self { port, name: config.port.clone(), poll_interval: config.poll_interval() })
    }
}

#[async_trait::async_trait]
impl Provider for SerialProvider {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        match tokio::time::timeout(self.poll_interval, self.port.read(buf)).await {
            Err(_elapsed) => Ok(Some(0)),
            Ok(Ok(n)) => {
                trace!("Read {} bytes from {}", n, self.name);
                Ok(Some(n))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::TimedOut => Ok(Some(0)),
            Ok(Err(e)) => {
                Err(BridgeError::device_lost(format!("read from {} failed", self.name), e))
            }
        }
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
