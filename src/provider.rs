//! Provider trait for byte sources

use crate::Result;

/// Trait for apparatus byte sources
///
/// Providers abstract over where bytes come from (serial device, capture file,
/// in-memory pipe) and bound every read by their own poll interval, so the
/// ingest loop regains control regularly even when the device is silent.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Read the next chunk of bytes into `buf`
    ///
    /// Returns:
    /// - `Ok(Some(n))` with `n > 0` - `n` bytes were read into `buf`
    /// - `Ok(Some(0))` - the poll interval elapsed with no data
    /// - `Ok(None)` - the source ended (normal termination)
    /// - `Err(e)` - the source failed
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Short human readable name for logs (port name, file name)
    fn describe(&self) -> String;
}
