//! Complete frames as recovered from the byte stream

use std::sync::Arc;

/// Start-of-frame marker (SOH)
pub const START_MARKER: u8 = 0x01;

/// End-of-frame marker (EOT)
pub const END_MARKER: u8 = 0x04;

/// Length of the longest known message (competitor stats)
pub const MAX_KNOWN_FRAME_LEN: usize = 29;

/// One complete frame, start and end markers included
///
/// Cloning is cheap; the bytes are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw frame bytes
    pub data: Arc<[u8]>,

    /// Monotonic frame counter assigned by the assembler
    pub sequence: u64,
}

impl Frame {
    /// Create a new frame
    pub fn new(data: Vec<u8>, sequence: u64) -> Self {
        Self { data: data.into(), sequence }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
