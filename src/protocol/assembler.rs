//! Frame recovery from a continuous byte stream
//!
//! A frame opens on [`START_MARKER`] and closes on [`END_MARKER`]. Bytes seen
//! while idle are ignored. A start marker seen mid-frame restarts framing and
//! silently drops the partial frame; the drop is counted and logged so a
//! glitching device shows up in diagnostics. A frame that has not closed within
//! the timeout (measured from its start marker) is discarded.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::types::{END_MARKER, Frame, MAX_KNOWN_FRAME_LEN, START_MARKER};

/// Default time allowed between a start marker and its end marker
pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// Framing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// Waiting for a start marker
    Idle,
    /// Collecting bytes of a frame that began at `started`
    Assembling { started: Instant },
}

/// Running totals of framing outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Complete frames emitted
    pub frames: u64,
    /// Partial frames dropped because a new start marker arrived
    pub restarts: u64,
    /// Partial frames dropped because they outlived the timeout
    pub timeouts: u64,
    /// Bytes ignored while idle
    pub ignored_bytes: u64,
}

/// Byte-at-a-time frame state machine
#[derive(Debug)]
pub struct FrameAssembler {
    state: AssemblerState,
    buffer: Vec<u8>,
    timeout: Duration,
    stats: AssemblerStats,
}

impl FrameAssembler {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: AssemblerState::Idle,
            buffer: Vec::with_capacity(MAX_KNOWN_FRAME_LEN),
            timeout,
            stats: AssemblerStats::default(),
        }
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == AssemblerState::Idle
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Feed one byte received at `now`.
    ///
    /// Returns the completed frame when `byte` is an end marker closing a live
    /// frame. An expired partial frame is discarded before `byte` is applied.
    pub fn push(&mut self, byte: u8, now: Instant) -> Option<Frame> {
        self.expire(now);

        if byte == START_MARKER {
            if !self.is_idle() {
                self.stats.restarts += 1;
                debug!("Start marker mid-frame, dropping {} buffered bytes", self.buffer.len());
            }
            self.buffer.clear();
            self.buffer.push(byte);
            self.state = AssemblerState::Assembling { started: now };
            return None;
        }

        if self.is_idle() {
            self.stats.ignored_bytes += 1;
            return None;
        }

        self.buffer.push(byte);
        if byte != END_MARKER {
            return None;
        }

        self.state = AssemblerState::Idle;
        self.stats.frames += 1;
        let data = std::mem::replace(&mut self.buffer, Vec::with_capacity(MAX_KNOWN_FRAME_LEN));
        Some(Frame::new(data, self.stats.frames))
    }

    /// Discard the partial frame if it has outlived the timeout.
    ///
    /// Returns `true` when a partial frame was dropped.
    pub fn expire(&mut self, now: Instant) -> bool {
        let AssemblerState::Assembling { started } = self.state else {
            return false;
        };
        if now.saturating_duration_since(started) <= self.timeout {
            return false;
        }

        debug!(
            "Frame timed out after {:?}, dropping {} buffered bytes",
            self.timeout,
            self.buffer.len()
        );
        self.buffer.clear();
        self.state = AssemblerState::Idle;
        self.stats.timeouts += 1;
        true
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_TIMEOUT)
    }
}
