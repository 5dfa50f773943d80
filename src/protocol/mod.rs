//! Wire protocol of the scoring apparatus.
//!
//! The apparatus streams marker-delimited frames over a serial line:
//!
//! ```text
//! device bytes -> FrameAssembler -> Frame -> decode -> Message
//! ```
//!
//! - [`FrameAssembler`] recovers frames from the byte stream and enforces the
//!   per-frame timeout.
//! - [`decode`] classifies a frame against the fixed layouts in [`schema`] and
//!   extracts its fields.
//!
//! ## Example
//!
//! ```rust
//! use piste_bridge::protocol::{FrameAssembler, decode};
//! use piste_bridge::types::Variant;
//! use tokio::time::Instant;
//!
//! let bytes = [0x01, 0x14, b'R', b'1', b'G', b'0', b'W', b'1', b'w', b'0', 0x04];
//! let mut assembler = FrameAssembler::default();
//! let now = Instant::now();
//!
//! let frame = bytes.iter().find_map(|&b| assembler.push(b, now)).unwrap();
//! let message = decode(frame.as_bytes()).unwrap();
//! assert_eq!(message.variant, Variant::Lights);
//! ```

mod assembler;
mod decoder;
pub mod schema;

pub use assembler::{AssemblerState, AssemblerStats, DEFAULT_FRAME_TIMEOUT, FrameAssembler};
pub use decoder::{Message, classify, decode, sanitize};
