//! Frame builders shared by unit tests and benchmarks
//!
//! Each builder produces the exact byte layout the apparatus sends, markers
//! included, so tests can feed them straight into an assembler or provider.

#![cfg(any(test, feature = "benchmark"))]

use crate::protocol::schema::{DATA_CLASS, FIELD_SEPARATOR, LIGHTS_CLASS};
use crate::types::{END_MARKER, START_MARKER};

/// `[SOH][DC4]` + 8-byte lights window + `[EOT]`
pub fn lights_frame(window: &[u8; 8]) -> Vec<u8> {
    let mut frame = vec![START_MARKER, LIGHTS_CLASS];
    frame.extend_from_slice(window);
    frame.push(END_MARKER);
    frame
}

/// `[SOH][DC3]` + status + `[STX]` + 8-byte clock + `[EOT]`
pub fn timer_frame(status: u8, clock: &[u8; 8]) -> Vec<u8> {
    let mut frame = vec![START_MARKER, DATA_CLASS, status, FIELD_SEPARATOR];
    frame.extend_from_slice(clock);
    frame.push(END_MARKER);
    frame
}

/// The 29-byte competitor statistics layout
pub fn competitor_frame(
    score: &[u8; 5],
    right: &[u8; 5],
    left: &[u8; 5],
    priority: u8,
    period: u8,
    video: &[u8; 2],
) -> Vec<u8> {
    let mut frame = vec![START_MARKER, DATA_CLASS, b'D', FIELD_SEPARATOR];
    frame.extend_from_slice(score);
    frame.push(FIELD_SEPARATOR);
    frame.extend_from_slice(right);
    frame.push(FIELD_SEPARATOR);
    frame.extend_from_slice(left);
    frame.extend_from_slice(&[FIELD_SEPARATOR, priority, FIELD_SEPARATOR, period, FIELD_SEPARATOR]);
    frame.extend_from_slice(video);
    frame.push(END_MARKER);
    frame
}

/// `[SOH][DC3]I` followed by four separated status characters
pub fn piste_status_frame(chars: [u8; 4]) -> Vec<u8> {
    let mut frame = vec![START_MARKER, DATA_CLASS, b'I'];
    for c in chars {
        frame.push(FIELD_SEPARATOR);
        frame.push(c);
    }
    frame.push(END_MARKER);
    frame
}

/// A mixed stream of every known message with noise between frames
pub fn sample_bout(rounds: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for round in 0..rounds {
        let tenth = b'0' + (round % 10) as u8;
        stream.extend(lights_frame(b"R1G0W0w1"));
        stream.extend_from_slice(&[0x00, 0xFF]);
        stream.extend(timer_frame(b'R', &[b'0', b'2', b':', b'5', b'9', b'.', tenth, b' ']));
        stream.extend(competitor_frame(b"03:04", b"10000", b"00100", b'R', b'2', b"01"));
        stream.extend(piste_status_frame(*b"1A0N"));
    }
    stream
}
