//! Fixed-offset layouts of the known apparatus messages
//!
//! Each layout is data: a total length, the discriminant bytes that must match,
//! and the fields to pull out. The decoder walks [`SCHEMAS`] in order and the
//! first layout whose length and checks all match wins.
//!
//! Offsets count from the start marker at index 0. They are fixed by the
//! apparatus firmware.
//!
//! ```text
//! Lights           [SOH][DC4]R x G x W x w x[EOT]                          11
//! Timer            [SOH][DC3]Z[STX]MM:SS.DC[EOT]                           13
//! CompetitorStats  [SOH][DC3]D[STX]XX:YY[STX]AABBb[STX]CCDDd[STX]P[STX]R[STX]vW[EOT]  29
//! PisteStatus      [SOH][DC3]I[STX]M[STX]W[STX]S[STX]N[EOT]                12
//! ```

use crate::types::{TimerStatus, Variant};

/// Message-class byte for lights frames (DC4)
pub const LIGHTS_CLASS: u8 = 0x14;
/// Message-class byte shared by all other frames (DC3)
pub const DATA_CLASS: u8 = 0x13;
/// Separator between sub-fields (STX)
pub const FIELD_SEPARATOR: u8 = 0x02;

/// What a discriminant byte must be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Byte(u8),
    OneOf(&'static [u8]),
}

impl Expect {
    pub fn matches(self, byte: u8) -> bool {
        match self {
            Expect::Byte(expected) => byte == expected,
            Expect::OneOf(set) => set.contains(&byte),
        }
    }
}

/// A discriminant check at a fixed offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Check {
    pub offset: usize,
    pub expect: Expect,
}

/// How a field is taken from the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// Bytes `start..end`, decoded as text
    Window { start: usize, end: usize },
    /// The byte at `offset` as a character
    Char(usize),
    /// Single bytes at each offset, concatenated
    Chars(&'static [usize]),
}

/// A named field and where to find it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub extract: Extract,
}

/// One message layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub variant: Variant,
    pub len: usize,
    pub checks: &'static [Check],
    pub fields: &'static [FieldSpec],
}

impl Schema {
    /// Whether `frame` has this layout's length and discriminant bytes
    pub fn matches(&self, frame: &[u8]) -> bool {
        frame.len() == self.len
            && self
                .checks
                .iter()
                .all(|check| frame.get(check.offset).is_some_and(|&b| check.expect.matches(b)))
    }
}

const fn byte(offset: usize, value: u8) -> Check {
    Check { offset, expect: Expect::Byte(value) }
}

const fn one_of(offset: usize, set: &'static [u8]) -> Check {
    Check { offset, expect: Expect::OneOf(set) }
}

const fn window(name: &'static str, start: usize, end: usize) -> FieldSpec {
    FieldSpec { name, extract: Extract::Window { start, end } }
}

const fn single(name: &'static str, offset: usize) -> FieldSpec {
    FieldSpec { name, extract: Extract::Char(offset) }
}

pub const LIGHTS: Schema = Schema {
    variant: Variant::Lights,
    len: 11,
    checks: &[byte(1, LIGHTS_CLASS), byte(2, b'R'), byte(4, b'G'), byte(6, b'W'), byte(8, b'w')],
    fields: &[window("m1_lights", 2, 10)],
};

pub const TIMER: Schema = Schema {
    variant: Variant::Timer,
    len: 13,
    checks: &[
        byte(1, DATA_CLASS),
        one_of(2, TimerStatus::CODES),
        byte(3, FIELD_SEPARATOR),
        byte(6, b':'),
        one_of(9, b" ."),
    ],
    fields: &[single("m2_timer_status", 2), window("m2_timer_mmssdc", 4, 12)],
};

pub const COMPETITOR_STATS: Schema = Schema {
    variant: Variant::CompetitorStats,
    len: 29,
    checks: &[
        byte(1, DATA_CLASS),
        byte(2, b'D'),
        byte(3, FIELD_SEPARATOR),
        byte(6, b':'),
        byte(9, FIELD_SEPARATOR),
        byte(15, FIELD_SEPARATOR),
        byte(21, FIELD_SEPARATOR),
        byte(23, FIELD_SEPARATOR),
        byte(25, FIELD_SEPARATOR),
    ],
    fields: &[
        window("m3_score", 4, 9),
        window("m3_YRB_right", 10, 15),
        window("m3_YRB_left", 16, 21),
        single("m3_priority", 22),
        // '0' means the scoreboard display is off
        single("m3_period", 24),
        window("m3_video_requests", 26, 28),
    ],
};

pub const PISTE_STATUS: Schema = Schema {
    variant: Variant::PisteStatus,
    len: 12,
    checks: &[
        byte(1, DATA_CLASS),
        byte(2, b'I'),
        byte(3, FIELD_SEPARATOR),
        byte(5, FIELD_SEPARATOR),
        byte(7, FIELD_SEPARATOR),
        byte(9, FIELD_SEPARATOR),
    ],
    fields: &[FieldSpec { name: "m4_raw_str", extract: Extract::Chars(&[4, 6, 8, 10]) }],
};

/// All known layouts in classification priority order
pub static SCHEMAS: [Schema; 4] = [LIGHTS, TIMER, COMPETITOR_STATS, PISTE_STATUS];

/// The first layout matching `frame`, if any
pub fn find_schema(frame: &[u8]) -> Option<&'static Schema> {
    SCHEMAS.iter().find(|schema| schema.matches(frame))
}
