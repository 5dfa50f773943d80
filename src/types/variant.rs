//! Message variants and the timer status carried by timer frames

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified message type of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Scoring lights (red, green, white, white)
    Lights,
    /// Match clock and its running state
    Timer,
    /// Score, cards, priority, period and video requests
    CompetitorStats,
    /// Apparatus status flags with no confirmed meaning
    PisteStatus,
    /// Anything that matched none of the known layouts
    Unknown,
}

impl Variant {
    /// Variants that carry their own message counter in the snapshot.
    ///
    /// `PisteStatus` updates a field but is deliberately not counted.
    pub fn is_counted(self) -> bool {
        matches!(self, Variant::Lights | Variant::Timer | Variant::CompetitorStats)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Lights => "Lights",
            Variant::Timer => "Timer",
            Variant::CompetitorStats => "CompetitorStats",
            Variant::PisteStatus => "PisteStatus",
            Variant::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the match clock is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerStatus {
    /// `R`
    Running,
    /// `N`: clock stopped
    Net,
    /// `J`
    Injury,
    /// `B`
    Break,
}

impl TimerStatus {
    /// Status bytes accepted at offset 2 of a timer frame.
    pub const CODES: &'static [u8] = b"RNJB";

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'R' => Some(TimerStatus::Running),
            b'N' => Some(TimerStatus::Net),
            b'J' => Some(TimerStatus::Injury),
            b'B' => Some(TimerStatus::Break),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            TimerStatus::Running => 'R',
            TimerStatus::Net => 'N',
            TimerStatus::Injury => 'J',
            TimerStatus::Break => 'B',
        }
    }

    /// Human readable label as shown on the scoreboard console
    pub fn label(self) -> &'static str {
        match self {
            TimerStatus::Running => "Running Time",
            TimerStatus::Net => "Net Time (Time Stopped)",
            TimerStatus::Injury => "Injury Time",
            TimerStatus::Break => "Break Time",
        }
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
