//! Stream utilities for snapshot subscribers

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
