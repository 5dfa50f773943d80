//! Core types for decoded apparatus data.
//!
//! - [`Frame`] is one complete marker-delimited message as read off the wire
//! - [`Variant`] classifies a frame; [`TimerStatus`] interprets the timer state byte
//! - [`FieldValue`] / [`FieldSet`] hold what the decoder extracted, verbatim
//! - [`Snapshot`] is the accumulated state served to readers
//!
//! ## Usage Example
//!
//! ```rust
//! use piste_bridge::types::{FieldSet, FieldValue, Snapshot, Variant};
//!
//! let mut fields = FieldSet::new();
//! fields.insert("m1_lights", FieldValue::Window("R1G0W0w0".to_string()));
//!
//! let mut snapshot = Snapshot::new();
//! snapshot.apply(Variant::Lights, &fields);
//!
//! assert_eq!(snapshot.counters.lights, 1);
//! assert!(snapshot.to_json().unwrap().contains("R1G0W0w0"));
//! ```

mod field;
mod frame;
mod snapshot;
mod update_rate;
mod variant;

pub use field::{Field, FieldSet, FieldValue};
pub use frame::{END_MARKER, Frame, MAX_KNOWN_FRAME_LEN, START_MARKER};
pub use snapshot::{
    COMPETITOR_COUNTER_KEY, Counters, LIGHTS_COUNTER_KEY, Snapshot, TIMER_COUNTER_KEY,
};
pub use update_rate::UpdateRate;
pub use variant::{TimerStatus, Variant};
