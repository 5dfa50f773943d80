//! Point-in-time view of all decoded state

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::{Field, FieldSet, FieldValue, Variant};

/// Snapshot key for the lights message counter
pub const LIGHTS_COUNTER_KEY: &str = "m1_msg_counter";
/// Snapshot key for the timer message counter
pub const TIMER_COUNTER_KEY: &str = "m2_msg_counter";
/// Snapshot key for the competitor stats message counter
pub const COMPETITOR_COUNTER_KEY: &str = "m3_msg_counter";

/// Per-variant message counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub lights: u64,
    pub timer: u64,
    pub competitor_stats: u64,
}

impl Counters {
    /// Count one merged message. Uncounted variants are ignored.
    pub fn record(&mut self, variant: Variant) {
        match variant {
            Variant::Lights => self.lights += 1,
            Variant::Timer => self.timer += 1,
            Variant::CompetitorStats => self.competitor_stats += 1,
            Variant::PisteStatus | Variant::Unknown => {}
        }
    }

    pub fn get(&self, variant: Variant) -> Option<u64> {
        match variant {
            Variant::Lights => Some(self.lights),
            Variant::Timer => Some(self.timer),
            Variant::CompetitorStats => Some(self.competitor_stats),
            Variant::PisteStatus | Variant::Unknown => None,
        }
    }

    /// Counters in presentation order, keyed as they appear in the snapshot
    pub fn entries(&self) -> [(&'static str, u64); 3] {
        [
            (LIGHTS_COUNTER_KEY, self.lights),
            (TIMER_COUNTER_KEY, self.timer),
            (COMPETITOR_COUNTER_KEY, self.competitor_stats),
        ]
    }
}

/// Accumulated decoded state
///
/// Fields keep the order in which they were first seen. A later message
/// overwrites same-named fields in place; fields are never removed.
///
/// Serializes as one flat JSON object: the three counters first, then every
/// field in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub counters: Counters,
    fields: FieldSet,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one decoded message into this snapshot.
    pub fn apply(&mut self, variant: Variant, fields: &FieldSet) {
        for field in fields {
            self.fields.insert(field.name, field.value.clone());
        }
        self.counters.record(variant);
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn iter_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.fields.len()))?;
        for (key, count) in self.counters.entries() {
            map.serialize_entry(key, &count)?;
        }
        for field in &self.fields {
            map.serialize_entry(field.name, &field.value)?;
        }
        map.end()
    }
}
