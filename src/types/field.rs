//! Decoded field values
//!
//! Every value the decoder extracts is kept verbatim. The only thing recorded
//! beyond the text is *how* it was extracted, so presentation layers can decide
//! whether to make surrounding whitespace visible.

use serde::{Serialize, Serializer};
use std::fmt;

/// A single decoded value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Contiguous byte window, stored as decoded text
    Window(String),
    /// One byte interpreted as a character
    Char(char),
    /// Several single bytes from scattered offsets, concatenated
    Chars(String),
}

impl FieldValue {
    /// The value as plain text, with no markers applied
    pub fn text(&self) -> String {
        match self {
            FieldValue::Window(s) | FieldValue::Chars(s) => s.clone(),
            FieldValue::Char(c) => c.to_string(),
        }
    }

    /// Rendering for diagnostic output.
    ///
    /// Window values are wrapped in `>>>`/`<<<` so leading and trailing spaces
    /// in fixed-width device fields stay visible.
    pub fn diagnostic(&self) -> String {
        match self {
            FieldValue::Window(s) => format!(">>>{}<<<", s),
            other => other.text(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Window(s) | FieldValue::Chars(s) => f.write_str(s),
            FieldValue::Char(c) => write!(f, "{}", c),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Window(s) | FieldValue::Chars(s) => serializer.serialize_str(s),
            FieldValue::Char(c) => serializer.serialize_char(*c),
        }
    }
}

/// A named value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub value: FieldValue,
}

/// Ordered set of fields produced by one decode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<Field>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { fields: Vec::with_capacity(capacity) }
    }

    /// Set a field, replacing an earlier value of the same name in place.
    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.value = value,
            None => self.fields.push(Field { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut set = FieldSet::new();
        set.insert("a", FieldValue::Char('1'));
        set.insert("b", FieldValue::Char('2'));
        set.insert("a", FieldValue::Char('3'));

        let names: Vec<_> = set.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(set.get("a"), Some(&FieldValue::Char('3')));
    }

    #[test]
    fn diagnostic_marks_windows_only() {
        assert_eq!(FieldValue::Window(" 1:30 ".into()).diagnostic(), ">>> 1:30 <<<");
        assert_eq!(FieldValue::Char('R').diagnostic(), "R");
        assert_eq!(FieldValue::Chars("0100".into()).diagnostic(), "0100");
    }

    #[test]
    fn serializes_as_plain_strings() {
        let window = serde_json::to_string(&FieldValue::Window("R1G0W1w0".into())).unwrap();
        let single = serde_json::to_string(&FieldValue::Char('R')).unwrap();
        assert_eq!(window, "\"R1G0W1w0\"");
        assert_eq!(single, "\"R\"");
    }
}
