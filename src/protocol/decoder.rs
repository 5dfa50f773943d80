//! Frame classification and field extraction
//!
//! [`decode`] is a pure function of the frame bytes. It never panics: a frame
//! that matches no layout is a [`DecodeError::MalformedFrame`], and a frame that
//! matches a layout but has a field that will not decode is a
//! [`DecodeError::DecodeFault`].

use std::fmt::Write as _;

use super::schema::{Extract, FieldSpec, Schema, find_schema};
use crate::error::DecodeError;
use crate::types::{FieldSet, FieldValue, TimerStatus, Variant};

/// A decoded, state-bearing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub variant: Variant,
    pub fields: FieldSet,
}

impl Message {
    /// Timer state for timer messages
    pub fn timer_status(&self) -> Option<TimerStatus> {
        if self.variant != Variant::Timer {
            return None;
        }
        match self.fields.get("m2_timer_status") {
            Some(FieldValue::Char(c)) => u8::try_from(*c).ok().and_then(TimerStatus::from_code),
            _ => None,
        }
    }
}

/// Classify a frame without extracting fields
pub fn classify(frame: &[u8]) -> Variant {
    find_schema(frame).map_or(Variant::Unknown, |schema| schema.variant)
}

/// Decode one complete frame, start and end markers included
pub fn decode(frame: &[u8]) -> Result<Message, DecodeError> {
    let Some(schema) = find_schema(frame) else {
        return Err(DecodeError::MalformedFrame { len: frame.len(), sanitized: sanitize(frame) });
    };
    extract_fields(schema, frame)
}

fn extract_fields(schema: &Schema, frame: &[u8]) -> Result<Message, DecodeError> {
    let mut fields = FieldSet::with_capacity(schema.fields.len());
    for spec in schema.fields {
        let value = extract(spec, frame).map_err(|reason| DecodeError::DecodeFault {
            variant: schema.variant,
            field: spec.name,
            reason,
        })?;
        fields.insert(spec.name, value);
    }
    Ok(Message { variant: schema.variant, fields })
}

fn extract(spec: &FieldSpec, frame: &[u8]) -> Result<FieldValue, String> {
    let byte_at = |offset: usize| {
        frame
            .get(offset)
            .copied()
            .ok_or_else(|| format!("offset {} beyond frame of {} bytes", offset, frame.len()))
    };

    match spec.extract {
        Extract::Window { start, end } => {
            let bytes = frame.get(start..end).ok_or_else(|| {
                format!("window {}..{} beyond frame of {} bytes", start, end, frame.len())
            })?;
            let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
            Ok(FieldValue::Window(text.to_owned()))
        }
        Extract::Char(offset) => Ok(FieldValue::Char(char::from(byte_at(offset)?))),
        Extract::Chars(offsets) => {
            let mut text = String::with_capacity(offsets.len());
            for &offset in offsets {
                text.push(char::from(byte_at(offset)?));
            }
            Ok(FieldValue::Chars(text))
        }
    }
}

/// Printable rendering of arbitrary frame bytes for logs.
///
/// Control bytes (below 0x20) become `_`; bytes from 0x7F up are shown as
/// `\xNN`. The result never contains a byte below 0x20.
pub fn sanitize(frame: &[u8]) -> String {
    let mut out = String::with_capacity(frame.len());
    for &b in frame {
        match b {
            0x00..=0x1F => out.push('_'),
            0x20..=0x7E => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\x{:02X}", b);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{competitor_frame, lights_frame, piste_status_frame, timer_frame};
    use proptest::prelude::*;

    #[test]
    fn decodes_lights() {
        let frame = [0x01, 0x14, b'R', b'1', b'G', b'0', b'W', b'1', b'w', b'0', 0x04];
        let message = decode(&frame).unwrap();

        assert_eq!(message.variant, Variant::Lights);
        assert_eq!(message.fields.get("m1_lights"), Some(&FieldValue::Window("R1G0W1w0".into())));
        assert_eq!(message.fields.len(), 1);
    }

    #[test]
    fn decodes_timer() {
        let frame = [0x01, 0x13, b'R', 0x02, b'0', b'1', b':', b'3', b'0', b'.', b'5', b' ', 0x04];
        let message = decode(&frame).unwrap();

        assert_eq!(message.variant, Variant::Timer);
        assert_eq!(message.fields.get("m2_timer_status"), Some(&FieldValue::Char('R')));
        assert_eq!(
            message.fields.get("m2_timer_mmssdc"),
            Some(&FieldValue::Window("01:30.5 ".into()))
        );
        assert_eq!(message.timer_status(), Some(TimerStatus::Running));
    }

    #[test]
    fn timer_accepts_every_status_and_both_separators() {
        for &status in TimerStatus::CODES {
            let message = decode(&timer_frame(status, b"02:59 12")).unwrap();
            assert_eq!(message.timer_status().map(|s| s.code() as u8), Some(status));

            let dotted = decode(&timer_frame(status, b"00:09.7 ")).unwrap();
            assert_eq!(dotted.variant, Variant::Timer);
        }
        assert_eq!(classify(&timer_frame(b'X', b"02:59 12")), Variant::Unknown);
        assert_eq!(classify(&timer_frame(b'R', b"02:59-12")), Variant::Unknown);
    }

    #[test]
    fn decodes_competitor_stats() {
        let frame = competitor_frame(b"05:03", b"10100", b"00010", b'R', b'2', b"01");
        assert_eq!(frame.len(), 29);

        let message = decode(&frame).unwrap();
        assert_eq!(message.variant, Variant::CompetitorStats);

        let expected = [
            ("m3_score", FieldValue::Window("05:03".into())),
            ("m3_YRB_right", FieldValue::Window("10100".into())),
            ("m3_YRB_left", FieldValue::Window("00010".into())),
            ("m3_priority", FieldValue::Char('R')),
            ("m3_period", FieldValue::Char('2')),
            ("m3_video_requests", FieldValue::Window("01".into())),
        ];
        let actual: Vec<_> = message.fields.iter().map(|f| (f.name, f.value.clone())).collect();
        assert_eq!(actual, expected.to_vec());
        assert_eq!(message.timer_status(), None);
    }

    #[test]
    fn decodes_piste_status() {
        let message = decode(&piste_status_frame(*b"1 0W")).unwrap();
        assert_eq!(message.variant, Variant::PisteStatus);
        assert_eq!(message.fields.get("m4_raw_str"), Some(&FieldValue::Chars("1 0W".into())));
    }

    #[test]
    fn unknown_frame_is_sanitized() {
        let frame = [0x01, 0x13, b'Z', 0x02, 0x04];
        match decode(&frame) {
            Err(DecodeError::MalformedFrame { len, sanitized }) => {
                assert_eq!(len, 5);
                assert_eq!(sanitized, "__Z__");
            }
            other => panic!("expected malformed frame, got {:?}", other),
        }
        assert_eq!(classify(&frame), Variant::Unknown);
    }

    #[test]
    fn right_length_wrong_discriminant_is_unknown() {
        let mut frame = lights_frame(b"R1G0W1w0");
        frame[4] = b'g';
        assert!(matches!(decode(&frame), Err(DecodeError::MalformedFrame { .. })));

        let mut frame = competitor_frame(b"05:03", b"10100", b"00010", b'R', b'2', b"01");
        frame[21] = b'x';
        assert_eq!(classify(&frame), Variant::Unknown);
    }

    #[test]
    fn invalid_text_is_a_fault() {
        let frame = lights_frame(&[b'R', 0xFF, b'G', b'0', b'W', b'1', b'w', b'0']);
        match decode(&frame) {
            Err(DecodeError::DecodeFault { variant, field, .. }) => {
                assert_eq!(variant, Variant::Lights);
                assert_eq!(field, "m1_lights");
            }
            other => panic!("expected decode fault, got {:?}", other),
        }
    }

    #[test]
    fn high_bytes_in_single_char_fields_decode() {
        let frame = competitor_frame(b"05:03", b"10100", b"00010", 0xC9, b'0', b"00");
        let message = decode(&frame).unwrap();
        assert_eq!(message.fields.get("m3_priority"), Some(&FieldValue::Char('\u{C9}')));
    }

    #[test]
    fn sanitize_escapes_high_bytes() {
        assert_eq!(sanitize(&[0x01, b'a', 0x7F, 0xFF, 0x04]), "_a\\x7F\\xFF_");
    }

    proptest! {
        #[test]
        fn decode_never_panics_and_is_pure(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let first = decode(&bytes);
            let second = decode(&bytes);
            prop_assert_eq!(&first, &second);

            match first {
                Ok(message) => prop_assert_eq!(message.variant, classify(&bytes)),
                Err(DecodeError::MalformedFrame { sanitized, .. }) => {
                    prop_assert_eq!(classify(&bytes), Variant::Unknown);
                    prop_assert!(sanitized.bytes().all(|b| b >= 0x20));
                }
                Err(DecodeError::DecodeFault { variant, .. }) => {
                    prop_assert_eq!(variant, classify(&bytes));
                }
            }
        }

        #[test]
        fn lights_window_is_verbatim(
            r in prop::sample::select(b"01".to_vec()),
            g in prop::sample::select(b"01".to_vec()),
            w in prop::sample::select(b"01".to_vec()),
            v in prop::sample::select(b"01".to_vec()),
        ) {
            let window = [b'R', r, b'G', g, b'W', w, b'w', v];
            let message = decode(&lights_frame(&window)).unwrap();
            let expected = String::from_utf8(window.to_vec()).unwrap();
            prop_assert_eq!(message.fields.get("m1_lights"), Some(&FieldValue::Window(expected)));
        }
    }
}
