//! Map converter: keyed field maps and homogeneous dynamic maps.

use bytes::Bytes;
use rustc_hash::FxHashSet;

use crate::codec::list::{capacity, open, pair_slots, Elements};
use crate::codec::primitives::{Major, Reader, Writer};
use crate::codec::scalar::{read_literal, write_literal};
use crate::codec::serializer::{read_value, write_value, DecodeContext, EncodeContext};
use crate::error::{DecodeError, EncodeError};
use crate::model::parts::{Content, ContentRef, Parts, PartsRef};
use crate::model::{
    FieldKey, FieldKind, FieldSpec, IntWidth, Layout, Object, Presence, TypeOptions,
};

/// A map key as read from the wire.
#[derive(Debug, PartialEq)]
enum WireKey {
    Int(i64),
    Text(String),
    /// Any other key, kept only for error messages.
    Other(String),
}

impl WireKey {
    fn matches(&self, key: &FieldKey) -> bool {
        match (self, key) {
            (WireKey::Int(a), FieldKey::Int(b)) => a == b,
            (WireKey::Text(a), FieldKey::Text(b)) => a == b,
            _ => false,
        }
    }

    fn describe(&self) -> String {
        match self {
            WireKey::Int(n) => n.to_string(),
            WireKey::Text(s) => format!("{:?}", s),
            WireKey::Other(s) => s.clone(),
        }
    }
}

fn read_key(reader: &mut Reader, ctx: &DecodeContext) -> Result<WireKey, DecodeError> {
    let header = reader.peek_header("map key")?;
    match (header.major, header.arg) {
        (Major::Uint, Some(n)) => {
            reader.read_header("map key")?;
            Ok(i64::try_from(n).map_or_else(|_| WireKey::Other(n.to_string()), WireKey::Int))
        }
        (Major::Nint, Some(n)) => {
            reader.read_header("map key")?;
            Ok(i64::try_from(n)
                .map_or_else(|_| WireKey::Other(format!("-1-{}", n)), |n| WireKey::Int(-1 - n)))
        }
        (Major::Text, _) => {
            let header = reader.read_header("map key")?;
            let payload =
                reader.read_string_payload(&header, ctx.options.max_string_len, "map key")?;
            String::from_utf8(payload.to_vec())
                .map(WireKey::Text)
                .map_err(|_| DecodeError::InvalidUtf8 { context: "map key" })
        }
        (major, _) => {
            reader.skip_value(ctx.remaining_depth())?;
            Ok(WireKey::Other(format!("<{}>", major)))
        }
    }
}

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn read(
    reader: &mut Reader,
    options: &TypeOptions,
    ctx: &mut DecodeContext,
) -> Result<Parts, DecodeError> {
    let ty = options.name;
    let (mut elements, indefinite) = Elements::open(reader, Major::Map, options, ctx)?;
    let content = match &options.layout {
        Some(Layout::Entries { key, value }) => {
            let mut entries = Vec::with_capacity(capacity(&elements, reader));
            let mut seen: FxHashSet<Bytes> =
                FxHashSet::with_capacity_and_hasher(entries.capacity(), Default::default());
            while elements.next(reader)? {
                let start = reader.position();
                let k = read_value(reader, key, ctx)?;
                let key_bytes = reader.slice(start, reader.position());
                if !seen.insert(key_bytes.clone()) {
                    return Err(DecodeError::DuplicateKey {
                        ty,
                        key: format!("h'{}'", hex(&key_bytes)),
                    });
                }
                let v = read_value(reader, value, ctx)?;
                entries.push((k, v));
            }
            Content::Entries(entries)
        }
        Some(Layout::Fields(fields)) => {
            Content::Fields(read_fields(reader, options, fields, &mut elements, ctx)?)
        }
        _ => {
            return Err(DecodeError::UnexpectedParts {
                ty,
                expected: "map layout",
                found: "items",
            })
        }
    };
    let mut parts = Parts::new(ty, content);
    parts.style_mut().indefinite = indefinite;
    Ok(parts)
}

fn read_fields(
    reader: &mut Reader,
    options: &TypeOptions,
    fields: &[FieldSpec],
    elements: &mut Elements,
    ctx: &mut DecodeContext,
) -> Result<Vec<Option<Object>>, DecodeError> {
    let ty = options.name;
    // Slot index of each value field; literals have none.
    let mut slot_of = Vec::with_capacity(fields.len());
    let mut next_slot = 0;
    for field in fields {
        if field.is_literal() {
            slot_of.push(None);
        } else {
            slot_of.push(Some(next_slot));
            next_slot += 1;
        }
    }
    let mut slots: Vec<Option<Object>> = (0..next_slot).map(|_| None).collect();
    let mut seen = vec![false; fields.len()];

    while elements.next(reader)? {
        let key = read_key(reader, ctx)?;
        let Some(index) = fields.iter().position(|f| key.matches(&f.key)) else {
            if !options.extensible {
                return Err(DecodeError::UnknownKey {
                    ty,
                    key: key.describe(),
                });
            }
            reader.skip_value(ctx.remaining_depth())?;
            continue;
        };
        if seen[index] {
            return Err(DecodeError::DuplicateKey {
                ty,
                key: key.describe(),
            });
        }
        seen[index] = true;
        let field = &fields[index];
        match (&field.kind, slot_of[index]) {
            (FieldKind::Literal(literal), _) => {
                read_literal(reader, ty, field.key, *literal, ctx)?;
            }
            (FieldKind::Value { ty: child, .. }, Some(slot)) => {
                slots[slot] = Some(read_value(reader, child, ctx)?);
            }
            (FieldKind::Value { .. }, None) => {}
        }
    }

    for (field, present) in fields.iter().zip(&seen) {
        if !present && field.presence() != Presence::Optional {
            return Err(DecodeError::MissingField { ty, key: field.key });
        }
    }
    Ok(slots)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// =============================================================================
// ENCODING
// =============================================================================

pub(crate) fn write(
    writer: &mut Writer,
    options: &TypeOptions,
    parts: PartsRef<'_>,
    ctx: &mut EncodeContext,
) -> Result<(), EncodeError> {
    let indefinite = ctx.indefinite(options.length, parts.style);
    match (&options.layout, parts.content) {
        (Some(Layout::Entries { key, value }), ContentRef::Entries(entries)) => {
            open(writer, Major::Map, indefinite, entries.len());
            for (k, v) in entries {
                write_value(writer, key, k, ctx)?;
                write_value(writer, value, v, ctx)?;
            }
        }
        (Some(Layout::Fields(fields)), ContentRef::Fields(slots)) => {
            let entries = pair_slots(options, fields, &slots)?;
            for (field, slot) in &entries {
                if slot.is_none() && !field.is_literal() && field.presence() != Presence::Optional {
                    return Err(EncodeError::MissingField {
                        ty: options.name,
                        key: field.key,
                    });
                }
            }
            let present = entries
                .iter()
                .filter(|(field, slot)| field.is_literal() || slot.is_some())
                .count();
            open(writer, Major::Map, indefinite, present);
            for (field, slot) in &entries {
                match (&field.kind, slot) {
                    (FieldKind::Literal(literal), _) => {
                        write_key(writer, field.key);
                        write_literal(writer, *literal);
                    }
                    (FieldKind::Value { ty, .. }, Some(value)) => {
                        write_key(writer, field.key);
                        write_value(writer, ty, *value, ctx)?;
                    }
                    (FieldKind::Value { .. }, None) => {}
                }
            }
        }
        (layout, other) => {
            return Err(EncodeError::ShapeMismatch {
                ty: options.name,
                expected: layout.as_ref().map_or("layout", Layout::name),
                found: other.kind(),
            })
        }
    }
    if indefinite {
        writer.write_break();
    }
    Ok(())
}

fn write_key(writer: &mut Writer, key: FieldKey) {
    match key {
        FieldKey::Int(n) => writer.write_int(n, IntWidth::Minimal),
        FieldKey::Text(s) => writer.write_text(s),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::codec::{deserialize, serialize};
    use crate::fixtures::{Body, Header};

    fn body(fee: u64, ttl: Option<u64>) -> Body {
        Body {
            inputs: vec![1, 2],
            fee,
            ttl,
        }
    }

    #[test]
    fn test_absent_optional_omitted() {
        let bytes = serialize(&body(10, None)).unwrap();
        // {0: [1, 2], 2: 10}
        assert_eq!(bytes, vec![0xa2, 0x00, 0x82, 0x01, 0x02, 0x02, 0x0a]);
        assert_eq!(deserialize::<Body>(bytes).unwrap(), body(10, None));
    }

    #[test]
    fn test_present_optional_round_trip() {
        let bytes = serialize(&body(10, Some(99))).unwrap();
        assert_eq!(bytes[0], 0xa3);
        assert_eq!(deserialize::<Body>(bytes).unwrap(), body(10, Some(99)));
    }

    #[test]
    fn test_key_order_is_free_on_decode() {
        // {2: 10, 0: []}
        let bytes = vec![0xa2, 0x02, 0x0a, 0x00, 0x80];
        let decoded = deserialize::<Body>(bytes).unwrap();
        assert_eq!(decoded.fee, 10);
        assert!(decoded.inputs.is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        // {0: []}
        assert!(matches!(
            deserialize::<Body>(vec![0xa1, 0x00, 0x80]),
            Err(DecodeError::MissingField { key: FieldKey::Int(2), .. })
        ));
    }

    #[test]
    fn test_unknown_and_duplicate_keys() {
        // {0: [], 2: 1, 9: 0}
        assert!(matches!(
            deserialize::<Body>(vec![0xa3, 0x00, 0x80, 0x02, 0x01, 0x09, 0x00]),
            Err(DecodeError::UnknownKey { .. })
        ));
        // {0: [], 2: 1, 2: 1}
        assert!(matches!(
            deserialize::<Body>(vec![0xa3, 0x00, 0x80, 0x02, 0x01, 0x02, 0x01]),
            Err(DecodeError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_text_keys_and_extensible() {
        let header = Header {
            version: "1.0".to_string(),
            slot: 42,
        };
        let bytes = serialize(&header).unwrap();
        assert_eq!(deserialize::<Header>(bytes).unwrap(), header);

        // {"slot": 42, "version": "1.0", "extra": true, "kind": "header"}
        let mut bytes = vec![0xa4, 0x64];
        bytes.extend_from_slice(b"slot");
        bytes.extend_from_slice(&[0x18, 0x2a, 0x67]);
        bytes.extend_from_slice(b"version");
        bytes.extend_from_slice(&[0x63, b'1', b'.', b'0', 0x65]);
        bytes.extend_from_slice(b"extra");
        bytes.push(0xf5);
        bytes.push(0x64);
        bytes.extend_from_slice(b"kind");
        bytes.push(0x66);
        bytes.extend_from_slice(b"header");
        assert_eq!(deserialize::<Header>(bytes).unwrap(), header);
    }

    #[test]
    fn test_dynamic_map() {
        let mut map = BTreeMap::new();
        map.insert(1u64, "a".to_string());
        map.insert(2u64, "b".to_string());
        let bytes = serialize(&map).unwrap();
        assert_eq!(bytes, vec![0xa2, 0x01, 0x61, 0x61, 0x02, 0x61, 0x62]);
        assert_eq!(deserialize::<BTreeMap<u64, String>>(bytes).unwrap(), map);

        // {1: "a", 1: "b"}
        assert!(matches!(
            deserialize::<BTreeMap<u64, String>>(vec![0xa2, 0x01, 0x61, 0x61, 0x01, 0x61, 0x62]),
            Err(DecodeError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_null_is_not_absence() {
        // {0: [], 2: 1, 3: null}
        assert!(matches!(
            deserialize::<Body>(vec![0xa3, 0x00, 0x80, 0x02, 0x01, 0x03, 0xf6]),
            Err(DecodeError::UnexpectedMajor { found: Major::Simple, .. })
        ));
        let bytes = serialize(&body(1, None)).unwrap();
        assert_eq!(bytes[0], 0xa2);
        assert!(!bytes.contains(&0xf6));
    }

    #[test]
    fn test_dynamic_map_keys_compare_decoded() {
        // {1: "a", 1: "b"} with the second key in a one-byte argument.
        assert!(matches!(
            deserialize::<BTreeMap<u64, String>>(vec![
                0xa2, 0x01, 0x61, 0x61, 0x18, 0x01, 0x61, 0x62
            ]),
            Err(DecodeError::DuplicateKey { .. })
        ));
        // Distinct keys with non-minimal heads still decode.
        let decoded = deserialize::<BTreeMap<u64, String>>(vec![
            0xa2, 0x18, 0x01, 0x61, 0x61, 0x19, 0x00, 0x02, 0x61, 0x62,
        ])
        .unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[&2], "b");
    }

    #[test]
    fn test_indefinite_map_accepted() {
        let bytes = vec![0xbf, 0x00, 0x80, 0x02, 0x05, 0xff];
        assert_eq!(deserialize::<Body>(bytes).unwrap().fee, 5);
    }
}
