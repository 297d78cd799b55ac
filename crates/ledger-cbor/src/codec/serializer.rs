//! Serializer facade and the dispatcher every converter re-enters.
//!
//! `read_value` / `write_value` resolve a type's options through the
//! registry, apply the raw-preservation layer, handle the optional or
//! required tag, and hand the item to the converter for its kind.

use std::any::Any;

use bytes::Bytes;

use crate::codec::primitives::{Major, Reader, Writer};
use crate::codec::{constr, list, map, raw, scalar, union};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_COLLECTION_LEN, MAX_DEPTH, MAX_STRING_LEN};
use crate::model::cbor_type::{downcast, CborType, Object, TypeRef};
use crate::model::parts::{Parts, PartsRef, WireStyle};
use crate::model::{ConverterKind, LengthMode, TagRule, TypeOptions};
use crate::registry;

// =============================================================================
// OPTIONS
// =============================================================================

/// Options for decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting depth.
    pub max_depth: usize,
    /// Maximum declared length of one array or map.
    pub max_collection_len: u64,
    /// Maximum payload length of one string.
    pub max_string_len: u64,
    /// Accept input that continues after the top-level item.
    pub allow_trailing: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_collection_len: MAX_COLLECTION_LEN,
            max_string_len: MAX_STRING_LEN,
            allow_trailing: false,
        }
    }
}

impl DecodeOptions {
    /// Creates default decoding options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that ignore bytes after the top-level item.
    pub fn allow_trailing() -> Self {
        Self {
            allow_trailing: true,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Options for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Maximum nesting depth.
    pub max_depth: usize,
    /// Framing for arrays and maps whose length mode is `Either` and whose
    /// value recorded no wire style.
    ///
    /// When disabled (the default), such collections are definite.
    pub indefinite_by_default: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            indefinite_by_default: false,
        }
    }
}

impl EncodeOptions {
    /// Creates default encoding options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options preferring indefinite collections.
    pub fn indefinite() -> Self {
        Self {
            indefinite_by_default: true,
            ..Self::default()
        }
    }
}

// =============================================================================
// CONTEXTS
// =============================================================================

/// State threaded through one decode call.
#[derive(Debug)]
pub struct DecodeContext {
    pub(crate) options: DecodeOptions,
    depth: usize,
}

impl DecodeContext {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options, depth: 0 }
    }

    /// Depth budget left for skipping whole items.
    pub(crate) fn remaining_depth(&self) -> usize {
        self.options.max_depth.saturating_sub(self.depth)
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        if self.depth >= self.options.max_depth {
            return Err(DecodeError::DepthExceeded {
                max: self.options.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

/// State threaded through one encode call.
#[derive(Debug)]
pub struct EncodeContext {
    pub(crate) options: EncodeOptions,
    depth: usize,
}

impl EncodeContext {
    pub fn new(options: EncodeOptions) -> Self {
        Self { options, depth: 0 }
    }

    fn enter(&mut self) -> Result<(), EncodeError> {
        if self.depth >= self.options.max_depth {
            return Err(EncodeError::DepthExceeded {
                max: self.options.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Chooses indefinite framing for a collection.
    pub(crate) fn indefinite(&self, mode: LengthMode, style: Option<WireStyle>) -> bool {
        match mode {
            LengthMode::Definite => false,
            LengthMode::Indefinite => true,
            LengthMode::Either => style
                .map(|s| s.indefinite)
                .unwrap_or(self.options.indefinite_by_default),
        }
    }
}

/// Rejects framing the length mode does not accept.
pub(crate) fn check_framing(options: &TypeOptions, indefinite: bool) -> Result<(), DecodeError> {
    let expected = match (options.length, indefinite) {
        (LengthMode::Definite, true) => "definite",
        (LengthMode::Indefinite, false) => "indefinite",
        _ => return Ok(()),
    };
    Err(DecodeError::FramingMismatch {
        ty: options.name,
        expected,
        found: if indefinite { "indefinite" } else { "definite" },
    })
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes one value of type `ty`.
pub(crate) fn read_value(
    reader: &mut Reader,
    ty: &TypeRef,
    ctx: &mut DecodeContext,
) -> Result<Object, DecodeError> {
    let options = registry::resolve_ref(ty)?;
    ctx.enter()?;
    let result = if options.preserve_raw {
        raw::read_preserved(reader, ty, &options, ctx)
    } else {
        read_parts(reader, &options, ctx).and_then(|parts| (ty.construct)(parts))
    };
    ctx.leave();
    result
}

/// Runs the converter for `options` without constructing the value.
pub(crate) fn read_parts(
    reader: &mut Reader,
    options: &TypeOptions,
    ctx: &mut DecodeContext,
) -> Result<Parts, DecodeError> {
    let tagged = read_tag(reader, options)?;
    let mut parts = match options.kind {
        ConverterKind::Primitive(primitive) => scalar::read(reader, primitive, options, ctx)?,
        ConverterKind::List => list::read(reader, options, ctx)?,
        ConverterKind::Map => map::read(reader, options, ctx)?,
        ConverterKind::Constructor => constr::read(reader, options, ctx)?,
        ConverterKind::Union => union::read(reader, options, ctx)?,
    };
    parts.style_mut().tagged = tagged;
    Ok(parts)
}

/// Consumes the configured tag; returns whether a tag was present.
fn read_tag(reader: &mut Reader, options: &TypeOptions) -> Result<bool, DecodeError> {
    let Some(rule) = options.tag else {
        return Ok(false);
    };
    let header = reader.peek_header(options.name)?;
    if header.major != Major::Tag {
        return match rule {
            TagRule::Required(expected) => Err(DecodeError::MissingTag {
                ty: options.name,
                expected,
            }),
            TagRule::Optional(_) => Ok(false),
        };
    }
    let found = header.arg.unwrap_or(0);
    if found != rule.number() {
        return Err(DecodeError::UnexpectedTag {
            ty: options.name,
            expected: rule.number(),
            found,
        });
    }
    reader.read_header(options.name)?;
    Ok(true)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes `value`, which must be an instance of `ty`.
pub(crate) fn write_value(
    writer: &mut Writer,
    ty: &TypeRef,
    value: &dyn Any,
    ctx: &mut EncodeContext,
) -> Result<(), EncodeError> {
    let options = registry::resolve_ref(ty)?;
    ctx.enter()?;
    let result = if options.preserve_raw && raw::replay(writer, ty, value) {
        Ok(())
    } else {
        (ty.deconstruct)(value).and_then(|parts| write_parts(writer, &options, parts, ctx))
    };
    ctx.leave();
    result
}

fn write_parts(
    writer: &mut Writer,
    options: &TypeOptions,
    parts: PartsRef<'_>,
    ctx: &mut EncodeContext,
) -> Result<(), EncodeError> {
    match options.tag {
        Some(TagRule::Required(tag)) => writer.write_tag(tag),
        Some(TagRule::Optional(tag)) => {
            if parts.style.is_none_or(|style| style.tagged) {
                writer.write_tag(tag);
            }
        }
        None => {}
    }
    match options.kind {
        ConverterKind::Primitive(primitive) => scalar::write(writer, primitive, options, parts),
        ConverterKind::List => list::write(writer, options, parts, ctx),
        ConverterKind::Map => map::write(writer, options, parts, ctx),
        ConverterKind::Constructor => constr::write(writer, options, parts, ctx),
        ConverterKind::Union => union::write(writer, options, parts, ctx),
    }
}

// =============================================================================
// FACADE
// =============================================================================

/// Encodes `value` to CBOR.
pub fn serialize<T: CborType>(value: &T) -> Result<Vec<u8>, EncodeError> {
    serialize_with(value, EncodeOptions::default())
}

/// Encodes `value` to CBOR with the given options.
pub fn serialize_with<T: CborType>(
    value: &T,
    options: EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new();
    let mut ctx = EncodeContext::new(options);
    write_value(&mut writer, &TypeRef::of::<T>(), value, &mut ctx)?;
    Ok(writer.into_bytes())
}

/// Decodes a `T` from CBOR.
///
/// The input must hold exactly one item. Preserved spans of the result are
/// zero-copy slices of `data`.
pub fn deserialize<T: CborType>(data: impl Into<Bytes>) -> Result<T, DecodeError> {
    deserialize_with(data, DecodeOptions::default())
}

/// Decodes a `T` from CBOR with the given options.
pub fn deserialize_with<T: CborType>(
    data: impl Into<Bytes>,
    options: DecodeOptions,
) -> Result<T, DecodeError> {
    let mut reader = Reader::new(data.into());
    let mut ctx = DecodeContext::new(options);
    let object = read_value(&mut reader, &TypeRef::of::<T>(), &mut ctx)?;
    if !options.allow_trailing && !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            count: reader.remaining_len(),
        });
    }
    downcast::<T>(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_bytes() {
        assert!(matches!(
            deserialize::<u64>(vec![0x01, 0x02]),
            Err(DecodeError::TrailingBytes { count: 1 })
        ));
        assert_eq!(
            deserialize_with::<u64>(vec![0x01, 0x02], DecodeOptions::allow_trailing()).unwrap(),
            1
        );
    }

    #[test]
    fn test_depth_limit() {
        let nested: Vec<Vec<Vec<u64>>> = vec![vec![vec![7]]];
        let bytes = serialize(&nested).unwrap();
        assert_eq!(bytes, vec![0x81, 0x81, 0x81, 0x07]);

        let options = DecodeOptions::new().with_max_depth(3);
        assert!(matches!(
            deserialize_with::<Vec<Vec<Vec<u64>>>>(bytes.clone(), options),
            Err(DecodeError::DepthExceeded { max: 3 })
        ));
        let options = DecodeOptions::new().with_max_depth(4);
        assert_eq!(deserialize_with::<Vec<Vec<Vec<u64>>>>(bytes, options).unwrap(), nested);

        let shallow = EncodeOptions {
            max_depth: 2,
            ..EncodeOptions::default()
        };
        assert!(matches!(
            serialize_with(&nested, shallow),
            Err(EncodeError::DepthExceeded { max: 2 })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            deserialize::<bool>(Vec::new()),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_either_length_follows_options() {
        let items: Vec<u64> = vec![1, 2];
        assert_eq!(serialize(&items).unwrap(), vec![0x82, 0x01, 0x02]);
        assert_eq!(
            serialize_with(&items, EncodeOptions::indefinite()).unwrap(),
            vec![0x9f, 0x01, 0x02, 0xff]
        );
    }
}
