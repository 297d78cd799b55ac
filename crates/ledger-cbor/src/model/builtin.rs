//! Generic building-block types every catalog of ledger types needs.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::codec::deserialize;
use crate::error::{DecodeError, EncodeError};
use crate::model::cbor_type::CborType;
use crate::model::parts::{Parts, PartsRef, Scalar, ScalarRef, WireStyle};
use crate::model::schema::{Primitive, Schema};

/// Tag marking an embedded CBOR data item.
pub const TAG_EMBEDDED: u64 = 24;

/// Tag marking a mathematical finite set.
pub const TAG_SET: u64 = 258;

fn wrong_scalar(ty: &'static str, expected: &'static str, found: &Scalar) -> DecodeError {
    DecodeError::UnexpectedParts {
        ty,
        expected,
        found: found.kind(),
    }
}

// =============================================================================
// SCALARS
// =============================================================================

impl CborType for bool {
    fn schema() -> Schema {
        Schema::primitive(Primitive::Bool)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        match parts.into_scalar()? {
            Scalar::Bool(value) => Ok(value),
            other => Err(wrong_scalar("bool", "bool", &other)),
        }
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::scalar(ScalarRef::Bool(*self)))
    }
}

impl CborType for u64 {
    fn schema() -> Schema {
        Schema::primitive(Primitive::Uint)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        match parts.into_scalar()? {
            Scalar::Uint(value) => Ok(value),
            other => Err(wrong_scalar("u64", "uint", &other)),
        }
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::scalar(ScalarRef::Uint(*self)))
    }
}

impl CborType for u32 {
    fn schema() -> Schema {
        Schema::primitive(Primitive::Uint)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let value = u64::from_parts(parts)?;
        u32::try_from(value).map_err(|_| DecodeError::IntegerOverflow { ty: "u32" })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::scalar(ScalarRef::Uint(*self as u64)))
    }
}

impl CborType for i64 {
    fn schema() -> Schema {
        Schema::primitive(Primitive::Int)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        match parts.into_scalar()? {
            Scalar::Uint(value) => {
                i64::try_from(value).map_err(|_| DecodeError::IntegerOverflow { ty: "i64" })
            }
            Scalar::Nint(value) => i64::try_from(value)
                .map(|n| -1 - n)
                .map_err(|_| DecodeError::IntegerOverflow { ty: "i64" }),
            other => Err(wrong_scalar("i64", "int", &other)),
        }
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::scalar(ScalarRef::Int(*self)))
    }
}

impl CborType for String {
    fn schema() -> Schema {
        Schema::primitive(Primitive::Text)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        match parts.into_scalar()? {
            Scalar::Text(value) => Ok(value),
            other => Err(wrong_scalar("String", "text", &other)),
        }
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::scalar(ScalarRef::Text(self)))
    }
}

impl CborType for Bytes {
    fn schema() -> Schema {
        Schema::primitive(Primitive::Bytes)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        match parts.into_scalar()? {
            Scalar::Bytes(value) => Ok(value),
            other => Err(wrong_scalar("Bytes", "bytes", &other)),
        }
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::scalar(ScalarRef::Bytes(self)))
    }
}

/// CBOR `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Null;

impl CborType for Null {
    fn schema() -> Schema {
        Schema::primitive(Primitive::Null)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        match parts.into_scalar()? {
            Scalar::Null => Ok(Null),
            other => Err(wrong_scalar("Null", "null", &other)),
        }
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::scalar(ScalarRef::Null))
    }
}

// =============================================================================
// COLLECTIONS
// =============================================================================

impl<T: CborType> CborType for Vec<T> {
    fn schema() -> Schema {
        Schema::list().items::<T>()
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        parts.into_items()
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::items(self))
    }
}

impl<K: CborType + Ord, V: CborType> CborType for BTreeMap<K, V> {
    fn schema() -> Schema {
        Schema::map().entries::<K, V>()
    }

    /// Keys are compared after decoding, so two encodings of one key collide.
    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let mut map = BTreeMap::new();
        for (index, (k, v)) in parts.into_entries::<K, V>()?.into_iter().enumerate() {
            if map.insert(k, v).is_some() {
                return Err(DecodeError::DuplicateKey {
                    ty: std::any::type_name::<Self>(),
                    key: format!("entry {}", index),
                });
            }
        }
        Ok(map)
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::entries(self.iter()))
    }
}

/// A list that remembers whether it was definite or indefinite on the wire.
///
/// Re-encoding keeps the observed framing even though no raw span is kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CborList<T> {
    pub items: Vec<T>,
    pub indefinite: bool,
}

impl<T> CborList<T> {
    pub fn definite(items: Vec<T>) -> Self {
        Self {
            items,
            indefinite: false,
        }
    }

    pub fn indefinite(items: Vec<T>) -> Self {
        Self {
            items,
            indefinite: true,
        }
    }
}

impl<T: CborType> CborType for CborList<T> {
    fn schema() -> Schema {
        Schema::list().items::<T>()
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let indefinite = parts.style().indefinite;
        Ok(Self {
            items: parts.into_items()?,
            indefinite,
        })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::items(&self.items).with_style(WireStyle {
            indefinite: self.indefinite,
            tagged: false,
        }))
    }
}

/// A list optionally wrapped in tag 258.
///
/// Whether the tag was present is remembered and re-emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CborSet<T> {
    pub items: Vec<T>,
    pub tagged: bool,
}

impl<T> CborSet<T> {
    /// A tagged set.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            tagged: true,
        }
    }

    /// A plain array holding set elements.
    pub fn untagged(items: Vec<T>) -> Self {
        Self {
            items,
            tagged: false,
        }
    }
}

impl<T: CborType> CborType for CborSet<T> {
    fn schema() -> Schema {
        Schema::list().optional_tag(TAG_SET).items::<T>()
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let tagged = parts.style().tagged;
        Ok(Self {
            items: parts.into_items()?,
            tagged,
        })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::items(&self.items).with_style(WireStyle {
            indefinite: false,
            tagged: self.tagged,
        }))
    }
}

/// Generic constructor data: any alternative index over homogeneous fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constr<T> {
    pub index: u64,
    pub fields: Vec<T>,
}

impl<T: CborType> CborType for Constr<T> {
    fn schema() -> Schema {
        Schema::constructor_any().items::<T>()
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let index = parts.alternative().ok_or(DecodeError::UnexpectedParts {
            ty: "Constr",
            expected: "constructor index",
            found: "none",
        })?;
        Ok(Self {
            index,
            fields: parts.into_items()?,
        })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::items(&self.fields).with_alternative(self.index))
    }
}

// =============================================================================
// EMBEDDED CBOR
// =============================================================================

/// A tag-24 byte string whose payload is itself a CBOR item.
///
/// Decoded values keep their original bytes and re-encode verbatim. The
/// payload is decoded on demand with [`decode`](EncodedValue::decode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedValue {
    payload: Bytes,
    raw: Option<Bytes>,
}

impl EncodedValue {
    /// Wraps an already encoded item.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            raw: None,
        }
    }

    /// The embedded item's bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Decodes the embedded item as `T`.
    pub fn decode<T: CborType>(&self) -> Result<T, DecodeError> {
        deserialize::<T>(self.payload.clone())
    }
}

impl CborType for EncodedValue {
    fn schema() -> Schema {
        Schema::primitive(Primitive::Embedded).tag(TAG_EMBEDDED)
    }

    fn from_parts(mut parts: Parts) -> Result<Self, DecodeError> {
        let raw = parts.take_raw();
        match parts.into_scalar()? {
            Scalar::Bytes(payload) => Ok(Self { payload, raw }),
            other => Err(wrong_scalar("EncodedValue", "bytes", &other)),
        }
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::scalar(ScalarRef::Bytes(&self.payload)))
    }

    fn raw(&self) -> Option<&Bytes> {
        self.raw.as_ref()
    }
}
