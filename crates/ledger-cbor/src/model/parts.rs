//! Intermediate representation exchanged between converters and types.
//!
//! Decoding produces owned [`Parts`] that a type's construction handle
//! consumes; encoding asks a value for borrowed [`PartsRef`].

use std::any::{type_name, Any};

use bytes::Bytes;

use crate::error::DecodeError;
use crate::model::cbor_type::{downcast, CborType, Object};

/// Framing observed on decode, or requested on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WireStyle {
    /// The item used indefinite-length framing.
    pub indefinite: bool,
    /// An optional tag was present.
    pub tagged: bool,
}

/// A decoded scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Bool(bool),
    Uint(u64),
    /// Negative integer `-1 - n`.
    Nint(u64),
    Bytes(Bytes),
    Text(String),
    Null,
}

impl Scalar {
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Uint(_) => "uint",
            Scalar::Nint(_) => "nint",
            Scalar::Bytes(_) => "bytes",
            Scalar::Text(_) => "text",
            Scalar::Null => "null",
        }
    }
}

/// A scalar borrowed from a value for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarRef<'a> {
    Bool(bool),
    Uint(u64),
    Int(i64),
    Bytes(&'a [u8]),
    Text(&'a str),
    Null,
}

impl ScalarRef<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            ScalarRef::Bool(_) => "bool",
            ScalarRef::Uint(_) => "uint",
            ScalarRef::Int(_) => "int",
            ScalarRef::Bytes(_) => "bytes",
            ScalarRef::Text(_) => "text",
            ScalarRef::Null => "null",
        }
    }
}

pub(crate) enum Content {
    Scalar(Scalar),
    Fields(Vec<Option<Object>>),
    Items(Vec<Object>),
    Entries(Vec<(Object, Object)>),
    Variant(Object),
}

impl Content {
    fn kind(&self) -> &'static str {
        match self {
            Content::Scalar(_) => "scalar",
            Content::Fields(_) => "fields",
            Content::Items(_) => "items",
            Content::Entries(_) => "entries",
            Content::Variant(_) => "variant",
        }
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Everything a converter decoded for one value.
pub struct Parts {
    ty: &'static str,
    content: Content,
    alternative: Option<u64>,
    style: WireStyle,
    raw: Option<Bytes>,
}

impl Parts {
    pub(crate) fn new(ty: &'static str, content: Content) -> Self {
        Self {
            ty,
            content,
            alternative: None,
            style: WireStyle::default(),
            raw: None,
        }
    }

    pub(crate) fn set_alternative(&mut self, index: u64) {
        self.alternative = Some(index);
    }

    pub(crate) fn style_mut(&mut self) -> &mut WireStyle {
        &mut self.style
    }

    pub(crate) fn set_raw(&mut self, raw: Bytes) {
        self.raw = Some(raw);
    }

    /// Constructor index read from the wire.
    pub fn alternative(&self) -> Option<u64> {
        self.alternative
    }

    /// Framing the value was read with.
    pub fn style(&self) -> WireStyle {
        self.style
    }

    /// Takes the consumed span; set only for preserve-raw types.
    pub fn take_raw(&mut self) -> Option<Bytes> {
        self.raw.take()
    }

    fn unexpected(&self, expected: &'static str) -> DecodeError {
        DecodeError::UnexpectedParts {
            ty: self.ty,
            expected,
            found: self.content.kind(),
        }
    }

    pub fn into_scalar(self) -> Result<Scalar, DecodeError> {
        match self.content {
            Content::Scalar(scalar) => Ok(scalar),
            _ => Err(self.unexpected("scalar")),
        }
    }

    pub fn into_fields(self) -> Result<Fields, DecodeError> {
        match self.content {
            Content::Fields(slots) => Ok(Fields {
                ty: self.ty,
                slots: slots.into_iter(),
            }),
            _ => Err(self.unexpected("fields")),
        }
    }

    pub fn into_items<T: CborType>(self) -> Result<Vec<T>, DecodeError> {
        match self.content {
            Content::Items(items) => items.into_iter().map(downcast::<T>).collect(),
            _ => Err(self.unexpected("items")),
        }
    }

    pub fn into_entries<K: CborType, V: CborType>(self) -> Result<Vec<(K, V)>, DecodeError> {
        match self.content {
            Content::Entries(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((downcast::<K>(k)?, downcast::<V>(v)?)))
                .collect(),
            _ => Err(self.unexpected("entries")),
        }
    }

    /// The union candidate that matched.
    pub fn into_variant(self) -> Result<Variant, DecodeError> {
        match self.content {
            Content::Variant(object) => Ok(Variant {
                object,
                union: self.ty,
            }),
            _ => Err(self.unexpected("variant")),
        }
    }
}

/// Positional access to decoded field slots, in field-map order.
///
/// Literal fields have no slot.
pub struct Fields {
    ty: &'static str,
    slots: std::vec::IntoIter<Option<Object>>,
}

impl Fields {
    /// Takes the next slot, which must be present.
    pub fn take<T: CborType>(&mut self) -> Result<T, DecodeError> {
        let value = self.take_opt::<T>()?;
        value.ok_or(DecodeError::UnexpectedParts {
            ty: self.ty,
            expected: "present field",
            found: "absent field",
        })
    }

    /// Takes the next slot, `None` if absent.
    pub fn take_opt<T: CborType>(&mut self) -> Result<Option<T>, DecodeError> {
        match self.slots.next() {
            Some(Some(object)) => downcast::<T>(object).map(Some),
            Some(None) => Ok(None),
            None => Err(DecodeError::UnexpectedParts {
                ty: self.ty,
                expected: type_name::<T>(),
                found: "end of fields",
            }),
        }
    }

    /// Number of slots not yet taken.
    pub fn remaining(&self) -> usize {
        self.slots.len()
    }
}

/// The matched candidate of a union.
pub struct Variant {
    object: Object,
    union: &'static str,
}

impl Variant {
    pub fn is<T: CborType>(&self) -> bool {
        self.object.is::<T>()
    }

    pub fn downcast<T: CborType>(self) -> Result<T, Variant> {
        match self.object.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(object) => Err(Variant {
                object,
                union: self.union,
            }),
        }
    }

    /// Starts a match over candidate types.
    pub fn on<T: CborType, R>(self, f: impl FnOnce(T) -> R) -> VariantMatch<R> {
        VariantMatch {
            state: self.downcast::<T>().map(f),
        }
    }
}

/// Chain of candidate arms built by [`Variant::on`].
pub struct VariantMatch<R> {
    state: Result<R, Variant>,
}

impl<R> VariantMatch<R> {
    pub fn on<T: CborType>(self, f: impl FnOnce(T) -> R) -> Self {
        match self.state {
            Ok(value) => Self { state: Ok(value) },
            Err(variant) => variant.on(f),
        }
    }

    pub fn finish(self) -> Result<R, DecodeError> {
        self.state.map_err(|variant| DecodeError::ObjectTypeMismatch {
            expected: variant.union,
        })
    }
}

// =============================================================================
// ENCODING
// =============================================================================

pub(crate) enum ContentRef<'a> {
    Scalar(ScalarRef<'a>),
    Fields(Vec<Option<&'a dyn Any>>),
    Items(Vec<&'a dyn Any>),
    Entries(Vec<(&'a dyn Any, &'a dyn Any)>),
    Variant(&'a dyn Any),
}

impl ContentRef<'_> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ContentRef::Scalar(_) => "scalar",
            ContentRef::Fields(_) => "fields",
            ContentRef::Items(_) => "items",
            ContentRef::Entries(_) => "entries",
            ContentRef::Variant(_) => "variant",
        }
    }
}

/// A value's children, borrowed for encoding.
pub struct PartsRef<'a> {
    pub(crate) content: ContentRef<'a>,
    pub(crate) alternative: Option<u64>,
    pub(crate) style: Option<WireStyle>,
}

impl<'a> PartsRef<'a> {
    fn with_content(content: ContentRef<'a>) -> Self {
        Self {
            content,
            alternative: None,
            style: None,
        }
    }

    pub fn scalar(scalar: ScalarRef<'a>) -> Self {
        Self::with_content(ContentRef::Scalar(scalar))
    }

    /// Starts an empty field list; push slots in field-map order.
    pub fn fields() -> Self {
        Self::with_content(ContentRef::Fields(Vec::new()))
    }

    pub fn items<T: CborType>(items: &'a [T]) -> Self {
        Self::with_content(ContentRef::Items(
            items.iter().map(|item| item as &dyn Any).collect(),
        ))
    }

    pub fn entries<K, V, I>(entries: I) -> Self
    where
        K: CborType,
        V: CborType,
        I: IntoIterator<Item = (&'a K, &'a V)>,
    {
        Self::with_content(ContentRef::Entries(
            entries
                .into_iter()
                .map(|(k, v)| (k as &dyn Any, v as &dyn Any))
                .collect(),
        ))
    }

    pub fn variant<T: CborType>(value: &'a T) -> Self {
        Self::with_content(ContentRef::Variant(value))
    }

    /// Pushes a present field.
    pub fn field<T: CborType>(self, value: &'a T) -> Self {
        self.push(Some(value as &dyn Any))
    }

    /// Pushes a field that may be absent.
    pub fn optional<T: CborType>(self, value: Option<&'a T>) -> Self {
        self.push(value.map(|v| v as &dyn Any))
    }

    fn push(mut self, slot: Option<&'a dyn Any>) -> Self {
        if let ContentRef::Fields(slots) = &mut self.content {
            slots.push(slot);
        }
        self
    }

    /// Constructor index for any-index constructors.
    pub fn with_alternative(mut self, index: u64) -> Self {
        self.alternative = Some(index);
        self
    }

    /// Framing to emit where the schema leaves it open.
    pub fn with_style(mut self, style: WireStyle) -> Self {
        self.style = Some(style);
        self
    }
}
