//! The trait participating types implement, and the erased handles the
//! registry caches for them.

use std::any::{type_name, Any, TypeId};
use std::fmt;

use bytes::Bytes;

use crate::error::{DecodeError, EncodeError};
use crate::model::parts::{Parts, PartsRef};
use crate::model::schema::Schema;

/// A type-erased decoded value.
pub type Object = Box<dyn Any + Send + Sync>;

/// A type that can be (de)serialized by the codec.
///
/// Implementations are declarative: [`schema`](CborType::schema) states the
/// wire shape, [`from_parts`](CborType::from_parts) builds the value from
/// what the converter decoded, and [`to_parts`](CborType::to_parts) exposes
/// the value's children to the encoder. No implementation reads or writes
/// CBOR itself.
pub trait CborType: Any + Send + Sync + Sized {
    /// Declared configuration facets.
    fn schema() -> Schema;

    /// Builds a value from decoded parts.
    fn from_parts(parts: Parts) -> Result<Self, DecodeError>;

    /// Exposes the value's parts for encoding.
    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError>;

    /// The byte span this value was decoded from, if it was kept.
    ///
    /// Preserve-raw types return the span handed to them in
    /// [`Parts::take_raw`]; the encoder replays it verbatim.
    fn raw(&self) -> Option<&Bytes> {
        None
    }
}

/// A reference to a participating type: its identity plus the
/// construction/accessor handles the converters call.
#[derive(Clone, Copy)]
pub struct TypeRef {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) schema: fn() -> Schema,
    pub(crate) construct: fn(Parts) -> Result<Object, DecodeError>,
    pub(crate) deconstruct: fn(&dyn Any) -> Result<PartsRef<'_>, EncodeError>,
    pub(crate) raw: fn(&dyn Any) -> Option<&Bytes>,
}

impl TypeRef {
    /// Returns the reference for `T`.
    pub fn of<T: CborType>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            schema: T::schema,
            construct: construct_erased::<T>,
            deconstruct: deconstruct_erased::<T>,
            raw: raw_erased::<T>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true if `value` is an instance of this type.
    pub fn matches(&self, value: &dyn Any) -> bool {
        value.type_id() == self.id
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.name).finish()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

fn construct_erased<T: CborType>(parts: Parts) -> Result<Object, DecodeError> {
    T::from_parts(parts).map(|value| Box::new(value) as Object)
}

fn deconstruct_erased<T: CborType>(value: &dyn Any) -> Result<PartsRef<'_>, EncodeError> {
    value
        .downcast_ref::<T>()
        .ok_or(EncodeError::TypeMismatch {
            expected: type_name::<T>(),
        })?
        .to_parts()
}

fn raw_erased<T: CborType>(value: &dyn Any) -> Option<&Bytes> {
    value.downcast_ref::<T>().and_then(CborType::raw)
}

/// Unboxes a decoded object into `T`.
pub(crate) fn downcast<T: CborType>(object: Object) -> Result<T, DecodeError> {
    object
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| DecodeError::ObjectTypeMismatch {
            expected: type_name::<T>(),
        })
}
