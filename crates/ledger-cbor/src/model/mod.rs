//! Type model for the codec.
//!
//! - [`Schema`]: declared configuration facets of one type
//! - [`TypeOptions`]: the merged, validated configuration
//! - [`CborType`] / [`TypeRef`]: participating types and their handles
//! - [`Parts`] / [`PartsRef`]: what converters exchange with types
//! - [`builtin`]: generic building-block types

pub mod builtin;
pub mod cbor_type;
pub mod options;
pub mod parts;
pub mod schema;

pub use builtin::{CborList, CborSet, Constr, EncodedValue, Null};
pub use cbor_type::{CborType, Object, TypeRef};
pub use options::TypeOptions;
pub use parts::{Fields, Parts, PartsRef, Scalar, ScalarRef, Variant, VariantMatch, WireStyle};
pub use schema::{
    Alternative, ConverterKind, FieldKey, FieldKind, FieldSpec, IntWidth, Layout, LengthMode,
    Literal, Presence, Primitive, Schema, TagRule,
};
