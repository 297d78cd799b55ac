//! CBOR encoding and decoding driven by type options.
//!
//! [`serialize`] and [`deserialize`] are the entry points. Every nested
//! value goes back through the same dispatcher, which picks the converter
//! for the value's [`ConverterKind`](crate::model::ConverterKind):
//!
//! - `scalar`: booleans, integers, strings, null and embedded CBOR
//! - `list`: arrays (positional fields or homogeneous items)
//! - `map`: maps (keyed fields or homogeneous entries)
//! - [`constr`]: tagged constructor arrays
//! - `union`: ordered trial decoding over candidate types
//!
//! `raw` wraps any of them for types that keep their original bytes.

pub mod constr;
mod list;
mod map;
pub mod primitives;
mod raw;
mod scalar;
pub mod serializer;
mod union;

pub use constr::{compact_index, compact_tag, TAG_GENERAL};
pub use primitives::{Header, Major, Reader, Writer};
pub use serializer::{
    deserialize, deserialize_with, serialize, serialize_with, DecodeContext, DecodeOptions,
    EncodeContext, EncodeOptions,
};
