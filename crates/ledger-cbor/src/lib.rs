//! Schema-driven CBOR codec for ledger objects.
//!
//! Types describe their wire shape once, through [`CborType::schema`], and
//! the codec derives encoding and decoding from that description. Values
//! that must keep their exact bytes (for hashing or signature checks) can
//! opt into raw preservation and re-encode byte-for-byte.
//!
//! # Quick Start
//!
//! ```rust
//! use ledger_cbor::{deserialize, serialize, CborType, DecodeError, EncodeError};
//! use ledger_cbor::{Parts, PartsRef, Schema};
//!
//! /// `{0: fee, ? 1: ttl}`
//! #[derive(Debug, PartialEq)]
//! struct Body {
//!     fee: u64,
//!     ttl: Option<u64>,
//! }
//!
//! impl CborType for Body {
//!     fn schema() -> Schema {
//!         Schema::map().field::<u64>(0).optional::<u64>(1)
//!     }
//!
//!     fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
//!         let mut f = parts.into_fields()?;
//!         Ok(Self {
//!             fee: f.take()?,
//!             ttl: f.take_opt()?,
//!         })
//!     }
//!
//!     fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
//!         Ok(PartsRef::fields().field(&self.fee).optional(self.ttl.as_ref()))
//!     }
//! }
//!
//! let body = Body { fee: 10, ttl: None };
//! let bytes = serialize(&body).unwrap();
//! assert_eq!(bytes, vec![0xa1, 0x00, 0x0a]);
//! assert_eq!(deserialize::<Body>(bytes).unwrap(), body);
//! ```
//!
//! # Modules
//!
//! - [`model`]: schemas, resolved options and the value interface
//! - [`codec`]: the converters and the serialize/deserialize facade
//! - [`registry`]: the process-wide cache of resolved options
//! - [`validate`]: configuration consistency checks
//! - [`error`]: error types
//! - [`limits`]: default bounds for decoding untrusted input
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Declared lengths are checked against limits before allocating
//! - Nesting depth is bounded, including inside skipped values
//! - Integers that do not fit the target type are rejected

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod registry;
pub mod validate;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types at crate root
pub use codec::{
    deserialize, deserialize_with, serialize, serialize_with, DecodeOptions, EncodeOptions,
};
pub use error::{CandidateFailure, ConfigError, DecodeError, EncodeError, ErrorCode};
pub use model::{
    Alternative, CborList, CborSet, CborType, Constr, ConverterKind, EncodedValue, FieldKey,
    Fields, IntWidth, LengthMode, Literal, Null, Parts, PartsRef, Primitive, Scalar, ScalarRef,
    Schema, TypeOptions, TypeRef, Variant, WireStyle,
};
pub use registry::resolve;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
