//! Limits applied while decoding untrusted input and resolving types.
//!
//! These are the defaults behind [`DecodeOptions`](crate::codec::DecodeOptions)
//! and [`EncodeOptions`](crate::codec::EncodeOptions).

/// Maximum nesting depth of converted values (and of skipped items).
pub const MAX_DEPTH: usize = 256;

/// Maximum declared element count of a single array or map.
pub const MAX_COLLECTION_LEN: u64 = 1 << 20;

/// Maximum payload length of a single byte or text string (16 MiB).
pub const MAX_STRING_LEN: u64 = 16 * 1024 * 1024;

/// Maximum length of a schema parent chain.
pub const MAX_INHERITANCE_DEPTH: usize = 16;

/// Chunk width used for indefinite strings without a configured chunk size.
pub const DEFAULT_CHUNK_SIZE: usize = 64;
