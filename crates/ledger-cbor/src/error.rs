//! Error types for CBOR decoding, encoding and type configuration.

use thiserror::Error;

use crate::codec::primitives::Major;
use crate::model::{FieldKey, Literal};

/// Error classes, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Malformed CBOR
    Malformed,
    /// E002: Well-formed CBOR with the wrong shape for the target type
    Shape,
    /// E003: No union candidate matched
    Union,
    /// E004: A decode or encode limit was exceeded
    Limit,
    /// E005: Inconsistent type configuration
    Config,
    /// E006: The value graph does not fit its declared types
    Value,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::Malformed => "E001",
            ErrorCode::Shape => "E002",
            ErrorCode::Union => "E003",
            ErrorCode::Limit => "E004",
            ErrorCode::Config => "E005",
            ErrorCode::Value => "E006",
        }
    }
}

/// Inconsistent configuration detected while resolving a type.
///
/// Cached by the registry: every later resolution of the same type returns
/// an equal error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("[E005] {ty}: no converter kind declared")]
    MissingKind { ty: &'static str },

    #[error("[E005] {ty}: map declares no fields")]
    EmptyMap { ty: &'static str },

    #[error("[E005] {ty}: union declares no candidates")]
    EmptyUnion { ty: &'static str },

    #[error("[E005] {ty}: union lists itself as a candidate")]
    SelfCandidate { ty: &'static str },

    #[error("[E005] {ty}: duplicate field key {key}")]
    DuplicateKey { ty: &'static str, key: FieldKey },

    #[error("[E005] {ty}: {kind} requires a layout")]
    MissingLayout { ty: &'static str, kind: &'static str },

    #[error("[E005] {ty}: {kind} cannot use a {layout} layout")]
    LayoutMismatch {
        ty: &'static str,
        kind: &'static str,
        layout: &'static str,
    },

    #[error("[E005] {ty}: field at position {position} has non-positional key {key}")]
    NonPositionalKey {
        ty: &'static str,
        position: usize,
        key: FieldKey,
    },

    #[error("[E005] {ty}: optional field {key} precedes a required field")]
    OptionalBeforeRequired { ty: &'static str, key: FieldKey },

    #[error("[E005] {ty}: facet `{facet}` does not apply to {kind}")]
    FacetMismatch {
        ty: &'static str,
        facet: &'static str,
        kind: &'static str,
    },

    #[error("[E005] {ty}: constructor alternative conflicts with explicit tag {tag}")]
    TagConflict { ty: &'static str, tag: u64 },

    #[error("[E005] {ty}: parent chain exceeds {max} levels")]
    InheritanceTooDeep { ty: &'static str, max: usize },

    #[error("[E005] {ty}: chunk size must be positive")]
    ZeroChunkSize { ty: &'static str },
}

impl ConfigError {
    /// Returns the name of the misconfigured type.
    pub fn ty(&self) -> &'static str {
        match self {
            ConfigError::MissingKind { ty }
            | ConfigError::EmptyMap { ty }
            | ConfigError::EmptyUnion { ty }
            | ConfigError::SelfCandidate { ty }
            | ConfigError::DuplicateKey { ty, .. }
            | ConfigError::MissingLayout { ty, .. }
            | ConfigError::LayoutMismatch { ty, .. }
            | ConfigError::NonPositionalKey { ty, .. }
            | ConfigError::OptionalBeforeRequired { ty, .. }
            | ConfigError::FacetMismatch { ty, .. }
            | ConfigError::TagConflict { ty, .. }
            | ConfigError::InheritanceTooDeep { ty, .. }
            | ConfigError::ZeroChunkSize { ty } => ty,
        }
    }
}

/// Why one union candidate rejected the input.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    pub candidate: &'static str,
    pub error: DecodeError,
}

fn render_failures(failures: &[CandidateFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.candidate, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error during CBOR decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    // === E001: Malformed CBOR ===
    #[error("[E001] unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("[E001] invalid additional info {info} in {context}")]
    InvalidAdditionalInfo { info: u8, context: &'static str },

    #[error("[E001] unexpected break in {context}")]
    UnexpectedBreak { context: &'static str },

    #[error("[E001] invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    #[error("[E001] invalid chunk in indefinite {context}")]
    InvalidChunk { context: &'static str },

    #[error("[E001] {count} trailing bytes after item")]
    TrailingBytes { count: usize },

    #[error("[E001] integer does not fit {ty}")]
    IntegerOverflow { ty: &'static str },

    // === E002: Shape mismatch ===
    #[error("[E002] {ty}: expected {expected}, found {found}")]
    UnexpectedMajor {
        ty: &'static str,
        expected: &'static str,
        found: Major,
    },

    #[error("[E002] {ty}: unexpected simple value {found}")]
    UnexpectedSimple { ty: &'static str, found: u64 },

    #[error("[E002] {ty}: missing tag {expected}")]
    MissingTag { ty: &'static str, expected: u64 },

    #[error("[E002] {ty}: expected tag {expected}, found tag {found}")]
    UnexpectedTag {
        ty: &'static str,
        expected: u64,
        found: u64,
    },

    #[error("[E002] {ty}: tag {tag} is not a constructor tag")]
    UnknownConstructorTag { ty: &'static str, tag: u64 },

    #[error("[E002] {ty}: expected constructor {expected}, found {found}")]
    ConstructorIndexMismatch {
        ty: &'static str,
        expected: u64,
        found: u64,
    },

    #[error("[E002] {ty}: expected {expected} framing, found {found}")]
    FramingMismatch {
        ty: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("[E002] {ty}: expected {expected} items, found {found}")]
    FieldCount {
        ty: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("[E002] {ty}: missing field {key}")]
    MissingField { ty: &'static str, key: FieldKey },

    #[error("[E002] {ty}: unknown key {key}")]
    UnknownKey { ty: &'static str, key: String },

    #[error("[E002] {ty}: duplicate key {key}")]
    DuplicateKey { ty: &'static str, key: String },

    #[error("[E002] {ty}: field {key} must be {expected}")]
    LiteralMismatch {
        ty: &'static str,
        key: FieldKey,
        expected: Literal,
    },

    #[error("[E002] {ty}: expected {expected} bytes, found {found}")]
    SizeMismatch {
        ty: &'static str,
        expected: usize,
        found: usize,
    },

    // === E003: Union resolution ===
    #[error("[E003] no candidate of {ty} matched: {}", render_failures(.failures))]
    NoMatchingCandidate {
        ty: &'static str,
        failures: Vec<CandidateFailure>,
    },

    // === E004: Limits ===
    #[error("[E004] nesting exceeds maximum depth {max}")]
    DepthExceeded { max: usize },

    #[error("[E004] {field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: u64,
        max: u64,
    },

    // === E005: Configuration ===
    #[error(transparent)]
    Config(#[from] ConfigError),

    // === E006: Value construction ===
    #[error("[E006] decoded object is not a {expected}")]
    ObjectTypeMismatch { expected: &'static str },

    #[error("[E006] {ty}: expected {expected} parts, found {found}")]
    UnexpectedParts {
        ty: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("[E006] {ty}: {reason}")]
    Invalid { ty: &'static str, reason: String },
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::UnexpectedEof { .. }
            | DecodeError::InvalidAdditionalInfo { .. }
            | DecodeError::UnexpectedBreak { .. }
            | DecodeError::InvalidUtf8 { .. }
            | DecodeError::InvalidChunk { .. }
            | DecodeError::TrailingBytes { .. }
            | DecodeError::IntegerOverflow { .. } => ErrorCode::Malformed,
            DecodeError::NoMatchingCandidate { .. } => ErrorCode::Union,
            DecodeError::DepthExceeded { .. } | DecodeError::LengthExceedsLimit { .. } => {
                ErrorCode::Limit
            }
            DecodeError::Config(_) => ErrorCode::Config,
            DecodeError::ObjectTypeMismatch { .. }
            | DecodeError::UnexpectedParts { .. }
            | DecodeError::Invalid { .. } => ErrorCode::Value,
            _ => ErrorCode::Shape,
        }
    }
}

/// Error during CBOR encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("[E006] value is not a {expected}")]
    TypeMismatch { expected: &'static str },

    #[error("[E006] {ty}: value is not one of the union candidates")]
    NotACandidate { ty: &'static str },

    #[error("[E002] {ty}: expected {expected} field slots, found {found}")]
    FieldCount {
        ty: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("[E002] {ty}: missing field {key}")]
    MissingField { ty: &'static str, key: FieldKey },

    #[error("[E002] {ty}: expected {expected} bytes, found {found}")]
    SizeMismatch {
        ty: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("[E006] {ty}: expected {expected} parts, found {found}")]
    ShapeMismatch {
        ty: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("[E006] {ty}: any-index constructor value carries no alternative")]
    MissingAlternative { ty: &'static str },

    #[error("[E006] {ty}: {value} does not fit the configured integer width")]
    IntegerWidth { ty: &'static str, value: u64 },

    #[error("[E004] nesting exceeds maximum depth {max}")]
    DepthExceeded { max: usize },
}

impl EncodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EncodeError::Config(_) => ErrorCode::Config,
            EncodeError::FieldCount { .. }
            | EncodeError::MissingField { .. }
            | EncodeError::SizeMismatch { .. } => ErrorCode::Shape,
            EncodeError::DepthExceeded { .. } => ErrorCode::Limit,
            _ => ErrorCode::Value,
        }
    }
}
