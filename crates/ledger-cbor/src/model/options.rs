//! Resolved per-type configuration.

use crate::error::ConfigError;
use crate::model::schema::{
    Alternative, ConverterKind, FieldSpec, IntWidth, Layout, LengthMode, Primitive, Schema, TagRule,
};
use crate::model::TypeRef;

/// The merged, validated configuration of one type.
///
/// Built once per type by the registry and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeOptions {
    pub name: &'static str,
    pub kind: ConverterKind,
    pub tag: Option<TagRule>,
    pub alternative: Option<Alternative>,
    pub length: LengthMode,
    pub layout: Option<Layout>,
    pub candidates: Vec<TypeRef>,
    pub preserve_raw: bool,
    pub extensible: bool,
    pub size: Option<usize>,
    pub chunk_size: Option<usize>,
    pub int_width: IntWidth,
}

impl TypeOptions {
    /// Fills defaults into a fully merged schema.
    ///
    /// Embedded payloads always preserve their raw span, and a constructor
    /// without an alternative is constructor 0.
    pub fn from_schema(name: &'static str, schema: Schema) -> Result<Self, ConfigError> {
        let kind = schema.kind.ok_or(ConfigError::MissingKind { ty: name })?;
        let embedded = kind == ConverterKind::Primitive(Primitive::Embedded);
        let alternative = match kind {
            ConverterKind::Constructor => Some(schema.alternative.unwrap_or(Alternative::Index(0))),
            _ => schema.alternative,
        };
        Ok(Self {
            name,
            kind,
            tag: schema.tag,
            alternative,
            length: schema.length.unwrap_or_default(),
            layout: schema.layout,
            candidates: schema.candidates.unwrap_or_default(),
            preserve_raw: embedded || schema.preserve_raw.unwrap_or(false),
            extensible: schema.extensible.unwrap_or(false),
            size: schema.size,
            chunk_size: schema.chunk_size,
            int_width: schema.int_width.unwrap_or_default(),
        })
    }

    /// Returns the field map, empty for non-field layouts.
    pub fn fields(&self) -> &[FieldSpec] {
        match &self.layout {
            Some(Layout::Fields(fields)) => fields,
            _ => &[],
        }
    }

    /// Number of field slots exchanged with the type (literals excluded).
    pub fn slot_count(&self) -> usize {
        self.fields().iter().filter(|f| !f.is_literal()).count()
    }
}
