//! Consistency checks on resolved type options.
//!
//! Runs once per type, inside registry resolution. A type that fails here is
//! never used for encoding or decoding; the error is cached instead.

use rustc_hash::FxHashSet;

use crate::error::ConfigError;
use crate::model::{
    ConverterKind, FieldKey, FieldSpec, Layout, LengthMode, Presence, Primitive, TypeOptions,
    TypeRef,
};

/// Validates `options`, the merged configuration of `ty`.
pub fn validate_options(ty: &TypeRef, options: &TypeOptions) -> Result<(), ConfigError> {
    if options.chunk_size == Some(0) {
        return Err(ConfigError::ZeroChunkSize { ty: options.name });
    }
    if options.alternative.is_some() && options.kind != ConverterKind::Constructor {
        return Err(facet(options, "alternative"));
    }
    if !options.candidates.is_empty() && options.kind != ConverterKind::Union {
        return Err(facet(options, "candidates"));
    }
    match options.kind {
        ConverterKind::Primitive(primitive) => validate_primitive(options, primitive),
        ConverterKind::List => {
            validate_no_scalar_facets(options)?;
            match &options.layout {
                Some(Layout::Fields(fields)) => validate_positional(options, fields),
                Some(Layout::Items(_)) => Ok(()),
                Some(layout) => Err(layout_mismatch(options, layout)),
                None => Err(missing_layout(options)),
            }
        }
        ConverterKind::Map => {
            validate_no_scalar_facets(options)?;
            match &options.layout {
                Some(Layout::Fields(fields)) => validate_keyed(options, fields),
                Some(Layout::Entries { .. }) => Ok(()),
                Some(layout) => Err(layout_mismatch(options, layout)),
                None => Err(ConfigError::EmptyMap { ty: options.name }),
            }
        }
        ConverterKind::Constructor => {
            if let Some(tag) = options.tag {
                return Err(ConfigError::TagConflict {
                    ty: options.name,
                    tag: tag.number(),
                });
            }
            validate_no_scalar_facets(options)?;
            match &options.layout {
                Some(Layout::Fields(fields)) => validate_positional(options, fields),
                Some(Layout::Items(_)) => Ok(()),
                Some(layout) => Err(layout_mismatch(options, layout)),
                None => Err(missing_layout(options)),
            }
        }
        ConverterKind::Union => validate_union(ty, options),
    }
}

fn validate_primitive(options: &TypeOptions, primitive: Primitive) -> Result<(), ConfigError> {
    if let Some(layout) = &options.layout {
        return Err(layout_mismatch(options, layout));
    }
    if options.extensible {
        return Err(facet(options, "extensible"));
    }
    if !primitive.is_string() {
        if options.size.is_some() {
            return Err(facet(options, "size"));
        }
        if options.chunk_size.is_some() {
            return Err(facet(options, "chunk_size"));
        }
        if options.length != LengthMode::Either {
            return Err(facet(options, "length"));
        }
    }
    if !matches!(primitive, Primitive::Uint | Primitive::Int)
        && options.int_width != Default::default()
    {
        return Err(facet(options, "int_width"));
    }
    Ok(())
}

fn validate_union(ty: &TypeRef, options: &TypeOptions) -> Result<(), ConfigError> {
    if options.candidates.is_empty() {
        return Err(ConfigError::EmptyUnion { ty: options.name });
    }
    if options.candidates.iter().any(|c| c.id() == ty.id()) {
        return Err(ConfigError::SelfCandidate { ty: options.name });
    }
    if options.tag.is_some() {
        return Err(facet(options, "tag"));
    }
    if let Some(layout) = &options.layout {
        return Err(layout_mismatch(options, layout));
    }
    if options.extensible {
        return Err(facet(options, "extensible"));
    }
    if options.preserve_raw {
        return Err(facet(options, "preserve_raw"));
    }
    validate_no_scalar_facets(options)?;
    if options.length != LengthMode::Either {
        return Err(facet(options, "length"));
    }
    Ok(())
}

/// Rejects facets that only make sense on scalars.
fn validate_no_scalar_facets(options: &TypeOptions) -> Result<(), ConfigError> {
    if options.size.is_some() {
        return Err(facet(options, "size"));
    }
    if options.chunk_size.is_some() {
        return Err(facet(options, "chunk_size"));
    }
    if options.int_width != Default::default() {
        return Err(facet(options, "int_width"));
    }
    Ok(())
}

/// Array fields: keys are the positions 0..n and optional fields trail.
fn validate_positional(options: &TypeOptions, fields: &[FieldSpec]) -> Result<(), ConfigError> {
    let ty = options.name;
    let mut optional_seen: Option<FieldKey> = None;
    for (position, field) in fields.iter().enumerate() {
        if field.key != FieldKey::Int(position as i64) {
            if fields[..position].iter().any(|f| f.key == field.key) {
                return Err(ConfigError::DuplicateKey { ty, key: field.key });
            }
            return Err(ConfigError::NonPositionalKey {
                ty,
                position,
                key: field.key,
            });
        }
        match (field.presence(), optional_seen) {
            (Presence::Optional, None) => optional_seen = Some(field.key),
            (Presence::Optional, Some(_)) => {}
            (_, Some(key)) => return Err(ConfigError::OptionalBeforeRequired { ty, key }),
            (_, None) => {}
        }
    }
    Ok(())
}

/// Map fields: at least one, unique keys, no nullable presence.
fn validate_keyed(options: &TypeOptions, fields: &[FieldSpec]) -> Result<(), ConfigError> {
    let ty = options.name;
    if fields.is_empty() {
        return Err(ConfigError::EmptyMap { ty });
    }
    let mut seen = FxHashSet::default();
    for field in fields {
        if !seen.insert(field.key) {
            return Err(ConfigError::DuplicateKey { ty, key: field.key });
        }
        if field.presence() == Presence::Nullable {
            return Err(facet(options, "nullable"));
        }
    }
    Ok(())
}

fn facet(options: &TypeOptions, facet: &'static str) -> ConfigError {
    ConfigError::FacetMismatch {
        ty: options.name,
        facet,
        kind: options.kind.name(),
    }
}

fn missing_layout(options: &TypeOptions) -> ConfigError {
    ConfigError::MissingLayout {
        ty: options.name,
        kind: options.kind.name(),
    }
}

fn layout_mismatch(options: &TypeOptions, layout: &Layout) -> ConfigError {
    ConfigError::LayoutMismatch {
        ty: options.name,
        kind: options.kind.name(),
        layout: layout.name(),
    }
}
