//! Array converter: tuples over a positional field map, and homogeneous
//! dynamic lists.

use std::any::Any;

use crate::codec::primitives::{Major, Reader, Writer};
use crate::codec::scalar::{read_literal, write_literal};
use crate::codec::serializer::{
    check_framing, read_value, write_value, DecodeContext, EncodeContext,
};
use crate::error::{DecodeError, EncodeError};
use crate::model::parts::{Content, ContentRef, Parts, PartsRef};
use crate::model::cbor_type::Object;
use crate::model::{FieldKind, FieldSpec, IntWidth, Layout, Presence, TypeOptions};

/// Encoded `null`.
const NULL: u8 = 0xf6;

/// Cursor over the elements of a definite or indefinite array or map.
pub(crate) struct Elements {
    remaining: Option<usize>,
}

impl Elements {
    /// Reads an array or map head of the expected major type.
    pub(crate) fn open(
        reader: &mut Reader,
        major: Major,
        options: &TypeOptions,
        ctx: &DecodeContext,
    ) -> Result<(Self, bool), DecodeError> {
        let ty = options.name;
        let header = reader.read_header(ty)?;
        if header.major != major {
            return Err(DecodeError::UnexpectedMajor {
                ty,
                expected: major.name(),
                found: header.major,
            });
        }
        let indefinite = header.is_indefinite();
        check_framing(options, indefinite)?;
        let remaining = if indefinite {
            None
        } else {
            Some(reader.read_length(&header, ctx.options.max_collection_len, ty)?)
        };
        Ok((Self { remaining }, indefinite))
    }

    /// Declared element count, or `None` when indefinite.
    pub(crate) fn declared(&self) -> Option<usize> {
        self.remaining
    }

    /// Returns true if another element follows. Consumes the break code
    /// ending an indefinite item.
    pub(crate) fn next(&mut self, reader: &mut Reader) -> Result<bool, DecodeError> {
        match self.remaining {
            Some(0) => Ok(false),
            Some(n) => {
                self.remaining = Some(n - 1);
                Ok(true)
            }
            None if reader.at_break() => {
                reader.read_break("indefinite item")?;
                self.remaining = Some(0);
                Ok(false)
            }
            None => Ok(true),
        }
    }
}

/// Preallocation bound: every element takes at least one byte.
pub(crate) fn capacity(elements: &Elements, reader: &Reader) -> usize {
    elements.declared().unwrap_or(0).min(reader.remaining_len())
}

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn read(
    reader: &mut Reader,
    options: &TypeOptions,
    ctx: &mut DecodeContext,
) -> Result<Parts, DecodeError> {
    let ty = options.name;
    let (mut elements, indefinite) = Elements::open(reader, Major::Array, options, ctx)?;
    let content = match &options.layout {
        Some(Layout::Items(item)) => {
            let mut items = Vec::with_capacity(capacity(&elements, reader));
            while elements.next(reader)? {
                items.push(read_value(reader, item, ctx)?);
            }
            Content::Items(items)
        }
        Some(Layout::Fields(fields)) => {
            Content::Fields(read_tuple(reader, options, fields, &mut elements, ctx)?)
        }
        _ => {
            return Err(DecodeError::UnexpectedParts {
                ty,
                expected: "array layout",
                found: "entries",
            })
        }
    };
    let mut parts = Parts::new(ty, content);
    parts.style_mut().indefinite = indefinite;
    Ok(parts)
}

fn read_tuple(
    reader: &mut Reader,
    options: &TypeOptions,
    fields: &[FieldSpec],
    elements: &mut Elements,
    ctx: &mut DecodeContext,
) -> Result<Vec<Option<Object>>, DecodeError> {
    let ty = options.name;
    let mut slots = Vec::with_capacity(options.slot_count());
    for field in fields {
        if !elements.next(reader)? {
            if field.presence() != Presence::Optional {
                return Err(DecodeError::MissingField { ty, key: field.key });
            }
            slots.push(None);
            continue;
        }
        match &field.kind {
            FieldKind::Literal(literal) => read_literal(reader, ty, field.key, *literal, ctx)?,
            FieldKind::Value { ty: child, presence } => {
                if *presence == Presence::Nullable && reader.peek_byte(ty)? == NULL {
                    reader.read_byte(ty)?;
                    slots.push(None);
                } else {
                    slots.push(Some(read_value(reader, child, ctx)?));
                }
            }
        }
    }

    let mut extra = 0;
    while elements.next(reader)? {
        reader.skip_value(ctx.remaining_depth())?;
        extra += 1;
    }
    if extra > 0 && !options.extensible {
        return Err(DecodeError::FieldCount {
            ty,
            expected: fields.len(),
            found: fields.len() + extra,
        });
    }
    Ok(slots)
}

// =============================================================================
// ENCODING
// =============================================================================

pub(crate) fn write(
    writer: &mut Writer,
    options: &TypeOptions,
    parts: PartsRef<'_>,
    ctx: &mut EncodeContext,
) -> Result<(), EncodeError> {
    let indefinite = ctx.indefinite(options.length, parts.style);
    match (&options.layout, parts.content) {
        (Some(Layout::Items(item)), ContentRef::Items(items)) => {
            open(writer, Major::Array, indefinite, items.len());
            for value in items {
                write_value(writer, item, value, ctx)?;
            }
        }
        (Some(Layout::Fields(fields)), ContentRef::Fields(slots)) => {
            let entries = pair_slots(options, fields, &slots)?;
            let len = entries
                .iter()
                .rposition(|(field, slot)| slot.is_some() || field.presence() != Presence::Optional)
                .map_or(0, |i| i + 1);
            open(writer, Major::Array, indefinite, len);
            for (field, slot) in &entries[..len] {
                match (&field.kind, slot) {
                    (FieldKind::Literal(literal), _) => write_literal(writer, *literal),
                    (FieldKind::Value { ty, .. }, Some(value)) => {
                        write_value(writer, ty, *value, ctx)?
                    }
                    (FieldKind::Value { presence: Presence::Nullable, .. }, None) => {
                        writer.write_null()
                    }
                    (FieldKind::Value { .. }, None) => {
                        return Err(EncodeError::MissingField {
                            ty: options.name,
                            key: field.key,
                        })
                    }
                }
            }
        }
        (layout, other) => {
            return Err(EncodeError::ShapeMismatch {
                ty: options.name,
                expected: layout.as_ref().map_or("layout", Layout::name),
                found: other.kind(),
            })
        }
    }
    if indefinite {
        writer.write_break();
    }
    Ok(())
}

/// Writes an array or map head.
pub(crate) fn open(writer: &mut Writer, major: Major, indefinite: bool, len: usize) {
    if indefinite {
        writer.write_indefinite(major);
    } else {
        writer.write_head(major, len as u64, IntWidth::Minimal);
    }
}

/// Pairs each field with its slot; literal fields get none.
pub(crate) fn pair_slots<'f, 'a>(
    options: &TypeOptions,
    fields: &'f [FieldSpec],
    slots: &[Option<&'a dyn Any>],
) -> Result<Vec<(&'f FieldSpec, Option<&'a dyn Any>)>, EncodeError> {
    if slots.len() != options.slot_count() {
        return Err(EncodeError::FieldCount {
            ty: options.name,
            expected: options.slot_count(),
            found: slots.len(),
        });
    }
    let mut values = slots.iter().copied();
    Ok(fields
        .iter()
        .map(|field| {
            let slot = if field.is_literal() {
                None
            } else {
                values.next().flatten()
            };
            (field, slot)
        })
        .collect())
}
