//! Constructor converter: a tagged array of fields.
//!
//! Alternative index `i` selects the tag:
//!
//! | index      | encoding                      |
//! |------------|-------------------------------|
//! | 0..=6      | `tag(121 + i)([fields])`      |
//! | 7..=127    | `tag(1280 + i - 7)([fields])` |
//! | otherwise  | `tag(102)([i, [fields]])`     |
//!
//! The general tag-102 form is accepted for every index on decode and can be
//! forced on encode with [`Alternative::General`].

use crate::codec::list;
use crate::codec::primitives::{Major, Reader, Writer};
use crate::codec::serializer::{DecodeContext, EncodeContext};
use crate::error::{DecodeError, EncodeError};
use crate::model::parts::{Parts, PartsRef};
use crate::model::{Alternative, IntWidth, TypeOptions};

/// Tag of the general constructor form.
pub const TAG_GENERAL: u64 = 102;

/// Returns the compact tag for constructor `index`, if it has one.
pub fn compact_tag(index: u64) -> Option<u64> {
    match index {
        0..=6 => Some(121 + index),
        7..=127 => Some(1280 + index - 7),
        _ => None,
    }
}

/// Returns the constructor index a compact tag stands for.
pub fn compact_index(tag: u64) -> Option<u64> {
    match tag {
        121..=127 => Some(tag - 121),
        1280..=1400 => Some(tag - 1280 + 7),
        _ => None,
    }
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
    let header = reader.read_header(ty)?;
    if header.major != Major::Tag {
        return Err(DecodeError::UnexpectedMajor {
            ty,
            expected: "constructor tag",
            found: header.major,
        });
    }
    let tag = header.arg.unwrap_or(0);
    let index = match compact_index(tag) {
        Some(index) => index,
        None if tag == TAG_GENERAL => read_general_index(reader, ty)?,
        None => return Err(DecodeError::UnknownConstructorTag { ty, tag }),
    };
    match options.alternative {
        Some(Alternative::Index(expected) | Alternative::General(expected)) if expected != index => {
            return Err(DecodeError::ConstructorIndexMismatch {
                ty,
                expected,
                found: index,
            });
        }
        _ => {}
    }
    let mut parts = list::read(reader, options, ctx)?;
    parts.set_alternative(index);
    Ok(parts)
}

/// Reads `[index,` of the general form, leaving the field array next.
fn read_general_index(reader: &mut Reader, ty: &'static str) -> Result<u64, DecodeError> {
    let header = reader.read_header(ty)?;
    if header.major != Major::Array || header.arg != Some(2) {
        return Err(DecodeError::UnexpectedMajor {
            ty,
            expected: "general constructor pair",
            found: header.major,
        });
    }
    let index = reader.read_header(ty)?;
    match (index.major, index.arg) {
        (Major::Uint, Some(index)) => Ok(index),
        (found, _) => Err(DecodeError::UnexpectedMajor {
            ty,
            expected: "constructor index",
            found,
        }),
    }
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
    let (index, general) = match options.alternative {
        Some(Alternative::General(index)) => (index, true),
        Some(Alternative::Index(index)) => (index, false),
        Some(Alternative::Any) | None => {
            let index = parts
                .alternative
                .ok_or(EncodeError::MissingAlternative { ty: options.name })?;
            (index, false)
        }
    };
    match compact_tag(index).filter(|_| !general) {
        Some(tag) => writer.write_tag(tag),
        None => {
            writer.write_tag(TAG_GENERAL);
            writer.write_head(Major::Array, 2, IntWidth::Minimal);
            writer.write_uint(index);
        }
    }
    list::write(writer, options, parts, ctx)
}
