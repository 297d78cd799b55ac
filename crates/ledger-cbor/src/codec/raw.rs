//! Raw preservation: decoded spans are kept and replayed verbatim.

use std::any::Any;

use tracing::trace;

use crate::codec::primitives::{Reader, Writer};
use crate::codec::serializer::{read_parts, DecodeContext};
use crate::error::DecodeError;
use crate::model::cbor_type::{Object, TypeRef};
use crate::model::TypeOptions;

/// Decodes a preserve-raw value, handing it the exact bytes it came from.
pub(crate) fn read_preserved(
    reader: &mut Reader,
    ty: &TypeRef,
    options: &TypeOptions,
    ctx: &mut DecodeContext,
) -> Result<Object, DecodeError> {
    let start = reader.position();
    let mut parts = read_parts(reader, options, ctx)?;
    parts.set_raw(reader.slice(start, reader.position()));
    (ty.construct)(parts)
}

/// Writes the value's preserved span, if it has one.
pub(crate) fn replay(writer: &mut Writer, ty: &TypeRef, value: &dyn Any) -> bool {
    match (ty.raw)(value) {
        Some(raw) => {
            trace!(ty = ty.name(), len = raw.len(), "replaying preserved bytes");
            writer.write_bytes(raw);
            true
        }
        None => false,
    }
}
