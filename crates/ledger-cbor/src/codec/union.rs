//! Union resolution by ordered trial decoding.
//!
//! The next item's span is captured once. Each candidate, in declared order,
//! decodes a fresh reader over exactly that span and must consume all of it.
//! The first success wins. When every candidate fails, the failures are
//! returned together as [`DecodeError::NoMatchingCandidate`].

use tracing::{debug, trace};

use crate::codec::primitives::{Reader, Writer};
use crate::codec::serializer::{read_value, write_value, DecodeContext, EncodeContext};
use crate::error::{CandidateFailure, DecodeError, EncodeError};
use crate::model::parts::{Content, ContentRef, Parts, PartsRef};
use crate::model::TypeOptions;

pub(crate) fn read(
    reader: &mut Reader,
    options: &TypeOptions,
    ctx: &mut DecodeContext,
) -> Result<Parts, DecodeError> {
    let ty = options.name;
    let span = reader.read_encoded_value(ctx.remaining_depth())?;
    let mut failures = Vec::with_capacity(options.candidates.len());

    for candidate in &options.candidates {
        let mut trial = Reader::new(span.clone());
        let result = read_value(&mut trial, candidate, ctx).and_then(|object| {
            if trial.is_empty() {
                Ok(object)
            } else {
                Err(DecodeError::TrailingBytes {
                    count: trial.remaining_len(),
                })
            }
        });
        match result {
            Ok(object) => return Ok(Parts::new(ty, Content::Variant(object))),
            // Misconfiguration is not a mismatch.
            Err(DecodeError::Config(err)) => return Err(DecodeError::Config(err)),
            Err(error) => {
                trace!(union = ty, candidate = candidate.name(), %error, "candidate rejected");
                failures.push(CandidateFailure {
                    candidate: candidate.name(),
                    error,
                });
            }
        }
    }

    debug!(union = ty, candidates = failures.len(), "no union candidate matched");
    Err(DecodeError::NoMatchingCandidate { ty, failures })
}

pub(crate) fn write(
    writer: &mut Writer,
    options: &TypeOptions,
    parts: PartsRef<'_>,
    ctx: &mut EncodeContext,
) -> Result<(), EncodeError> {
    let ty = options.name;
    let inner = match parts.content {
        ContentRef::Variant(inner) => inner,
        other => {
            return Err(EncodeError::ShapeMismatch {
                ty,
                expected: "variant",
                found: other.kind(),
            })
        }
    };
    let candidate = options
        .candidates
        .iter()
        .find(|candidate| candidate.matches(inner))
        .ok_or(EncodeError::NotACandidate { ty })?;
    write_value(writer, candidate, inner, ctx)
}
