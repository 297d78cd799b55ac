//! Primitive converters: booleans, integers, strings, null, embedded CBOR.

use crate::codec::primitives::{
    Header, Major, Reader, Writer, SIMPLE_FALSE, SIMPLE_NULL, SIMPLE_TRUE,
};
use crate::codec::serializer::{check_framing, DecodeContext};
use crate::error::{DecodeError, EncodeError};
use crate::limits::DEFAULT_CHUNK_SIZE;
use crate::model::parts::{Content, ContentRef, Parts, PartsRef, Scalar, ScalarRef, WireStyle};
use crate::model::{FieldKey, IntWidth, LengthMode, Literal, Primitive, TypeOptions};

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn read(
    reader: &mut Reader,
    primitive: Primitive,
    options: &TypeOptions,
    ctx: &mut DecodeContext,
) -> Result<Parts, DecodeError> {
    let ty = options.name;
    let header = reader.read_header(ty)?;
    let mut indefinite = false;
    let scalar = match primitive {
        Primitive::Bool => Scalar::Bool(read_bool(ty, &header)?),
        Primitive::Null => match (header.major, header.arg) {
            (Major::Simple, Some(SIMPLE_NULL)) => Scalar::Null,
            (Major::Simple, Some(found)) => return Err(DecodeError::UnexpectedSimple { ty, found }),
            _ => return Err(unexpected(ty, "null", &header)),
        },
        Primitive::Uint => match header.major {
            Major::Uint => Scalar::Uint(header.arg.unwrap_or(0)),
            _ => return Err(unexpected(ty, "unsigned integer", &header)),
        },
        Primitive::Int => match header.major {
            Major::Uint => Scalar::Uint(header.arg.unwrap_or(0)),
            Major::Nint => Scalar::Nint(header.arg.unwrap_or(0)),
            _ => return Err(unexpected(ty, "integer", &header)),
        },
        Primitive::Bytes | Primitive::Embedded | Primitive::Text => {
            let major = if primitive == Primitive::Text {
                Major::Text
            } else {
                Major::Bytes
            };
            if header.major != major {
                return Err(unexpected(ty, major.name(), &header));
            }
            indefinite = header.is_indefinite();
            check_framing(options, indefinite)?;
            let payload = reader.read_string_payload(&header, ctx.options.max_string_len, ty)?;
            if let Some(expected) = options.size {
                if payload.len() != expected {
                    return Err(DecodeError::SizeMismatch {
                        ty,
                        expected,
                        found: payload.len(),
                    });
                }
            }
            if major == Major::Text {
                let text = String::from_utf8(payload.to_vec())
                    .map_err(|_| DecodeError::InvalidUtf8 { context: ty })?;
                Scalar::Text(text)
            } else {
                Scalar::Bytes(payload)
            }
        }
    };
    let mut parts = Parts::new(ty, Content::Scalar(scalar));
    parts.style_mut().indefinite = indefinite;
    Ok(parts)
}

fn read_bool(ty: &'static str, header: &Header) -> Result<bool, DecodeError> {
    match (header.major, header.arg) {
        (Major::Simple, Some(SIMPLE_FALSE)) => Ok(false),
        (Major::Simple, Some(SIMPLE_TRUE)) => Ok(true),
        (Major::Simple, Some(found)) => Err(DecodeError::UnexpectedSimple { ty, found }),
        _ => Err(unexpected(ty, "bool", header)),
    }
}

fn unexpected(ty: &'static str, expected: &'static str, header: &Header) -> DecodeError {
    DecodeError::UnexpectedMajor {
        ty,
        expected,
        found: header.major,
    }
}

/// Reads a field that must hold `literal`.
pub(crate) fn read_literal(
    reader: &mut Reader,
    ty: &'static str,
    key: FieldKey,
    literal: Literal,
    ctx: &DecodeContext,
) -> Result<(), DecodeError> {
    let header = reader.read_header(ty)?;
    let matched = match (literal, header.major, header.arg) {
        (Literal::Int(n), Major::Uint, Some(arg)) => n >= 0 && arg == n as u64,
        (Literal::Int(n), Major::Nint, Some(arg)) => n < 0 && arg == (-1 - n) as u64,
        (Literal::Bool(b), Major::Simple, Some(_)) => read_bool(ty, &header).ok() == Some(b),
        (Literal::Text(s), Major::Text, _) => {
            let payload = reader.read_string_payload(&header, ctx.options.max_string_len, ty)?;
            payload == s.as_bytes()
        }
        _ => false,
    };
    if matched {
        Ok(())
    } else {
        Err(DecodeError::LiteralMismatch {
            ty,
            key,
            expected: literal,
        })
    }
}

// =============================================================================
// ENCODING
// =============================================================================

pub(crate) fn write(
    writer: &mut Writer,
    primitive: Primitive,
    options: &TypeOptions,
    parts: PartsRef<'_>,
) -> Result<(), EncodeError> {
    let ty = options.name;
    let scalar = match parts.content {
        ContentRef::Scalar(scalar) => scalar,
        other => {
            return Err(EncodeError::ShapeMismatch {
                ty,
                expected: "scalar",
                found: other.kind(),
            })
        }
    };
    match (primitive, scalar) {
        (Primitive::Bool, ScalarRef::Bool(value)) => writer.write_bool(value),
        (Primitive::Null, ScalarRef::Null) => writer.write_null(),
        (Primitive::Uint | Primitive::Int, ScalarRef::Uint(value)) => {
            check_width(ty, options.int_width, value)?;
            writer.write_head(Major::Uint, value, options.int_width);
        }
        (Primitive::Int, ScalarRef::Int(value)) => {
            let magnitude = if value >= 0 {
                value as u64
            } else {
                (-1 - value) as u64
            };
            check_width(ty, options.int_width, magnitude)?;
            writer.write_int(value, options.int_width);
        }
        (Primitive::Bytes | Primitive::Embedded, ScalarRef::Bytes(payload)) => {
            write_string(writer, Major::Bytes, payload, options, parts.style)?;
        }
        (Primitive::Text, ScalarRef::Text(text)) => {
            write_string(writer, Major::Text, text.as_bytes(), options, parts.style)?;
        }
        (_, other) => {
            return Err(EncodeError::ShapeMismatch {
                ty,
                expected: primitive.name(),
                found: other.kind(),
            })
        }
    }
    Ok(())
}

fn check_width(ty: &'static str, width: IntWidth, value: u64) -> Result<(), EncodeError> {
    if width.fits(value) {
        Ok(())
    } else {
        Err(EncodeError::IntegerWidth { ty, value })
    }
}

fn write_string(
    writer: &mut Writer,
    major: Major,
    payload: &[u8],
    options: &TypeOptions,
    style: Option<WireStyle>,
) -> Result<(), EncodeError> {
    if let Some(expected) = options.size {
        if payload.len() != expected {
            return Err(EncodeError::SizeMismatch {
                ty: options.name,
                expected,
                found: payload.len(),
            });
        }
    }
    let indefinite = match options.length {
        LengthMode::Definite => false,
        LengthMode::Indefinite => true,
        LengthMode::Either => {
            style.is_some_and(|s| s.indefinite)
                || options.chunk_size.is_some_and(|size| payload.len() > size)
        }
    };
    if !indefinite {
        writer.write_string(major, payload);
        return Ok(());
    }
    let size = options.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
    writer.write_indefinite(major);
    for chunk in split_chunks(payload, size, major == Major::Text) {
        writer.write_string(major, chunk);
    }
    writer.write_break();
    Ok(())
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xc0 == 0x80
}

/// Splits `payload` into chunks of at most `size` bytes; text chunks end on
/// character boundaries.
fn split_chunks(payload: &[u8], size: usize, text: bool) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < payload.len() {
        let mut end = (start + size).min(payload.len());
        if text {
            while end > start && end < payload.len() && is_continuation(payload[end]) {
                end -= 1;
            }
            // A single character wider than the chunk size.
            if end == start {
                end = start + 1;
                while end < payload.len() && is_continuation(payload[end]) {
                    end += 1;
                }
            }
        }
        chunks.push(&payload[start..end]);
        start = end;
    }
    chunks
}

/// Writes a literal field value.
pub(crate) fn write_literal(writer: &mut Writer, literal: Literal) {
    match literal {
        Literal::Int(n) => writer.write_int(n, IntWidth::Minimal),
        Literal::Text(s) => writer.write_text(s),
        Literal::Bool(b) => writer.write_bool(b),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::codec::{deserialize, serialize};
    use crate::model::{CborType, Schema};

    /// Bytes that always travel as an indefinite string.
    #[derive(Debug, PartialEq)]
    struct Chunked(Bytes);

    impl CborType for Chunked {
        fn schema() -> Schema {
            Schema::primitive(Primitive::Bytes).indefinite().chunk_size(2)
        }

        fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
            Bytes::from_parts(parts).map(Chunked)
        }

        fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
            Ok(PartsRef::scalar(ScalarRef::Bytes(&self.0)))
        }
    }

    /// A 4-byte key hash.
    #[derive(Debug, PartialEq)]
    struct KeyHash(Bytes);

    impl CborType for KeyHash {
        fn schema() -> Schema {
            Schema::primitive(Primitive::Bytes).size(4)
        }

        fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
            Bytes::from_parts(parts).map(KeyHash)
        }

        fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
            Ok(PartsRef::scalar(ScalarRef::Bytes(&self.0)))
        }
    }

    /// A coin amount always written with a 4-byte argument.
    #[derive(Debug, PartialEq)]
    struct Coin(u64);

    impl CborType for Coin {
        fn schema() -> Schema {
            Schema::primitive(Primitive::Uint).int_width(IntWidth::U32)
        }

        fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
            u64::from_parts(parts).map(Coin)
        }

        fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
            Ok(PartsRef::scalar(ScalarRef::Uint(self.0)))
        }
    }

    #[test]
    fn test_scalars() {
        assert_eq!(serialize(&true).unwrap(), vec![0xf5]);
        assert_eq!(serialize(&-500i64).unwrap(), vec![0x39, 0x01, 0xf3]);
        assert_eq!(deserialize::<i64>(vec![0x39, 0x01, 0xf3]).unwrap(), -500);
        assert_eq!(serialize(&"ab".to_string()).unwrap(), vec![0x62, 0x61, 0x62]);
        assert_eq!(deserialize::<crate::model::Null>(vec![0xf6]).unwrap(), crate::model::Null);
    }

    #[test]
    fn test_integer_shape_errors() {
        assert!(matches!(
            deserialize::<u64>(vec![0x20]),
            Err(DecodeError::UnexpectedMajor { found: Major::Nint, .. })
        ));
        assert!(matches!(
            deserialize::<bool>(vec![0xf6]),
            Err(DecodeError::UnexpectedSimple { found: 22, .. })
        ));
        // -2^64 does not fit i64.
        let min = [0x3b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(
            deserialize::<i64>(min.to_vec()),
            Err(DecodeError::IntegerOverflow { ty: "i64" })
        ));
        assert!(matches!(
            deserialize::<u32>(vec![0x1b, 0, 0, 0, 1, 0, 0, 0, 0]),
            Err(DecodeError::IntegerOverflow { ty: "u32" })
        ));
    }

    #[test]
    fn test_indefinite_text_accepted() {
        // (_ "he", "llo")
        let bytes = vec![0x7f, 0x62, 0x68, 0x65, 0x63, 0x6c, 0x6c, 0x6f, 0xff];
        assert_eq!(deserialize::<String>(bytes).unwrap(), "hello");
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            deserialize::<String>(vec![0x62, 0xc3, 0x28]),
            Err(DecodeError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn test_chunked_encoding() {
        let value = Chunked(Bytes::from_static(&[1, 2, 3]));
        let bytes = serialize(&value).unwrap();
        assert_eq!(bytes, vec![0x5f, 0x42, 0x01, 0x02, 0x41, 0x03, 0xff]);
        assert_eq!(deserialize::<Chunked>(bytes).unwrap(), value);

        // Indefinite-only types reject definite strings.
        assert!(matches!(
            deserialize::<Chunked>(vec![0x41, 0x01]),
            Err(DecodeError::FramingMismatch { expected: "indefinite", .. })
        ));
    }

    #[test]
    fn test_text_chunks_split_on_char_boundaries() {
        let text = "aé€";
        let chunks = split_chunks(text.as_bytes(), 2, true);
        for chunk in &chunks {
            assert!(std::str::from_utf8(chunk).is_ok());
        }
        assert_eq!(chunks.concat(), text.as_bytes());
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_size_constraint() {
        let ok = KeyHash(Bytes::from_static(&[1, 2, 3, 4]));
        let bytes = serialize(&ok).unwrap();
        assert_eq!(deserialize::<KeyHash>(bytes).unwrap(), ok);

        assert!(matches!(
            serialize(&KeyHash(Bytes::from_static(&[1, 2]))),
            Err(EncodeError::SizeMismatch { expected: 4, found: 2, .. })
        ));
        assert!(matches!(
            deserialize::<KeyHash>(vec![0x41, 0x01]),
            Err(DecodeError::SizeMismatch { expected: 4, found: 1, .. })
        ));
    }

    #[test]
    fn test_int_width() {
        assert_eq!(serialize(&Coin(1)).unwrap(), vec![0x1a, 0, 0, 0, 1]);
        assert_eq!(deserialize::<Coin>(vec![0x01]).unwrap(), Coin(1));
        assert!(matches!(
            serialize(&Coin(u64::MAX)),
            Err(EncodeError::IntegerWidth { .. })
        ));
    }

    #[test]
    fn test_literal_matching() {
        let ctx = DecodeContext::new(Default::default());
        let mut reader = Reader::new(Bytes::from_static(&[0x20, 0x63, 0x66, 0x6f, 0x6f, 0xf4]));
        read_literal(&mut reader, "T", FieldKey::Int(0), Literal::Int(-1), &ctx).unwrap();
        read_literal(&mut reader, "T", FieldKey::Int(1), Literal::Text("foo"), &ctx).unwrap();
        assert!(matches!(
            read_literal(&mut reader, "T", FieldKey::Int(2), Literal::Bool(true), &ctx),
            Err(DecodeError::LiteralMismatch { expected: Literal::Bool(true), .. })
        ));
    }
}
