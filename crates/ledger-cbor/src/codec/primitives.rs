//! CBOR item heads, and the reader/writer every converter works over.
//!
//! A data item starts with one initial byte: the major type in the top three
//! bits and the additional info in the low five. Additional info below 24 is
//! the argument itself; 24 to 27 announce a 1, 2, 4 or 8 byte big-endian
//! argument; 31 marks indefinite length (or the break code under major 7).

use std::fmt;

use bytes::Bytes;

use crate::error::DecodeError;
use crate::model::IntWidth;

/// Break code terminating indefinite-length items.
pub const BREAK: u8 = 0xff;

/// Simple value `false`.
pub const SIMPLE_FALSE: u64 = 20;
/// Simple value `true`.
pub const SIMPLE_TRUE: u64 = 21;
/// Simple value `null`.
pub const SIMPLE_NULL: u64 = 22;

/// CBOR major type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Major {
    Uint = 0,
    Nint = 1,
    Bytes = 2,
    Text = 3,
    Array = 4,
    Map = 5,
    Tag = 6,
    Simple = 7,
}

impl Major {
    /// Extracts the major type from an initial byte.
    pub fn from_initial(byte: u8) -> Self {
        match byte >> 5 {
            0 => Major::Uint,
            1 => Major::Nint,
            2 => Major::Bytes,
            3 => Major::Text,
            4 => Major::Array,
            5 => Major::Map,
            6 => Major::Tag,
            _ => Major::Simple,
        }
    }

    /// Returns the initial-byte bits for this major type.
    pub fn bits(self) -> u8 {
        (self as u8) << 5
    }

    pub fn name(self) -> &'static str {
        match self {
            Major::Uint => "unsigned integer",
            Major::Nint => "negative integer",
            Major::Bytes => "byte string",
            Major::Text => "text string",
            Major::Array => "array",
            Major::Map => "map",
            Major::Tag => "tag",
            Major::Simple => "simple value",
        }
    }

    fn allows_indefinite(self) -> bool {
        matches!(
            self,
            Major::Bytes | Major::Text | Major::Array | Major::Map | Major::Simple
        )
    }
}

impl fmt::Display for Major {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded item head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub major: Major,
    pub info: u8,
    /// The argument, or `None` for indefinite length (and for break).
    pub arg: Option<u64>,
}

impl Header {
    pub fn is_break(&self) -> bool {
        self.major == Major::Simple && self.arg.is_none()
    }

    pub fn is_indefinite(&self) -> bool {
        self.arg.is_none()
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding CBOR.
///
/// Wraps a shared buffer; slices handed out by [`read_bytes`](Reader::read_bytes)
/// and [`slice`](Reader::slice) are zero-copy views that keep the buffer
/// alive.
#[derive(Debug, Clone)]
pub struct Reader {
    data: Bytes,
    pos: usize,
}

impl Reader {
    /// Creates a new reader over `data`.
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the bytes between two positions already visited.
    pub fn slice(&self, start: usize, end: usize) -> Bytes {
        self.data.slice(start..end)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        let byte = self.peek_byte(context)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Returns the next byte without consuming it.
    #[inline]
    pub fn peek_byte(&self, context: &'static str) -> Result<u8, DecodeError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::UnexpectedEof { context })
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<Bytes, DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(bytes)
    }

    fn read_array<const N: usize>(
        &mut self,
        context: &'static str,
    ) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.read_bytes(N, context)?);
        Ok(out)
    }

    /// Reads an item head.
    pub fn read_header(&mut self, context: &'static str) -> Result<Header, DecodeError> {
        let initial = self.read_byte(context)?;
        let major = Major::from_initial(initial);
        let info = initial & 0x1f;
        let arg = match info {
            0..=23 => Some(info as u64),
            24 => Some(self.read_byte(context)? as u64),
            25 => Some(u16::from_be_bytes(self.read_array(context)?) as u64),
            26 => Some(u32::from_be_bytes(self.read_array(context)?) as u64),
            27 => Some(u64::from_be_bytes(self.read_array(context)?)),
            31 if major.allows_indefinite() => None,
            _ => return Err(DecodeError::InvalidAdditionalInfo { info, context }),
        };
        Ok(Header { major, info, arg })
    }

    /// Returns the next item head without consuming it.
    pub fn peek_header(&self, context: &'static str) -> Result<Header, DecodeError> {
        self.clone().read_header(context)
    }

    /// Returns true if the next byte is the break code.
    pub fn at_break(&self) -> bool {
        self.data.get(self.pos) == Some(&BREAK)
    }

    /// Consumes a break code.
    pub fn read_break(&mut self, context: &'static str) -> Result<(), DecodeError> {
        match self.read_byte(context)? {
            BREAK => Ok(()),
            _ => Err(DecodeError::InvalidChunk { context }),
        }
    }

    /// Reads a definite-length argument, bounded by `max`.
    pub fn read_length(
        &mut self,
        header: &Header,
        max: u64,
        field: &'static str,
    ) -> Result<usize, DecodeError> {
        let len = header.arg.unwrap_or(0);
        if len > max {
            return Err(DecodeError::LengthExceedsLimit { field, len, max });
        }
        usize::try_from(len).map_err(|_| DecodeError::LengthExceedsLimit { field, len, max })
    }

    /// Reads the payload of a byte/text string whose head was just read.
    ///
    /// Indefinite strings are concatenated from their definite chunks.
    pub fn read_string_payload(
        &mut self,
        header: &Header,
        max: u64,
        context: &'static str,
    ) -> Result<Bytes, DecodeError> {
        if !header.is_indefinite() {
            let len = self.read_length(header, max, context)?;
            return self.read_bytes(len, context);
        }
        let mut out = Vec::new();
        loop {
            if self.at_break() {
                self.read_break(context)?;
                return Ok(Bytes::from(out));
            }
            let chunk = self.read_header(context)?;
            if chunk.major != header.major || chunk.is_indefinite() {
                return Err(DecodeError::InvalidChunk { context });
            }
            let len = self.read_length(&chunk, max, context)?;
            let total = (out.len() as u64).saturating_add(len as u64);
            if total > max || out.len().checked_add(len).is_none() {
                return Err(DecodeError::LengthExceedsLimit {
                    field: context,
                    len: total,
                    max,
                });
            }
            out.extend_from_slice(&self.read_bytes(len, context)?);
        }
    }

    /// Skips one complete data item.
    pub fn skip_value(&mut self, max_depth: usize) -> Result<(), DecodeError> {
        self.skip_nested(0, max_depth)
    }

    fn skip_nested(&mut self, level: usize, max_depth: usize) -> Result<(), DecodeError> {
        if level > max_depth {
            return Err(DecodeError::DepthExceeded { max: max_depth });
        }
        let header = self.read_header("item")?;
        match (header.major, header.arg) {
            (Major::Uint | Major::Nint, _) | (Major::Simple, Some(_)) => Ok(()),
            (Major::Simple, None) => Err(DecodeError::UnexpectedBreak { context: "item" }),
            (Major::Bytes | Major::Text, Some(len)) => {
                let len = usize::try_from(len)
                    .map_err(|_| DecodeError::UnexpectedEof { context: "string" })?;
                self.read_bytes(len, "string").map(|_| ())
            }
            (Major::Bytes | Major::Text, None) => {
                self.read_string_payload(&header, u64::MAX, "string").map(|_| ())
            }
            (Major::Array, Some(len)) => {
                for _ in 0..len {
                    self.skip_nested(level + 1, max_depth)?;
                }
                Ok(())
            }
            (Major::Map, Some(len)) => {
                for _ in 0..len {
                    self.skip_nested(level + 1, max_depth)?;
                    self.skip_nested(level + 1, max_depth)?;
                }
                Ok(())
            }
            (Major::Array | Major::Map, None) => {
                let per_entry = if header.major == Major::Map { 2 } else { 1 };
                while !self.at_break() {
                    for _ in 0..per_entry {
                        self.skip_nested(level + 1, max_depth)?;
                    }
                }
                self.read_break("indefinite item")
            }
            (Major::Tag, _) => self.skip_nested(level + 1, max_depth),
        }
    }

    /// Consumes one complete data item and returns its exact bytes.
    pub fn read_encoded_value(&mut self, max_depth: usize) -> Result<Bytes, DecodeError> {
        let start = self.pos;
        self.skip_value(max_depth)?;
        Ok(self.slice(start, self.pos))
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding CBOR.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an item head with at least the requested argument width.
    pub fn write_head(&mut self, major: Major, value: u64, width: IntWidth) {
        let minimal = match value {
            0..=23 => 0,
            24..=0xff => 24,
            0x100..=0xffff => 25,
            0x1_0000..=0xffff_ffff => 26,
            _ => 27,
        };
        let requested = match width {
            IntWidth::Minimal => 0,
            IntWidth::U8 => 24,
            IntWidth::U16 => 25,
            IntWidth::U32 => 26,
            IntWidth::U64 => 27,
        };
        let m = major.bits();
        match minimal.max(requested) {
            0 => self.write_byte(m | value as u8),
            24 => {
                self.write_byte(m | 24);
                self.write_byte(value as u8);
            }
            25 => {
                self.write_byte(m | 25);
                self.write_bytes(&(value as u16).to_be_bytes());
            }
            26 => {
                self.write_byte(m | 26);
                self.write_bytes(&(value as u32).to_be_bytes());
            }
            _ => {
                self.write_byte(m | 27);
                self.write_bytes(&value.to_be_bytes());
            }
        }
    }

    /// Writes the head of an indefinite-length item.
    pub fn write_indefinite(&mut self, major: Major) {
        self.write_byte(major.bits() | 31);
    }

    pub fn write_break(&mut self) {
        self.write_byte(BREAK);
    }

    pub fn write_tag(&mut self, tag: u64) {
        self.write_head(Major::Tag, tag, IntWidth::Minimal);
    }

    pub fn write_uint(&mut self, value: u64) {
        self.write_head(Major::Uint, value, IntWidth::Minimal);
    }

    /// Writes a signed integer (major 1 for negatives).
    pub fn write_int(&mut self, value: i64, width: IntWidth) {
        if value >= 0 {
            self.write_head(Major::Uint, value as u64, width);
        } else {
            self.write_head(Major::Nint, (-1 - value) as u64, width);
        }
    }

    pub fn write_bool(&mut self, value: bool) {
        let simple = if value { SIMPLE_TRUE } else { SIMPLE_FALSE };
        self.write_byte(Major::Simple.bits() | simple as u8);
    }

    pub fn write_null(&mut self) {
        self.write_byte(Major::Simple.bits() | SIMPLE_NULL as u8);
    }

    /// Writes a definite byte or text string.
    pub fn write_string(&mut self, major: Major, payload: &[u8]) {
        self.write_head(major, payload.len() as u64, IntWidth::Minimal);
        self.write_bytes(payload);
    }

    pub fn write_text(&mut self, text: &str) {
        self.write_string(Major::Text, text.as_bytes());
    }
}
