//! Declarative per-type configuration.
//!
//! A [`Schema`] holds the facets a type declares about its wire shape. Every
//! facet is optional: a type may declare only the facets it overrides and
//! inherit the rest from a parent skeleton via [`Schema::inherit`]. The
//! registry merges the chain with [`Schema::merge`] (closest wins, per facet)
//! and publishes the result as [`TypeOptions`](crate::model::TypeOptions).

use std::fmt;

use crate::model::cbor_type::{CborType, TypeRef};

/// Scalar kinds handled by the primitive converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Simple values 20/21.
    Bool,
    /// Major type 0.
    Uint,
    /// Major types 0 and 1.
    Int,
    /// Major type 2.
    Bytes,
    /// Major type 3.
    Text,
    /// Simple value 22.
    Null,
    /// Byte string whose payload is itself CBOR (always preserve-raw).
    Embedded,
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Uint => "uint",
            Primitive::Int => "int",
            Primitive::Bytes => "bytes",
            Primitive::Text => "text",
            Primitive::Null => "null",
            Primitive::Embedded => "embedded",
        }
    }

    /// Returns true for the string-shaped primitives.
    pub fn is_string(&self) -> bool {
        matches!(self, Primitive::Bytes | Primitive::Text | Primitive::Embedded)
    }
}

/// Which converter family handles a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConverterKind {
    Primitive(Primitive),
    List,
    Map,
    Constructor,
    Union,
}

impl ConverterKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConverterKind::Primitive(p) => p.name(),
            ConverterKind::List => "list",
            ConverterKind::Map => "map",
            ConverterKind::Constructor => "constructor",
            ConverterKind::Union => "union",
        }
    }
}

/// Definite/indefinite framing accepted on decode and chosen on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LengthMode {
    /// Only definite-length encodings are accepted and emitted.
    Definite,
    /// Only indefinite-length encodings are accepted and emitted.
    Indefinite,
    /// Both are accepted; the emitted form follows the recorded wire style,
    /// falling back to [`EncodeOptions`](crate::codec::EncodeOptions).
    #[default]
    Either,
}

/// Argument width used when emitting integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IntWidth {
    /// Shortest encoding (immediate for values below 24).
    #[default]
    Minimal,
    U8,
    U16,
    U32,
    U64,
}

impl IntWidth {
    /// Returns true if `value` can be written with this width.
    pub fn fits(&self, value: u64) -> bool {
        match self {
            IntWidth::Minimal | IntWidth::U64 => true,
            IntWidth::U8 => value <= u8::MAX as u64,
            IntWidth::U16 => value <= u16::MAX as u64,
            IntWidth::U32 => value <= u32::MAX as u64,
        }
    }
}

/// CBOR tag wrapping an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagRule {
    /// The tag must be present.
    Required(u64),
    /// The tag may be present; its presence is remembered in
    /// [`WireStyle::tagged`](crate::model::WireStyle).
    Optional(u64),
}

impl TagRule {
    pub fn number(&self) -> u64 {
        match self {
            TagRule::Required(n) | TagRule::Optional(n) => *n,
        }
    }
}

/// Constructor alternative (sum-type discriminator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alternative {
    /// Fixed index, compact tag form where one exists.
    Index(u64),
    /// Fixed index, always the tag-102 general form.
    General(u64),
    /// Any index is accepted; the value carries it.
    Any,
}

/// Wire key of a field: array position, integer map key or text map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Int(i64),
    Text(&'static str),
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Int(n) => write!(f, "{}", n),
            FieldKey::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i32> for FieldKey {
    fn from(value: i32) -> Self {
        FieldKey::Int(value as i64)
    }
}

impl From<i64> for FieldKey {
    fn from(value: i64) -> Self {
        FieldKey::Int(value)
    }
}

impl From<&'static str> for FieldKey {
    fn from(value: &'static str) -> Self {
        FieldKey::Text(value)
    }
}

/// A constant a field must hold on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Literal {
    Int(i64),
    Text(&'static str),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Text(s) => write!(f, "{:?}", s),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// How a field's absence is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// Always present.
    Required,
    /// May be missing from the wire (map key omitted, or trailing array
    /// element omitted).
    Optional,
    /// Always occupies its array position; absence is CBOR null.
    Nullable,
}

/// What a field slot carries.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A value of the child type.
    Value { ty: TypeRef, presence: Presence },
    /// A constant with no counterpart in the value; checked on decode and
    /// written on encode.
    Literal(Literal),
}

/// One entry of a field map.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Returns the child type, or `None` for literal fields.
    pub fn value_type(&self) -> Option<&TypeRef> {
        match &self.kind {
            FieldKind::Value { ty, .. } => Some(ty),
            FieldKind::Literal(_) => None,
        }
    }

    /// Returns the presence rule; literals count as required.
    pub fn presence(&self) -> Presence {
        match &self.kind {
            FieldKind::Value { presence, .. } => *presence,
            FieldKind::Literal(_) => Presence::Required,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, FieldKind::Literal(_))
    }
}

/// Child layout of a composite type.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// Ordered field map (tuple positions or map keys).
    Fields(Vec<FieldSpec>),
    /// Homogeneous elements, dynamic count.
    Items(TypeRef),
    /// Homogeneous key/value entries, dynamic count.
    Entries { key: TypeRef, value: TypeRef },
}

impl Layout {
    pub fn name(&self) -> &'static str {
        match self {
            Layout::Fields(_) => "fields",
            Layout::Items(_) => "items",
            Layout::Entries { .. } => "entries",
        }
    }
}

/// Declared configuration facets of one type.
///
/// Unset facets are filled from the parent chain at resolution time.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub(crate) kind: Option<ConverterKind>,
    pub(crate) tag: Option<TagRule>,
    pub(crate) alternative: Option<Alternative>,
    pub(crate) length: Option<LengthMode>,
    pub(crate) layout: Option<Layout>,
    pub(crate) candidates: Option<Vec<TypeRef>>,
    pub(crate) preserve_raw: Option<bool>,
    pub(crate) extensible: Option<bool>,
    pub(crate) size: Option<usize>,
    pub(crate) chunk_size: Option<usize>,
    pub(crate) int_width: Option<IntWidth>,
    pub(crate) parent: Option<fn() -> Schema>,
}

impl Schema {
    /// Creates a schema with no facets set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Self::new().kind(ConverterKind::Primitive(primitive))
    }

    pub fn list() -> Self {
        Self::new().kind(ConverterKind::List)
    }

    pub fn map() -> Self {
        Self::new().kind(ConverterKind::Map)
    }

    /// Constructor with a fixed alternative index.
    pub fn constructor(index: u64) -> Self {
        Self::new()
            .kind(ConverterKind::Constructor)
            .alternative(Alternative::Index(index))
    }

    /// Constructor accepting any alternative index.
    pub fn constructor_any() -> Self {
        Self::new()
            .kind(ConverterKind::Constructor)
            .alternative(Alternative::Any)
    }

    pub fn union() -> Self {
        Self::new().kind(ConverterKind::Union)
    }

    /// Starts a schema that inherits unset facets from `parent`.
    pub fn inherit(parent: fn() -> Schema) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    pub fn kind(mut self, kind: ConverterKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Requires tag `tag` around the item.
    pub fn tag(mut self, tag: u64) -> Self {
        self.tag = Some(TagRule::Required(tag));
        self
    }

    /// Accepts tag `tag` around the item but does not require it.
    pub fn optional_tag(mut self, tag: u64) -> Self {
        self.tag = Some(TagRule::Optional(tag));
        self
    }

    pub fn alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = Some(alternative);
        self
    }

    /// Forces the tag-102 general constructor form for `index`.
    pub fn general(self, index: u64) -> Self {
        self.alternative(Alternative::General(index))
    }

    pub fn length(mut self, length: LengthMode) -> Self {
        self.length = Some(length);
        self
    }

    pub fn definite(self) -> Self {
        self.length(LengthMode::Definite)
    }

    pub fn indefinite(self) -> Self {
        self.length(LengthMode::Indefinite)
    }

    /// Marks the type as preserve-raw.
    pub fn preserve_raw(mut self) -> Self {
        self.preserve_raw = Some(true);
        self
    }

    /// Allows unknown trailing elements (lists) or unknown keys (maps).
    pub fn extensible(mut self) -> Self {
        self.extensible = Some(true);
        self
    }

    /// Requires an exact payload length for string primitives.
    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn int_width(mut self, width: IntWidth) -> Self {
        self.int_width = Some(width);
        self
    }

    /// Adds a required field of type `T`.
    pub fn field<T: CborType>(self, key: impl Into<FieldKey>) -> Self {
        self.push_field(key.into(), TypeRef::of::<T>(), Presence::Required)
    }

    /// Adds a field of type `T` that may be missing from the wire.
    pub fn optional<T: CborType>(self, key: impl Into<FieldKey>) -> Self {
        self.push_field(key.into(), TypeRef::of::<T>(), Presence::Optional)
    }

    /// Adds a positional field of type `T` that is null when absent.
    pub fn nullable<T: CborType>(self, key: impl Into<FieldKey>) -> Self {
        self.push_field(key.into(), TypeRef::of::<T>(), Presence::Nullable)
    }

    /// Adds a constant field.
    pub fn literal(self, key: impl Into<FieldKey>, literal: Literal) -> Self {
        self.push_spec(FieldSpec {
            key: key.into(),
            kind: FieldKind::Literal(literal),
        })
    }

    /// Homogeneous elements of type `T`.
    pub fn items<T: CborType>(mut self) -> Self {
        self.layout = Some(Layout::Items(TypeRef::of::<T>()));
        self
    }

    /// Homogeneous entries `K => V`.
    pub fn entries<K: CborType, V: CborType>(mut self) -> Self {
        self.layout = Some(Layout::Entries {
            key: TypeRef::of::<K>(),
            value: TypeRef::of::<V>(),
        });
        self
    }

    /// Appends a union candidate; declaration order is trial order.
    pub fn candidate<T: CborType>(mut self) -> Self {
        self.candidates
            .get_or_insert_with(Vec::new)
            .push(TypeRef::of::<T>());
        self
    }

    fn push_field(self, key: FieldKey, ty: TypeRef, presence: Presence) -> Self {
        self.push_spec(FieldSpec {
            key,
            kind: FieldKind::Value { ty, presence },
        })
    }

    fn push_spec(mut self, spec: FieldSpec) -> Self {
        match &mut self.layout {
            Some(Layout::Fields(fields)) => fields.push(spec),
            // Declaring fields replaces any other layout.
            _ => self.layout = Some(Layout::Fields(vec![spec])),
        }
        self
    }

    /// Fills every unset facet of `self` from `parent`.
    ///
    /// The result continues the chain with the parent's own parent.
    pub fn merge(self, parent: Schema) -> Schema {
        Schema {
            kind: self.kind.or(parent.kind),
            tag: self.tag.or(parent.tag),
            alternative: self.alternative.or(parent.alternative),
            length: self.length.or(parent.length),
            layout: self.layout.or(parent.layout),
            candidates: self.candidates.or(parent.candidates),
            preserve_raw: self.preserve_raw.or(parent.preserve_raw),
            extensible: self.extensible.or(parent.extensible),
            size: self.size.or(parent.size),
            chunk_size: self.chunk_size.or(parent.chunk_size),
            int_width: self.int_width.or(parent.int_width),
            parent: parent.parent,
        }
    }

    /// Returns the declared parent, if any.
    pub fn parent(&self) -> Option<fn() -> Schema> {
        self.parent
    }
}
