//! Ledger-shaped types shared by the unit tests.

use bytes::Bytes;

use crate::error::{DecodeError, EncodeError};
use crate::model::{CborType, ConverterKind, Literal, Parts, PartsRef, Schema};

/// `[url, hash]`
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub url: String,
    pub hash: u64,
}

impl CborType for Anchor {
    fn schema() -> Schema {
        Schema::list().definite().field::<String>(0).field::<u64>(1)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let mut f = parts.into_fields()?;
        Ok(Self {
            url: f.take()?,
            hash: f.take()?,
        })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields().field(&self.url).field(&self.hash))
    }
}

/// `[signature, ? index, * any]`
#[derive(Debug, Clone, PartialEq)]
pub struct Witness {
    pub signature: Bytes,
    pub index: Option<u64>,
}

impl CborType for Witness {
    fn schema() -> Schema {
        Schema::list()
            .extensible()
            .field::<Bytes>(0)
            .optional::<u64>(1)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let mut f = parts.into_fields()?;
        Ok(Self {
            signature: f.take()?,
            index: f.take_opt()?,
        })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields()
            .field(&self.signature)
            .optional(self.index.as_ref()))
    }
}

/// `[0, label / null, value]`
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub label: Option<String>,
    pub value: u64,
}

impl CborType for Metadata {
    fn schema() -> Schema {
        Schema::list()
            .literal(0, Literal::Int(0))
            .nullable::<String>(1)
            .field::<u64>(2)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let mut f = parts.into_fields()?;
        Ok(Self {
            label: f.take_opt()?,
            value: f.take()?,
        })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields()
            .optional(self.label.as_ref())
            .field(&self.value))
    }
}

/// `{0: inputs, 2: fee, ? 3: ttl}`
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub inputs: Vec<u64>,
    pub fee: u64,
    pub ttl: Option<u64>,
}

impl CborType for Body {
    fn schema() -> Schema {
        Schema::map()
            .field::<Vec<u64>>(0)
            .field::<u64>(2)
            .optional::<u64>(3)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let mut f = parts.into_fields()?;
        Ok(Self {
            inputs: f.take()?,
            fee: f.take()?,
            ttl: f.take_opt()?,
        })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields()
            .field(&self.inputs)
            .field(&self.fee)
            .optional(self.ttl.as_ref()))
    }
}

/// [`Body`] that keeps its original bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBody {
    pub inputs: Vec<u64>,
    pub fee: u64,
    pub ttl: Option<u64>,
    pub raw: Option<Bytes>,
}

impl CborType for RawBody {
    fn schema() -> Schema {
        Schema::inherit(Body::schema).preserve_raw()
    }

    fn from_parts(mut parts: Parts) -> Result<Self, DecodeError> {
        let raw = parts.take_raw();
        let mut f = parts.into_fields()?;
        Ok(Self {
            inputs: f.take()?,
            fee: f.take()?,
            ttl: f.take_opt()?,
            raw,
        })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields()
            .field(&self.inputs)
            .field(&self.fee)
            .optional(self.ttl.as_ref()))
    }

    fn raw(&self) -> Option<&Bytes> {
        self.raw.as_ref()
    }
}

/// `[body, slot]`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub body: RawBody,
    pub slot: u64,
}

impl CborType for Block {
    fn schema() -> Schema {
        Schema::list().field::<RawBody>(0).field::<u64>(1)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let mut f = parts.into_fields()?;
        Ok(Self {
            body: f.take()?,
            slot: f.take()?,
        })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields().field(&self.body).field(&self.slot))
    }
}

/// `{"version": text, "slot": uint, "kind": "header", * text => any}`
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: String,
    pub slot: u64,
}

impl CborType for Header {
    fn schema() -> Schema {
        Schema::map()
            .extensible()
            .field::<String>("version")
            .field::<u64>("slot")
            .literal("kind", Literal::Text("header"))
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let mut f = parts.into_fields()?;
        Ok(Self {
            version: f.take()?,
            slot: f.take()?,
        })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields().field(&self.version).field(&self.slot))
    }
}

// =============================================================================
// CONSTRUCTORS AND UNIONS
// =============================================================================

/// `121([key_hash])`
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCredential(pub Bytes);

impl CborType for KeyCredential {
    fn schema() -> Schema {
        Schema::constructor(0).field::<Bytes>(0)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        Ok(Self(parts.into_fields()?.take()?))
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields().field(&self.0))
    }
}

/// `122([script_hash])`
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptCredential(pub Bytes);

impl CborType for ScriptCredential {
    fn schema() -> Schema {
        Schema::constructor(1).field::<Bytes>(0)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        Ok(Self(parts.into_fields()?.take()?))
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields().field(&self.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    Key(KeyCredential),
    Script(ScriptCredential),
}

impl CborType for Credential {
    fn schema() -> Schema {
        Schema::union()
            .candidate::<KeyCredential>()
            .candidate::<ScriptCredential>()
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        parts
            .into_variant()?
            .on(Credential::Key)
            .on(Credential::Script)
            .finish()
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(match self {
            Credential::Key(c) => PartsRef::variant(c),
            Credential::Script(c) => PartsRef::variant(c),
        })
    }
}

/// Constructor 2, always in the general form.
#[derive(Debug, Clone, PartialEq)]
pub struct Forced(pub u64);

impl CborType for Forced {
    fn schema() -> Schema {
        Schema::new()
            .kind(ConverterKind::Constructor)
            .general(2)
            .field::<u64>(0)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        Ok(Self(parts.into_fields()?.take()?))
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields().field(&self.0))
    }
}

/// Two candidates that both accept small unsigned integers.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlap {
    Small(u64),
    Signed(i64),
}

impl CborType for Overlap {
    fn schema() -> Schema {
        Schema::union().candidate::<u64>().candidate::<i64>()
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        parts
            .into_variant()?
            .on(Overlap::Small)
            .on(Overlap::Signed)
            .finish()
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(match self {
            Overlap::Small(n) => PartsRef::variant(n),
            Overlap::Signed(n) => PartsRef::variant(n),
        })
    }
}

/// `[0, nonce]`
#[derive(Debug, Clone, PartialEq)]
pub struct Ping(pub u64);

impl CborType for Ping {
    fn schema() -> Schema {
        Schema::list().literal(0, Literal::Int(0)).field::<u64>(1)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        Ok(Self(parts.into_fields()?.take()?))
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields().field(&self.0))
    }
}

/// `[1]`
#[derive(Debug, Clone, PartialEq)]
pub struct Done;

impl CborType for Done {
    fn schema() -> Schema {
        Schema::list().literal(0, Literal::Int(1))
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        parts.into_fields()?;
        Ok(Done)
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Ping(Ping),
    Done(Done),
}

impl CborType for Message {
    fn schema() -> Schema {
        Schema::union().candidate::<Ping>().candidate::<Done>()
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        parts
            .into_variant()?
            .on(Message::Ping)
            .on(Message::Done)
            .finish()
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(match self {
            Message::Ping(m) => PartsRef::variant(m),
            Message::Done(m) => PartsRef::variant(m),
        })
    }
}

/// `[0, key_hash]`
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptPubkey(pub Bytes);

/// `[1, [* native_script]]`
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptAll(pub Vec<NativeScript>);

/// `[2, [* native_script]]`
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptAny(pub Vec<NativeScript>);

/// `[4, slot]`
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptAfter(pub u64);

macro_rules! tagged_script {
    ($ty:ident, $tag:expr, $inner:ty) => {
        impl CborType for $ty {
            fn schema() -> Schema {
                Schema::list()
                    .literal(0, Literal::Int($tag))
                    .field::<$inner>(1)
            }

            fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
                Ok(Self(parts.into_fields()?.take()?))
            }

            fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
                Ok(PartsRef::fields().field(&self.0))
            }
        }
    };
}

tagged_script!(ScriptPubkey, 0, Bytes);
tagged_script!(ScriptAll, 1, Vec<NativeScript>);
tagged_script!(ScriptAny, 2, Vec<NativeScript>);
tagged_script!(ScriptAfter, 4, u64);

/// A recursive union.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeScript {
    Pubkey(ScriptPubkey),
    All(ScriptAll),
    Any(ScriptAny),
    After(ScriptAfter),
}

impl CborType for NativeScript {
    fn schema() -> Schema {
        Schema::union()
            .candidate::<ScriptPubkey>()
            .candidate::<ScriptAll>()
            .candidate::<ScriptAny>()
            .candidate::<ScriptAfter>()
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        parts
            .into_variant()?
            .on(NativeScript::Pubkey)
            .on(NativeScript::All)
            .on(NativeScript::Any)
            .on(NativeScript::After)
            .finish()
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(match self {
            NativeScript::Pubkey(s) => PartsRef::variant(s),
            NativeScript::All(s) => PartsRef::variant(s),
            NativeScript::Any(s) => PartsRef::variant(s),
            NativeScript::After(s) => PartsRef::variant(s),
        })
    }
}
