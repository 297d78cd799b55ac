//! Process-wide cache of resolved type options.
//!
//! The first resolution of a type merges its schema with its parent chain,
//! validates the result and publishes it. Later resolutions are lock-free
//! reads. A configuration error is cached as well, so a misconfigured type
//! fails the same way every time.
//!
//! Children are referenced through [`TypeRef`] and resolved only when a
//! converter first reaches them, so self-referential types resolve without
//! re-entering their own initialization.

use std::any::TypeId;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::limits::MAX_INHERITANCE_DEPTH;
use crate::model::{CborType, Schema, TypeOptions, TypeRef};
use crate::validate::validate_options;

type Resolution = Result<Arc<TypeOptions>, ConfigError>;
type Slot = Arc<OnceLock<Resolution>>;

lazy_static! {
    static ref REGISTRY: ArcSwap<FxHashMap<TypeId, Slot>> =
        ArcSwap::from_pointee(FxHashMap::default());
}

/// Resolves the options of `T`.
pub fn resolve<T: CborType>() -> Result<Arc<TypeOptions>, ConfigError> {
    resolve_ref(&TypeRef::of::<T>())
}

/// Resolves the options of the type behind `ty`.
pub fn resolve_ref(ty: &TypeRef) -> Result<Arc<TypeOptions>, ConfigError> {
    slot(ty.id()).get_or_init(|| build(ty)).clone()
}

/// Returns true once `T` has been resolved (successfully or not).
pub fn is_resolved<T: CborType>() -> bool {
    REGISTRY
        .load()
        .get(&TypeId::of::<T>())
        .is_some_and(|slot| slot.get().is_some())
}

/// Number of types known to the registry.
pub fn len() -> usize {
    REGISTRY.load().len()
}

/// Returns the slot for `id`, inserting an empty one if absent.
///
/// Concurrent callers for the same id always receive the same slot.
fn slot(id: TypeId) -> Slot {
    if let Some(slot) = REGISTRY.load().get(&id) {
        return slot.clone();
    }
    let mut published = Slot::default();
    REGISTRY.rcu(|current| {
        let mut next = FxHashMap::clone(current);
        published = next.entry(id).or_default().clone();
        next
    });
    published
}

fn build(ty: &TypeRef) -> Resolution {
    let result = merge_chain(ty)
        .and_then(|schema| TypeOptions::from_schema(ty.name(), schema))
        .and_then(|options| validate_options(ty, &options).map(|()| options));
    match result {
        Ok(options) => {
            debug!(ty = ty.name(), kind = options.kind.name(), "published type options");
            Ok(Arc::new(options))
        }
        Err(error) => {
            warn!(ty = ty.name(), %error, "invalid type configuration");
            Err(error)
        }
    }
}

/// Merges the declared schema with its parents, closest first.
fn merge_chain(ty: &TypeRef) -> Result<Schema, ConfigError> {
    let mut schema = (ty.schema)();
    let mut depth = 0;
    while let Some(parent) = schema.parent() {
        depth += 1;
        if depth > MAX_INHERITANCE_DEPTH {
            return Err(ConfigError::InheritanceTooDeep {
                ty: ty.name(),
                max: MAX_INHERITANCE_DEPTH,
            });
        }
        schema = schema.merge(parent());
    }
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::codec::{deserialize, serialize};
    use crate::error::{DecodeError, EncodeError};
    use crate::fixtures::{Body, RawBody};
    use crate::model::{Layout, LengthMode, Parts, PartsRef};

    macro_rules! declare {
        ($ty:ident, $schema:expr) => {
            #[derive(Debug)]
            struct $ty;

            impl CborType for $ty {
                fn schema() -> Schema {
                    $schema
                }

                fn from_parts(_parts: Parts) -> Result<Self, DecodeError> {
                    Ok($ty)
                }

                fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
                    Ok(PartsRef::fields())
                }
            }
        };
    }

    declare!(EmptyUnion, Schema::union());
    declare!(Looping, Schema::inherit(Looping::schema).kind(crate::model::ConverterKind::List));
    declare!(
        BrokenHolder,
        Schema::union().candidate::<EmptyUnion>().candidate::<u64>()
    );
    declare!(Unknown, Schema::list().items::<u64>());
    declare!(Logged, Schema::list().items::<bool>());
    declare!(Misconfigured, Schema::map());

    #[test]
    fn test_inheritance_merges_parent() {
        let options = resolve::<RawBody>().unwrap();
        let body = resolve::<Body>().unwrap();
        assert!(options.preserve_raw);
        assert!(!body.preserve_raw);
        assert_eq!(options.layout, body.layout);
        assert_eq!(options.length, LengthMode::Either);
        assert!(matches!(options.layout, Some(Layout::Fields(ref f)) if f.len() == 3));
    }

    #[test]
    fn test_resolution_is_cached() {
        let first = resolve::<Body>().unwrap();
        let second = resolve::<Body>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(is_resolved::<Body>());
        assert!(len() >= 1);
    }

    #[test]
    fn test_is_resolved_before_use() {
        assert!(!is_resolved::<Unknown>());
        resolve::<Unknown>().unwrap();
        assert!(is_resolved::<Unknown>());
    }

    #[test]
    fn test_config_error_is_cached() {
        let first = resolve::<EmptyUnion>().unwrap_err();
        assert_eq!(first, ConfigError::EmptyUnion { ty: first.ty() });
        assert_eq!(resolve::<EmptyUnion>().unwrap_err(), first);
        assert!(matches!(
            deserialize::<EmptyUnion>(vec![0x00]),
            Err(DecodeError::Config(ConfigError::EmptyUnion { .. }))
        ));
        assert!(matches!(
            serialize(&EmptyUnion),
            Err(EncodeError::Config(ConfigError::EmptyUnion { .. }))
        ));
    }

    #[test]
    fn test_cyclic_parent_chain() {
        assert!(matches!(
            resolve::<Looping>(),
            Err(ConfigError::InheritanceTooDeep { max: MAX_INHERITANCE_DEPTH, .. })
        ));
    }

    #[test]
    fn test_candidate_config_error_propagates() {
        // The misconfigured first candidate is reported, not skipped.
        assert!(matches!(
            deserialize::<BrokenHolder>(vec![0x01]),
            Err(DecodeError::Config(ConfigError::EmptyUnion { .. }))
        ));
    }

    #[test]
    #[traced_test]
    fn test_publication_is_logged() {
        resolve::<Logged>().unwrap();
        assert!(logs_contain("published type options"));
        assert!(resolve::<Misconfigured>().is_err());
        assert!(logs_contain("invalid type configuration"));
    }
}
