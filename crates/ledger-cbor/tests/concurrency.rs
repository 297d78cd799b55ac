//! The registry under concurrent first use.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use ledger_cbor::registry::{is_resolved, resolve};
use ledger_cbor::{
    deserialize, serialize, CborType, ConfigError, DecodeError, EncodeError, Parts, PartsRef,
    Schema,
};

const THREADS: usize = 16;

static SCHEMA_CALLS: AtomicUsize = AtomicUsize::new(0);

/// `[slot, hash]`; counts how often its schema is built.
#[derive(Debug, Clone, PartialEq)]
struct Point {
    slot: u64,
    hash: bytes::Bytes,
}

impl CborType for Point {
    fn schema() -> Schema {
        SCHEMA_CALLS.fetch_add(1, Ordering::SeqCst);
        Schema::list().field::<u64>(0).field::<bytes::Bytes>(1)
    }

    fn from_parts(parts: Parts) -> Result<Self, DecodeError> {
        let mut f = parts.into_fields()?;
        Ok(Self {
            slot: f.take()?,
            hash: f.take()?,
        })
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields().field(&self.slot).field(&self.hash))
    }
}

/// A map without fields.
#[derive(Debug)]
struct Hollow;

impl CborType for Hollow {
    fn schema() -> Schema {
        Schema::map()
    }

    fn from_parts(_parts: Parts) -> Result<Self, DecodeError> {
        Ok(Hollow)
    }

    fn to_parts(&self) -> Result<PartsRef<'_>, EncodeError> {
        Ok(PartsRef::fields())
    }
}

/// Runs `f` on every thread at once and collects the results.
fn race<R: Send + 'static>(f: fn(usize) -> R) -> Vec<R> {
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                f(i)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_concurrent_first_resolution() {
    assert!(!is_resolved::<Point>());
    let resolved = race(|_| resolve::<Point>().unwrap());

    assert_eq!(SCHEMA_CALLS.load(Ordering::SeqCst), 1);
    assert!(resolved.iter().all(|options| Arc::ptr_eq(options, &resolved[0])));
    assert!(is_resolved::<Point>());

    let round_trips = race(|i| {
        let point = Point {
            slot: i as u64,
            hash: bytes::Bytes::from(vec![i as u8; 4]),
        };
        let bytes = serialize(&point).unwrap();
        deserialize::<Point>(bytes).unwrap() == point
    });
    assert!(round_trips.into_iter().all(|ok| ok));
    assert_eq!(SCHEMA_CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_config_error() {
    let errors = race(|_| resolve::<Hollow>().unwrap_err());
    assert!(errors
        .iter()
        .all(|e| matches!(e, ConfigError::EmptyMap { .. }) && *e == errors[0]));
    assert!(race(|_| serialize(&Hollow).is_err()).into_iter().all(|failed| failed));
}
