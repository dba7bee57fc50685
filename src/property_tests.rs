//! Property-Based Tests
//!
//! Uses proptest to check the header codec and the capacity bounds of both tiers.

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::ManualClock;
use crate::disk::{header, DiskCache, StdFileStore};
use crate::memory::MemoryCache;
use crate::ttl::Ttl;

const NOW_MS: u64 = 1_700_000_000_000;

// == Strategies ==
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,16}"
}

/// Payloads biased toward ones that look like they already carry a header.
fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..64),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(|tail| {
            let mut bytes = b"_$".to_vec();
            bytes.extend(tail);
            bytes
        }),
        (0u64..10_000_000_000, prop::collection::vec(any::<u8>(), 0..16)).prop_map(
            |(secs, tail)| {
                let mut bytes = format!("_${:010}$_", secs).into_bytes();
                bytes.extend(tail);
                bytes
            }
        ),
    ]
}

fn ttl_strategy() -> impl Strategy<Value = Ttl> {
    prop_oneof![Just(Ttl::Forever), (0u64..1_000_000).prop_map(Ttl::Seconds)]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, size: usize },
    Get { key: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (valid_key_strategy(), 0usize..48).prop_map(|(key, size)| CacheOp::Put { key, size }),
        1 => valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => valid_key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // A timed payload always strips back to itself, whatever it looks like.
    #[test]
    fn prop_header_round_trip_with_ttl(payload in payload_strategy(), secs in 0u64..1_000_000) {
        let encoded = header::encode(Ttl::Seconds(secs), &payload, NOW_MS);

        prop_assert_eq!(encoded.len(), payload.len() + header::HEADER_LEN);
        prop_assert_eq!(header::strip(&encoded), payload.as_slice());
        prop_assert_eq!(header::due_time_ms(&encoded), Some((NOW_MS / 1000 + secs) * 1000));
    }

    // Due-ness flips exactly one millisecond after the encoded second.
    #[test]
    fn prop_header_due_boundary(payload in payload_strategy(), secs in 0u64..1_000_000) {
        let encoded = header::encode(Ttl::Seconds(secs), &payload, NOW_MS);
        let due = (NOW_MS / 1000 + secs) * 1000;

        prop_assert!(!header::is_due(&encoded, NOW_MS));
        prop_assert!(!header::is_due(&encoded, due));
        prop_assert!(header::is_due(&encoded, due + 1));
    }

    // Untimed payloads are stored raw. Only payloads that already carry a
    // header fingerprint can be misread on the way back.
    #[test]
    fn prop_forever_is_raw(payload in payload_strategy()) {
        let encoded = header::encode(Ttl::Forever, &payload, NOW_MS);

        prop_assert_eq!(&encoded, &payload);
        if !header::has_header(&payload) {
            prop_assert_eq!(header::strip(&encoded), payload.as_slice());
            prop_assert!(!header::is_due(&encoded, u64::MAX));
        }
    }

    #[test]
    fn prop_memory_capacity_enforcement(
        ops in prop::collection::vec(cache_op_strategy(), 1..150),
        max_entries in 1usize..16,
    ) {
        let cache = MemoryCache::with_clock(max_entries, Arc::new(ManualClock::new(NOW_MS)));

        for op in ops {
            match op {
                CacheOp::Put { key, size } => cache.put(&key, vec![0u8; size], Ttl::Forever),
                CacheOp::Get { key } => { cache.get(&key); }
                CacheOp::Remove { key } => { cache.remove(&key); }
            }
            prop_assert!(cache.count() <= max_entries);
        }
    }

    // The most recent put is always readable right after it is made.
    #[test]
    fn prop_memory_last_put_visible(
        entries in prop::collection::vec((valid_key_strategy(), payload_strategy(), ttl_strategy()), 1..40),
    ) {
        let cache = MemoryCache::with_clock(4, Arc::new(ManualClock::new(NOW_MS)));
        for (key, value, ttl) in entries {
            cache.put(&key, value.clone(), ttl);
            prop_assert_eq!(cache.get(&key), Some(value));
        }
    }
}

// Disk properties touch the filesystem, so run fewer cases.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_disk_ceilings_hold_after_every_put(
        ops in prop::collection::vec(cache_op_strategy(), 1..60),
        max_bytes in 32u64..256,
        max_entries in 1usize..8,
    ) {
        let tmp = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(NOW_MS));
        let cache = DiskCache::open_with(tmp.path(), max_bytes, max_entries, StdFileStore, clock.clone());

        for op in ops {
            match op {
                CacheOp::Put { key, size } => cache.put(&key, &vec![1u8; size], Ttl::Forever).unwrap(),
                CacheOp::Get { key } => { cache.get(&key); }
                CacheOp::Remove { key } => { cache.remove(&key); }
            }
            clock.advance(Duration::from_millis(3));
            prop_assert!(cache.size_bytes() <= max_bytes);
            prop_assert!(cache.count() <= max_entries);
        }
    }

    #[test]
    fn prop_disk_round_trip(payload in payload_strategy(), ttl in ttl_strategy()) {
        let tmp = tempfile::tempdir().unwrap();
        let cache = DiskCache::open_with(
            tmp.path(),
            u64::MAX,
            usize::MAX,
            StdFileStore,
            Arc::new(ManualClock::new(NOW_MS)),
        );

        cache.put("key", &payload, ttl).unwrap();
        let read = cache.get("key");

        if ttl.is_forever() && header::has_header(&payload) {
            // A raw payload carrying a fingerprint is read as if it had a header
            if header::is_due(&payload, NOW_MS) {
                prop_assert_eq!(read, None);
            } else {
                prop_assert_eq!(read, Some(header::strip(&payload).to_vec()));
            }
        } else {
            prop_assert_eq!(read, Some(payload));
        }
    }
}
