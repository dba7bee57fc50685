//! Memory Cache Module
//!
//! HashMap storage with LRU tracking and lazy TTL expiration, behind one lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::memory::{LruTracker, MemoryEntry};
use crate::stats::CacheStats;
use crate::ttl::Ttl;

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, MemoryEntry<V>>,
    lru: LruTracker,
    stats: CacheStats,
}

// == Memory Cache ==
/// In-memory cache with a fixed entry ceiling.
///
/// TTL and LRU are independent: an entry leaves either when a read finds it
/// expired or when an insert pushes it out as least recently used.
/// Expired entries still count toward `count()` until a read touches them.
#[derive(Debug)]
pub struct MemoryCache<V> {
    inner: Mutex<Inner<V>>,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> MemoryCache<V> {
    // == Constructor ==
    /// Creates a cache holding at most `max_entries` values (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
            }),
            max_entries: max_entries.max(1),
            clock,
        }
    }

    // == Put ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// Inserting a new key into a full cache evicts the least recently used entry.
    pub fn put(&self, key: &str, value: V, ttl: Ttl) {
        let entry = MemoryEntry::new(value, ttl, self.clock.now_ms());
        let mut inner = self.inner.lock();

        if !inner.entries.contains_key(key) && inner.entries.len() >= self.max_entries {
            if let Some(evicted) = inner.lru.evict_oldest() {
                inner.entries.remove(&evicted);
                inner.stats.record_eviction();
                debug!(key = %evicted, "memory cache evicted least recently used entry");
            }
        }

        inner.entries.insert(key.to_string(), entry);
        inner.lru.touch(key);
        let len = inner.entries.len();
        inner.stats.set_total_entries(len);
    }

    // == Get ==
    /// Returns the value if present and not expired, marking it most recently used.
    ///
    /// An expired entry is removed as part of the same locked step.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(key) {
            None => {
                inner.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            inner.entries.remove(key);
            inner.lru.remove(key);
            inner.stats.record_expiration();
            let len = inner.entries.len();
            inner.stats.set_total_entries(len);
            debug!(key, "memory cache entry expired on read");
            return None;
        }

        inner.lru.touch(key);
        inner.stats.record_hit();
        inner.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Returns the value or `default` on a miss.
    pub fn get_or(&self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    // == Remove ==
    /// Removes an entry regardless of expiry and returns its value.
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        let removed = inner.entries.remove(key)?;
        inner.lru.remove(key);
        let len = inner.entries.len();
        inner.stats.set_total_entries(len);
        Some(removed.value)
    }

    // == Clear ==
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.lru.clear();
        inner.stats.set_total_entries(0);
    }

    // == Count ==
    /// Number of stored entries, including ones not yet found expired.
    pub fn count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }
}
