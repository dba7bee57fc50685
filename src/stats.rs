//! Cache Statistics Module
//!
//! Tracks per-tier hits, misses, evictions and lazy expirations.

use serde::Serialize;

// == Cache Stats ==
/// Counters kept by each tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing or found an expired entry
    pub misses: u64,
    /// Entries dropped by the capacity policy
    pub evictions: u64,
    /// Entries dropped because a read found them expired
    pub expirations: u64,
    /// Current number of entries
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// An expired entry counts as a miss as well.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
        self.misses += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
