//! Memory Entry Module
//!
//! A cached value plus its absolute expiry.

use crate::ttl::Ttl;

// == Memory Entry ==
/// A single in-memory value with metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl<V> MemoryEntry<V> {
    // == Constructor ==
    /// Creates an entry written at `now_ms` that lives for `ttl`.
    pub fn new(value: V, ttl: Ttl, now_ms: u64) -> Self {
        Self {
            value,
            expires_at: ttl.expires_at_ms(now_ms),
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now_ms` is strictly past its expiry.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms > expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// - `Some(0)` once the entry has expired
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(now_ms))
    }
}
