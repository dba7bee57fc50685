//! Two-Tier Cache Module
//!
//! Memory in front of disk: writes go to both, reads fall through to disk and
//! promote hits back into memory.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::disk::DiskCache;
use crate::error::{validate_key, Result};
use crate::memory::MemoryCache;
use crate::stats::CacheStats;
use crate::ttl::Ttl;

// == Tiered Stats ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TieredStats {
    pub memory: CacheStats,
    pub disk: CacheStats,
    pub disk_size_bytes: u64,
}

// == Two-Tier Cache ==
/// Facade over a memory tier and a disk tier.
///
/// The tiers are not kept in lockstep: memory holds a subset of what disk
/// holds, and eviction in one tier never touches the other.
#[derive(Debug, Clone)]
pub struct TwoTierCache {
    memory: Arc<MemoryCache<Vec<u8>>>,
    disk: Arc<DiskCache>,
}

impl TwoTierCache {
    // == Constructor ==
    pub fn new(memory: Arc<MemoryCache<Vec<u8>>>, disk: Arc<DiskCache>) -> Self {
        Self { memory, disk }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Builds both tiers from `config`, sharing one clock.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let memory = MemoryCache::with_clock(config.memory_max_entries, clock.clone());
        let disk = DiskCache::from_config(config, clock);
        Self::new(Arc::new(memory), Arc::new(disk))
    }

    pub fn memory(&self) -> &Arc<MemoryCache<Vec<u8>>> {
        &self.memory
    }

    pub fn disk(&self) -> &Arc<DiskCache> {
        &self.disk
    }

    pub fn is_disk_available(&self) -> bool {
        self.disk.is_available()
    }

    // == Put ==
    /// Writes to both tiers with the same TTL.
    ///
    /// The memory write always happens; a disk failure is returned but does
    /// not undo it.
    pub fn put(&self, key: &str, value: &[u8], ttl: Ttl) -> Result<()> {
        validate_key(key)?;
        self.memory.put(key, value.to_vec(), ttl);
        self.disk.put(key, value, ttl)
    }

    // == Get ==
    /// Memory first, then disk. A disk hit is promoted into memory without a
    /// TTL; the disk copy keeps its own expiry.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(value) = self.memory.get(key) {
            return Some(value);
        }
        let value = self.disk.get(key)?;
        debug!(key, "promoting disk hit into memory");
        self.memory.put(key, value.clone(), Ttl::Forever);
        Some(value)
    }

    pub fn get_or(&self, key: &str, default: Vec<u8>) -> Vec<u8> {
        self.get(key).unwrap_or(default)
    }

    // == Remove ==
    /// Removes from both tiers. Returns whether either tier held the key.
    pub fn remove(&self, key: &str) -> bool {
        let in_memory = self.memory.remove(key).is_some();
        let on_disk = self.disk.remove(key);
        in_memory || on_disk
    }

    // == Clear ==
    /// Empties both tiers. Returns the disk tier's result.
    pub fn clear(&self) -> bool {
        self.memory.clear();
        self.disk.clear()
    }

    // == Statistics ==
    pub fn disk_size(&self) -> u64 {
        self.disk.size_bytes()
    }

    pub fn disk_count(&self) -> usize {
        self.disk.count()
    }

    pub fn memory_count(&self) -> usize {
        self.memory.count()
    }

    pub fn stats(&self) -> TieredStats {
        TieredStats {
            memory: self.memory.stats(),
            disk: self.disk.stats(),
            disk_size_bytes: self.disk.size_bytes(),
        }
    }
}
