//! Cache Registry Module
//!
//! Hands out one shared instance per configuration. Owned by the application
//! and passed to whoever needs a cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::constants::DEFAULT_CACHE_NAME;
use crate::disk::{DiskCache, StdFileStore};
use crate::memory::MemoryCache;
use crate::tiered::TwoTierCache;

type DiskKey = (PathBuf, u64, usize);
type MemoryKey = (String, usize);

// == Cache Registry ==
/// Lazily builds and memoizes cache instances.
///
/// Disk caches are keyed by `(directory, max_bytes, max_entries)` so two
/// callers asking for the same directory and ceilings share one index.
#[derive(Debug)]
pub struct CacheRegistry {
    base_dir: PathBuf,
    clock: Arc<dyn Clock>,
    memory: Mutex<HashMap<MemoryKey, Arc<MemoryCache<Vec<u8>>>>>,
    disk: Mutex<HashMap<DiskKey, Arc<DiskCache>>>,
    tiered: Mutex<HashMap<(DiskKey, MemoryKey), Arc<TwoTierCache>>>,
}

impl CacheRegistry {
    /// `base_dir` is where named disk caches live.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(base_dir, Arc::new(SystemClock))
    }

    pub fn with_clock(base_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            base_dir: base_dir.into(),
            clock,
            memory: Mutex::new(HashMap::new()),
            disk: Mutex::new(HashMap::new()),
            tiered: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // == Memory ==
    /// Memory cache registered under `name` with `max_entries`.
    pub fn memory(&self, name: &str, max_entries: usize) -> Arc<MemoryCache<Vec<u8>>> {
        let key = (name.to_string(), max_entries);
        self.memory
            .lock()
            .entry(key)
            .or_insert_with(|| {
                debug!(name, max_entries, "creating memory cache");
                Arc::new(MemoryCache::with_clock(max_entries, self.clock.clone()))
            })
            .clone()
    }

    // == Disk ==
    /// Disk cache rooted at `dir`.
    pub fn disk(&self, dir: impl AsRef<Path>, max_bytes: u64, max_entries: usize) -> Arc<DiskCache> {
        let key = (self.resolve(dir.as_ref()), max_bytes, max_entries);
        self.disk
            .lock()
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(DiskCache::open_with(
                    key.0,
                    max_bytes,
                    max_entries,
                    StdFileStore,
                    self.clock.clone(),
                ))
            })
            .clone()
    }

    /// Disk cache in `<base_dir>/<name>`. A blank name uses the default cache name.
    pub fn disk_named(&self, name: &str, max_bytes: u64, max_entries: usize) -> Arc<DiskCache> {
        let name = if name.trim().is_empty() {
            DEFAULT_CACHE_NAME
        } else {
            name
        };
        self.disk(self.base_dir.join(name), max_bytes, max_entries)
    }

    // == Tiered ==
    /// Two-tier cache for `config`, sharing tiers with any other caller using
    /// the same directory and ceilings.
    pub fn tiered(&self, config: &CacheConfig) -> Arc<TwoTierCache> {
        let disk = self.disk(
            &config.disk_directory,
            config.disk_max_bytes,
            config.disk_max_entries,
        );
        let memory_name = disk.directory().display().to_string();
        let memory = self.memory(&memory_name, config.memory_max_entries);

        let key = (
            (
                disk.directory().to_path_buf(),
                config.disk_max_bytes,
                config.disk_max_entries,
            ),
            (memory_name, config.memory_max_entries),
        );
        self.tiered
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::new(TwoTierCache::new(memory, disk)))
            .clone()
    }

    /// Absolute form of `dir`, so `./c` and `<cwd>/c` resolve to one instance.
    fn resolve(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            return dir.to_path_buf();
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(dir))
            .unwrap_or_else(|_| dir.to_path_buf())
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}
