//! Configuration Module
//!
//! Construction-time settings for both tiers, loadable from environment variables.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_CACHE_NAME, DISK_DEFAULT_MAX_BYTES, DISK_DEFAULT_MAX_ENTRIES,
    MEMORY_DEFAULT_MAX_ENTRIES,
};

/// Cache configuration parameters.
///
/// Values are fixed once a cache is built from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries held in memory
    pub memory_max_entries: usize,
    /// Maximum total bytes of all files on disk
    pub disk_max_bytes: u64,
    /// Maximum number of files on disk
    pub disk_max_entries: usize,
    /// Directory owned by the disk tier
    pub disk_directory: PathBuf,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MEMORY_MAX_ENTRIES` - Memory entry ceiling (default: 256)
    /// - `CACHE_DISK_MAX_BYTES` - Disk byte ceiling (default: unbounded)
    /// - `CACHE_DISK_MAX_ENTRIES` - Disk entry ceiling (default: unbounded)
    /// - `CACHE_DIR` - Disk directory (default: `<temp>/cacheUtils`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            memory_max_entries: env::var("CACHE_MEMORY_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.memory_max_entries),
            disk_max_bytes: env::var("CACHE_DISK_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.disk_max_bytes),
            disk_max_entries: env::var("CACHE_DISK_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.disk_max_entries),
            disk_directory: env::var_os("CACHE_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.disk_directory),
        }
    }

    pub fn with_memory_max_entries(mut self, max_entries: usize) -> Self {
        self.memory_max_entries = max_entries;
        self
    }

    pub fn with_disk_max_bytes(mut self, max_bytes: u64) -> Self {
        self.disk_max_bytes = max_bytes;
        self
    }

    pub fn with_disk_max_entries(mut self, max_entries: usize) -> Self {
        self.disk_max_entries = max_entries;
        self
    }

    pub fn with_disk_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.disk_directory = directory.into();
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_max_entries: MEMORY_DEFAULT_MAX_ENTRIES,
            disk_max_bytes: DISK_DEFAULT_MAX_BYTES,
            disk_max_entries: DISK_DEFAULT_MAX_ENTRIES,
            disk_directory: env::temp_dir().join(DEFAULT_CACHE_NAME),
        }
    }
}
