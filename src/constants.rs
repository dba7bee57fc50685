//! Cache Constants
//!
//! Duration units for TTL arithmetic and construction defaults.

// == Duration Units (seconds) ==
pub const SEC: u64 = 1;
pub const MIN: u64 = 60;
pub const HOUR: u64 = 3600;
pub const DAY: u64 = 86400;

// == Defaults ==
/// Default maximum number of entries held in memory
pub const MEMORY_DEFAULT_MAX_ENTRIES: usize = 256;

/// Default disk byte ceiling (effectively unbounded)
pub const DISK_DEFAULT_MAX_BYTES: u64 = u64::MAX;

/// Default disk entry ceiling (effectively unbounded)
pub const DISK_DEFAULT_MAX_ENTRIES: usize = usize::MAX;

/// Directory name used when a named disk cache is requested with a blank name
pub const DEFAULT_CACHE_NAME: &str = "cacheUtils";

/// Prefix of every file the disk tier owns. Other files in the directory are ignored.
pub const CACHE_FILE_PREFIX: &str = "cdu_";
