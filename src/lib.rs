//! Tiered Cache - a two-tier expiring cache
//!
//! A bounded in-memory LRU with per-entry TTL, backed by a bounded on-disk
//! store whose files carry their own expiry header.

pub mod clock;
pub mod config;
pub mod constants;
pub mod disk;
pub mod error;
pub mod memory;
pub mod registry;
pub mod stats;
pub mod tiered;
pub mod ttl;
pub mod typed;

#[cfg(test)]
mod property_tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use disk::DiskCache;
pub use error::{CacheError, Result};
pub use memory::MemoryCache;
pub use registry::CacheRegistry;
pub use stats::CacheStats;
pub use tiered::{TieredStats, TwoTierCache};
pub use ttl::Ttl;
pub use typed::{
    remove_all_namespaces, ByteCache, BytesCodec, Codec, JsonCodec, Namespace, TextCodec,
    TypedCache,
};
