//! Memory Tier
//!
//! Capacity-bounded, recency-ordered key/value store with optional per-entry expiry.

mod entry;
mod lru;
mod store;

pub use entry::MemoryEntry;
pub use lru::LruTracker;
pub use store::MemoryCache;
