//! Disk Tier
//!
//! One file per key under a dedicated directory, bounded by total bytes and
//! entry count.

pub mod fs;
pub mod header;
mod index;
mod store;

pub use fs::{FileMeta, FileStore, StdFileStore};
pub use index::{DiskEvictionIndex, IndexEntry};
pub use store::{cache_file_name, DiskCache};
