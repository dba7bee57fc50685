//! Disk Eviction Index Module
//!
//! Tracks size and last access of every file the disk tier owns, and picks
//! eviction victims when either ceiling is exceeded.

use std::collections::{BTreeMap, HashMap};

// == Index Entry ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// File size in bytes, header included
    pub size: u64,
    /// Last access, Unix milliseconds
    pub last_access_ms: u64,
    /// Tie-breaker for equal access times, oldest first
    stamp: u64,
    /// Fixed at insert; changes only when the file is rewritten
    version: u64,
}

impl IndexEntry {
    pub fn version(&self) -> u64 {
        self.version
    }
}

// == Disk Eviction Index ==
/// LRU bookkeeping for the disk tier.
///
/// Entries are keyed by file name. Victims are chosen by oldest
/// `last_access_ms`, then by the order in which entries were last touched.
#[derive(Debug)]
pub struct DiskEvictionIndex {
    entries: HashMap<String, IndexEntry>,
    order: BTreeMap<(u64, u64), String>,
    total_bytes: u64,
    max_bytes: u64,
    max_entries: usize,
    next_stamp: u64,
}

impl DiskEvictionIndex {
    pub fn new(max_bytes: u64, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            total_bytes: 0,
            max_bytes,
            max_entries,
            next_stamp: 0,
        }
    }

    fn stamp(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }

    // == Insert ==
    /// Registers a file, replacing any previous record for `name`.
    pub fn insert(&mut self, name: &str, size: u64, now_ms: u64) {
        self.remove(name);
        let stamp = self.stamp();
        self.entries.insert(
            name.to_string(),
            IndexEntry {
                size,
                last_access_ms: now_ms,
                stamp,
                version: stamp,
            },
        );
        self.order.insert((now_ms, stamp), name.to_string());
        self.total_bytes = self.total_bytes.saturating_add(size);
    }

    // == Touch ==
    /// Refreshes the last access time. Returns false if `name` is not indexed.
    pub fn touch(&mut self, name: &str, now_ms: u64) -> bool {
        let stamp = self.stamp();
        let Some(entry) = self.entries.get_mut(name) else {
            return false;
        };
        self.order.remove(&(entry.last_access_ms, entry.stamp));
        entry.last_access_ms = now_ms;
        entry.stamp = stamp;
        self.order.insert((now_ms, stamp), name.to_string());
        true
    }

    // == Remove ==
    pub fn remove(&mut self, name: &str) -> Option<IndexEntry> {
        let entry = self.entries.remove(name)?;
        self.order.remove(&(entry.last_access_ms, entry.stamp));
        self.total_bytes = self.total_bytes.saturating_sub(entry.size);
        Some(entry)
    }

    // == Evict ==
    /// Whether either ceiling is currently exceeded.
    pub fn over_limit(&self) -> bool {
        self.total_bytes > self.max_bytes || self.entries.len() > self.max_entries
    }

    /// Removes the least recently used entry.
    pub fn pop_oldest(&mut self) -> Option<(String, IndexEntry)> {
        let (_, name) = self.order.pop_first()?;
        let entry = self.entries.remove(&name)?;
        self.total_bytes = self.total_bytes.saturating_sub(entry.size);
        Some((name, entry))
    }

    /// Drops oldest entries until both ceilings hold or the index is empty.
    ///
    /// Returns the removed names so their files can be deleted.
    pub fn evict_over_limit(&mut self) -> Vec<String> {
        let mut victims = Vec::new();
        while self.over_limit() {
            match self.pop_oldest() {
                Some((name, _)) => victims.push(name),
                None => break,
            }
        }
        victims
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
