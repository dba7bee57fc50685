//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every touch stamps the key with a fresh sequence number. The smallest
/// stamp is the least recently used key.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Key -> latest stamp
    stamps: HashMap<String, u64>,
    /// Stamp -> key, oldest first
    order: BTreeMap<u64, String>,
    next_stamp: u64,
}

impl LruTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if new.
    pub fn touch(&mut self, key: &str) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        match self.stamps.get_mut(key) {
            Some(old) => {
                self.order.remove(&*old);
                *old = stamp;
            }
            None => {
                self.stamps.insert(key.to_string(), stamp);
            }
        }
        self.order.insert(stamp, key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        if let Some(stamp) = self.stamps.remove(key) {
            self.order.remove(&stamp);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.stamps.remove(&key);
        Some(key)
    }

    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.values().next()
    }

    pub fn clear(&mut self) {
        self.stamps.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.stamps.contains_key(key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_touch_existing_key() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");
        lru.touch("key1");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some(&"key2".to_string()));
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        // Newest last: b, c, a -> a, c, b after these
        lru.touch("a");
        lru.touch("c");
        lru.touch("b");

        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.remove("key1");
        lru.remove("nonexistent");

        assert_eq!(lru.len(), 1);
        assert!(!lru.contains("key1"));
        assert_eq!(lru.peek_oldest(), Some(&"key2".to_string()));
    }

    #[test]
    fn test_lru_touch_same_key_multiple_times() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key1");
        lru.touch("key1");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some("key1".to_string()));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruTracker::new();
        lru.touch("a");
        lru.touch("b");
        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.evict_oldest(), None);
    }
}
