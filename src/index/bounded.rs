//! Bounded index backend
//!
//! LRU cache with a fixed capacity. Inserting into a full cache evicts the
//! least recently used key without notice.

use std::num::NonZeroUsize;

use lru::LruCache;

use super::{Index, IndexEntry};

/// LRU-backed index
pub struct BoundedIndex {
    lru: LruCache<Vec<u8>, IndexEntry>,
}

impl BoundedIndex {
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            lru: LruCache::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.lru.cap().get()
    }
}

impl Index for BoundedIndex {
    fn get(&mut self, key: &[u8]) -> Option<IndexEntry> {
        self.lru.get(key).cloned()
    }

    fn add(&mut self, key: Vec<u8>, entry: IndexEntry) -> Option<IndexEntry> {
        // `put` only returns a value when the key was already present
        self.lru.put(key, entry)
    }

    fn remove(&mut self, key: &[u8]) -> Option<IndexEntry> {
        self.lru.pop(key)
    }

    fn len(&self) -> usize {
        self.lru.len()
    }

    fn is_bounded(&self) -> bool {
        true
    }

    fn clear(&mut self) {
        self.lru.clear();
    }
}
