//! Unbounded index backend

use std::collections::HashMap;

use super::{Index, IndexEntry};

/// HashMap-backed index that keeps every key resident
#[derive(Debug, Default)]
pub struct UnboundedIndex {
    entries: HashMap<Vec<u8>, IndexEntry>,
}

impl UnboundedIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Index for UnboundedIndex {
    fn get(&mut self, key: &[u8]) -> Option<IndexEntry> {
        self.entries.get(key).cloned()
    }

    fn add(&mut self, key: Vec<u8>, entry: IndexEntry) -> Option<IndexEntry> {
        self.entries.insert(key, entry)
    }

    fn remove(&mut self, key: &[u8]) -> Option<IndexEntry> {
        self.entries.remove(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_bounded(&self) -> bool {
        false
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
