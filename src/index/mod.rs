//! Index Module
//!
//! In-memory key → location/value mapping in front of the log.
//!
//! ## Backends
//! - [`UnboundedIndex`]: HashMap, never evicts. Required for offset mode,
//!   where a miss must mean "key does not exist".
//! - [`BoundedIndex`]: LRU cache. A miss may only mean "evicted", so stores
//!   built on it keep full values and fall back to a log scan.

mod bounded;
mod unbounded;

use bytes::Bytes;

use crate::config::{CacheBackend, IndexMode};

pub use bounded::BoundedIndex;
pub use unbounded::UnboundedIndex;

/// What the index holds for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEntry {
    /// Byte offset of the key's live record
    Offset(u64),

    /// The key's current value
    Value(Bytes),
}

impl IndexEntry {
    /// Build the entry for a record at `offset` holding `value`
    pub fn for_mode(mode: IndexMode, offset: u64, value: &[u8]) -> Self {
        match mode {
            IndexMode::Offset => IndexEntry::Offset(offset),
            IndexMode::FullValue => IndexEntry::Value(Bytes::copy_from_slice(value)),
        }
    }
}

/// Capability set shared by all index backends
///
/// `get` takes `&mut self` because recency-tracking backends update state on
/// every hit.
pub trait Index: Send {
    fn get(&mut self, key: &[u8]) -> Option<IndexEntry>;

    /// Insert or replace, returning the replaced entry
    fn add(&mut self, key: Vec<u8>, entry: IndexEntry) -> Option<IndexEntry>;

    fn remove(&mut self, key: &[u8]) -> Option<IndexEntry>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if entries can disappear without a `remove`
    fn is_bounded(&self) -> bool;

    fn clear(&mut self);
}

/// Build the backend selected by the config
pub fn build(backend: CacheBackend) -> Box<dyn Index> {
    match backend {
        CacheBackend::Unbounded => Box::new(UnboundedIndex::new()),
        CacheBackend::Bounded { capacity } => Box::new(BoundedIndex::new(capacity)),
    }
}
