//! Compaction Module
//!
//! Removes records from the live view of a log.
//!
//! ## Strategies
//! - **Tombstone**: overwrite the record with a blank line of the same length.
//!   No other byte moves, so cached offsets of other keys stay valid. The only
//!   strategy allowed with an offset index.
//! - **RewriteSwap**: copy every other record into a temp file and rename it
//!   over the log. Offsets shift, so it is only allowed with a full-value
//!   index. The original log stays readable until the rename.
//!
//! The pairing is checked when a [`Compactor`] is built.

mod rewrite;
mod tombstone;

use tracing::{debug, info};

use crate::config::{DeleteStrategy, IndexMode};
use crate::error::{KvError, Result};
use crate::index::{Index, IndexEntry};
use crate::log::LogFile;

pub use rewrite::{compact_log, rewrite_without, temp_path};
pub use tombstone::{tombstone_all, tombstone_at};

/// Outcome of a full compaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionStats {
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub records_kept: u64,
}

/// Applies one delete strategy against one log/index pair
#[derive(Debug, Clone, Copy)]
pub struct Compactor {
    strategy: DeleteStrategy,
    mode: IndexMode,
}

impl Compactor {
    /// Build a compactor, rejecting strategies that would shift cached offsets
    pub fn new(strategy: DeleteStrategy, mode: IndexMode) -> Result<Self> {
        if strategy == DeleteStrategy::RewriteSwap && mode == IndexMode::Offset {
            return Err(KvError::Config(
                "rewrite-and-swap deletes cannot run against an offset index".to_string(),
            ));
        }
        Ok(Self { strategy, mode })
    }

    /// Delete `key` from the log and the index
    ///
    /// Fails with `KeyNotFound` (leaving the log untouched) if the key has no
    /// live record.
    pub fn delete(&self, log: &LogFile, index: &mut dyn Index, key: &[u8]) -> Result<()> {
        match (self.strategy, self.mode) {
            (DeleteStrategy::Tombstone, IndexMode::Offset) => {
                let offset = match index.get(key) {
                    Some(IndexEntry::Offset(offset)) => offset,
                    Some(IndexEntry::Value(_)) => {
                        return Err(KvError::Config(
                            "offset index holds a value entry".to_string(),
                        ))
                    }
                    None => return Err(KvError::KeyNotFound),
                };

                let len = tombstone_at(log, offset, key)?;
                index.remove(key);
                debug!(offset, len, "Tombstoned record");
                Ok(())
            }
            (strategy, IndexMode::FullValue) => {
                // Only an unbounded index can answer "absent" without the log
                if !index.is_bounded() && index.get(key).is_none() {
                    return Err(KvError::KeyNotFound);
                }

                // Value entries carry no offset, so either strategy walks the
                // whole log to find every copy of the key
                let removed = match strategy {
                    DeleteStrategy::Tombstone => tombstone_all(log, key)?,
                    DeleteStrategy::RewriteSwap => rewrite_without(log, key)?,
                };
                index.remove(key);

                if removed == 0 {
                    return Err(KvError::KeyNotFound);
                }
                debug!(removed, ?strategy, "Deleted records");
                Ok(())
            }
            (DeleteStrategy::RewriteSwap, IndexMode::Offset) => Err(KvError::Config(
                "rewrite-and-swap deletes cannot run against an offset index".to_string(),
            )),
        }
    }

    /// Blank the record a newer `put` of `key` has replaced
    ///
    /// Offset mode only; the log then holds one live record per key, so a
    /// later delete of that key cannot resurrect an older value on replay.
    pub fn discard_superseded(&self, log: &LogFile, offset: u64, key: &[u8]) -> Result<()> {
        if self.mode != IndexMode::Offset {
            return Ok(());
        }
        tombstone_at(log, offset, key)?;
        Ok(())
    }

    /// Rewrite the log keeping only the latest live record of each key
    ///
    /// Only valid for the rewrite strategy, since it moves every record.
    pub fn compact(&self, log: &LogFile) -> Result<CompactionStats> {
        if self.strategy != DeleteStrategy::RewriteSwap {
            return Err(KvError::Config(
                "full compaction requires the rewrite-and-swap strategy".to_string(),
            ));
        }

        let stats = compact_log(log)?;
        info!(
            path = %log.path().display(),
            before = stats.bytes_before,
            after = stats.bytes_after,
            kept = stats.records_kept,
            "Compacted log"
        );
        Ok(stats)
    }
}
