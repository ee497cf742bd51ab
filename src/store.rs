//! Store Module
//!
//! One log file, one index and one compactor behind the put/get/delete
//! contract.
//!
//! ## Concurrency
//! Every operation holds the store's mutex for its whole duration, so puts
//! and deletes of the same key are serialized against each other. Separate
//! stores share nothing and can be driven from different threads.

use std::fs;
use std::path::Path;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::compaction::{CompactionStats, Compactor};
use crate::config::{Config, DeleteStrategy, IndexMode};
use crate::error::{KvError, Result};
use crate::index::{self, Index, IndexEntry};
use crate::log::LogFile;
use crate::record;
use crate::recovery::{Recovery, RecoveryReport};

/// The put/get/delete contract consumed by callers
pub trait KvStore {
    /// Store `value` under `key`, replacing any previous value
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Fetch the current value of `key`, or `KeyNotFound`
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;

    /// Remove `key`, or `KeyNotFound` if it has no value
    fn delete(&self, key: &[u8]) -> Result<()>;
}

/// A single log with its index
pub struct Store {
    log: LogFile,
    mode: IndexMode,
    compactor: Compactor,

    /// Serializes all operations on this store
    index: Mutex<Box<dyn Index>>,

    /// Outcome of the replay run by `open`
    recovery: RecoveryReport,
}

impl Store {
    /// Open or create the log at `path` and replay it into a fresh index
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Create the parent directory and the log file if missing, and
    ///    terminate a torn final record
    /// 3. Replay the log into the configured index backend
    /// 4. Blank any superseded live records the replay found (offset mode)
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        // Step 1: Reject unsafe mode/backend/strategy combinations
        config.validate()?;
        let compactor = Compactor::new(config.delete_strategy, config.index_mode)?;

        // Step 2: Create directory and log
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let log = LogFile::open(path, config.sync_strategy)?;
        if log.seal_tail()? {
            warn!(path = %path.display(), "Terminated a torn record at the end of the log");
        }

        // Step 3: Replay
        let mut index = index::build(config.cache_backend);
        let recovery = Recovery::rebuild(index.as_mut(), &log, config.index_mode)?;
        if !recovery.is_complete() {
            warn!(
                path = %path.display(),
                errors = recovery.errors.len(),
                "Opened with partial recovery"
            );
        }

        // Step 4: A crash between append and blanking can leave older live
        // copies behind; blank them so a later delete cannot resurrect them
        if config.index_mode == IndexMode::Offset
            && config.delete_strategy == DeleteStrategy::Tombstone
        {
            for &offset in &recovery.superseded {
                let stale = log.read_at(offset)?;
                compactor.discard_superseded(&log, offset, &stale.key)?;
            }
            if !recovery.superseded.is_empty() {
                warn!(
                    path = %path.display(),
                    count = recovery.superseded.len(),
                    "Blanked superseded records left by an interrupted put"
                );
            }
        }

        info!(
            path = %path.display(),
            keys = index.len(),
            mode = ?config.index_mode,
            "Store opened"
        );

        Ok(Self {
            log,
            mode: config.index_mode,
            compactor,
            index: Mutex::new(index),
            recovery,
        })
    }

    /// Append the record, then point the index at it
    ///
    /// In offset mode the record it replaces is blanked afterwards. The put
    /// has taken effect once the index is updated; a failed blank is logged
    /// and left for the repair pass of the next `open`.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut index = self.index.lock();

        let offset = self.log.append(key, value)?;
        let previous = index.add(key.to_vec(), IndexEntry::for_mode(self.mode, offset, value));

        if let Some(IndexEntry::Offset(old)) = previous {
            if let Err(e) = self.compactor.discard_superseded(&self.log, old, key) {
                warn!(
                    path = %self.log.path().display(),
                    offset = old,
                    error = %e,
                    "Failed to blank superseded record"
                );
            }
        }

        debug!(offset, len = value.len(), "put");
        Ok(())
    }

    /// Look up `key`
    ///
    /// Search order:
    /// 1. Index (offset → positioned read, value → returned directly)
    /// 2. Log scan, only for a bounded index where a miss may be an eviction
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        record::validate_key(key)?;
        let mut index = self.index.lock();

        match index.get(key) {
            Some(IndexEntry::Offset(offset)) => {
                let found = self.log.read_at(offset)?;
                if found.is_tombstone() || found.key != key {
                    return Err(KvError::CorruptRecord(format!(
                        "index points {:?} at offset {}, which holds a different record",
                        String::from_utf8_lossy(key),
                        offset
                    )));
                }
                Ok(found.value)
            }
            Some(IndexEntry::Value(value)) => Ok(value.to_vec()),
            None if index.is_bounded() => {
                let value = self.scan_for(key)?.ok_or(KvError::KeyNotFound)?;
                debug!("get: cache miss served from log scan");
                index.add(key.to_vec(), IndexEntry::Value(Bytes::from(value.clone())));
                Ok(value)
            }
            None => Err(KvError::KeyNotFound),
        }
    }

    /// Remove `key` using the configured delete strategy
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        record::validate_key(key)?;
        let mut index = self.index.lock();
        self.compactor.delete(&self.log, &mut **index, key)
    }

    /// Rewrite the log down to one record per live key
    pub fn compact(&self) -> Result<CompactionStats> {
        let _index = self.index.lock();
        self.compactor.compact(&self.log)
    }

    /// Latest live value of `key` in the log (later records win)
    ///
    /// Corrupt lines are skipped; they were already reported at open.
    fn scan_for(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut latest = None;
        for item in self.log.scan()? {
            let scanned = match item {
                Ok(scanned) => scanned,
                Err(KvError::CorruptRecord(_)) => continue,
                Err(e) => return Err(e),
            };
            if scanned.record.key == key {
                latest = Some(scanned.record.value);
            }
        }
        Ok(latest)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of keys currently held by the index
    pub fn indexed_keys(&self) -> usize {
        self.index.lock().len()
    }

    /// Current byte length of the log
    pub fn log_len(&self) -> Result<u64> {
        self.log.len()
    }

    pub fn path(&self) -> &Path {
        self.log.path()
    }

    pub fn index_mode(&self) -> IndexMode {
        self.mode
    }

    /// Report from the replay run at open
    pub fn recovery(&self) -> &RecoveryReport {
        &self.recovery
    }
}

impl KvStore for Store {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        Store::put(self, key, value)
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        Store::get(self, key)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        Store::delete(self, key)
    }
}
