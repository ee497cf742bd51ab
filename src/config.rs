//! Configuration for LogKV
//!
//! Centralized configuration with sensible defaults.
//!
//! Some combinations of index mode, cache backend and delete strategy would let
//! a cached offset point at shifted or reclaimed bytes. [`Config::validate`]
//! rejects them, and every store constructor calls it before touching disk.

use std::path::PathBuf;

use crate::error::{KvError, Result};

/// Main configuration for a LogKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all log files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── data_records.csv       (single log)
    ///     └── data_records_{a..z,0..9}.csv   (sharded logs)
    pub data_dir: PathBuf,

    /// File name of the log (shard files derive their names from it)
    pub log_file_name: String,

    /// Sync strategy: when to fsync the log
    pub sync_strategy: SyncStrategy,

    /// Single log, or one log per key bucket
    pub sharding: Sharding,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// What the index stores per key
    pub index_mode: IndexMode,

    /// Which index backend to build
    pub cache_backend: CacheBackend,

    // -------------------------------------------------------------------------
    // Compaction Configuration
    // -------------------------------------------------------------------------
    /// How deletes neutralize records in the log
    pub delete_strategy: DeleteStrategy,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every append and overwrite (safest, slowest)
    EveryWrite,

    /// Leave flushing to the OS page cache
    OsBuffered,
}

/// What an index entry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// key -> byte offset of its live record
    Offset,

    /// key -> full value
    FullValue,
}

/// Index backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// HashMap, never evicts
    Unbounded,

    /// LRU cache holding at most `capacity` entries
    Bounded { capacity: usize },
}

/// Delete strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStrategy {
    /// Overwrite the record in place with a length-matched tombstone
    Tombstone,

    /// Copy every other record to a temp file and rename it over the log
    RewriteSwap,
}

/// Key partitioning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sharding {
    /// All keys in one log
    Single,

    /// One log per bucket, chosen by the key's last character
    ByLastChar,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./storage"),
            log_file_name: "data_records.csv".to_string(),
            sync_strategy: SyncStrategy::EveryWrite,
            sharding: Sharding::Single,
            index_mode: IndexMode::Offset,
            cache_backend: CacheBackend::Unbounded,
            delete_strategy: DeleteStrategy::Tombstone,
        }
    }
}

impl Config {
    /// Default capacity for the bounded backend
    pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject configurations that cannot keep cached locations valid
    pub fn validate(&self) -> Result<()> {
        if self.index_mode == IndexMode::Offset {
            if self.delete_strategy == DeleteStrategy::RewriteSwap {
                return Err(KvError::Config(
                    "offset index cannot be combined with rewrite-and-swap deletes: \
                     the rewrite shifts cached offsets"
                        .to_string(),
                ));
            }
            if let CacheBackend::Bounded { .. } = self.cache_backend {
                return Err(KvError::Config(
                    "offset index requires the unbounded backend: an evicted offset \
                     is indistinguishable from a missing key"
                        .to_string(),
                ));
            }
        }

        if let CacheBackend::Bounded { capacity: 0 } = self.cache_backend {
            return Err(KvError::Config(
                "bounded cache capacity must be at least 1".to_string(),
            ));
        }

        let name = self.log_file_name.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(KvError::Config(format!(
                "log file name must be a plain file name, got {:?}",
                name
            )));
        }

        Ok(())
    }

    /// Full path of the single (unsharded) log
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(&self.log_file_name)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all log files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the log file name
    pub fn log_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.log_file_name = name.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the sharding mode
    pub fn sharding(mut self, sharding: Sharding) -> Self {
        self.config.sharding = sharding;
        self
    }

    /// Set the index mode
    pub fn index_mode(mut self, mode: IndexMode) -> Self {
        self.config.index_mode = mode;
        self
    }

    /// Set the cache backend
    pub fn cache_backend(mut self, backend: CacheBackend) -> Self {
        self.config.cache_backend = backend;
        self
    }

    /// Set the delete strategy
    pub fn delete_strategy(mut self, strategy: DeleteStrategy) -> Self {
        self.config.delete_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
