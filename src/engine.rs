//! Engine Module
//!
//! The top-level store that owns one or more shard stores.
//!
//! ## Responsibilities
//! - Create the data directory and validate the config
//! - Open one log, or one log per shard bucket (recovered in parallel)
//! - Route each key to its shard
//! - Aggregate stats across shards

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::compaction::CompactionStats;
use crate::config::{Config, Sharding};
use crate::error::{KvError, Result};
use crate::record;
use crate::recovery::RecoveryReport;
use crate::shard::{ShardRouter, SHARD_COUNT};
use crate::store::{KvStore, Store};

/// The main storage engine
///
/// ## Concurrency Model
///
/// Each shard store serializes its own operations behind a mutex. Shards
/// touch disjoint files and disjoint indexes, so operations on keys in
/// different shards proceed in parallel. The engine itself holds no lock.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// One store (single) or `SHARD_COUNT` stores in bucket order (sharded)
    shards: Vec<Store>,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// Blocks until every log has been replayed. Any failure here is fatal
    /// for the caller; there is no retry.
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: Reject unsafe combinations before touching disk
        config.validate()?;

        // Step 2: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir)?;

        // Step 3: Open and recover the logs
        let shards = match config.sharding {
            Sharding::Single => vec![Store::open(&config.log_path(), &config)?],
            Sharding::ByLastChar => Self::open_shards(&config)?,
        };

        info!(
            data_dir = %config.data_dir.display(),
            shards = shards.len(),
            keys = shards.iter().map(Store::indexed_keys).sum::<usize>(),
            "Engine opened"
        );

        Ok(Self { config, shards })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Recover every shard on its own thread
    fn open_shards(config: &Config) -> Result<Vec<Store>> {
        let mut paths = Vec::with_capacity(SHARD_COUNT);
        for shard in 0..SHARD_COUNT {
            paths.push(Self::shard_path(config, shard)?);
        }

        let results = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = paths
                .iter()
                .map(|path| scope.spawn(move |_| Store::open(path, config)))
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(recovery_panicked()))
                })
                .collect::<Vec<_>>()
        })
        .map_err(|_| recovery_panicked())?;

        results.into_iter().collect()
    }

    /// Log path of one shard
    fn shard_path(config: &Config, shard: usize) -> Result<PathBuf> {
        ShardRouter::shard_file_name(&config.log_file_name, shard)
            .map(|name| config.data_dir.join(name))
            .ok_or_else(|| {
                KvError::Config(format!(
                    "cannot derive a shard file name from {:?}",
                    config.log_file_name
                ))
            })
    }

    /// Store responsible for `key`
    ///
    /// Bad keys are rejected here, before any I/O.
    fn store_for(&self, key: &[u8]) -> Result<&Store> {
        record::validate_key(key)?;
        match self.config.sharding {
            Sharding::Single => Ok(&self.shards[0]),
            Sharding::ByLastChar => Ok(&self.shards[ShardRouter::route(key)?]),
        }
    }

    /// Put a key-value pair
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        record::validate_value(value)?;
        self.store_for(key)?.put(key, value)
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.store_for(key)?.get(key)
    }

    /// Delete a key
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.store_for(key)?.delete(key)
    }

    /// Compact every log, summing the stats
    ///
    /// Requires the rewrite-and-swap delete strategy.
    pub fn compact(&self) -> Result<CompactionStats> {
        let mut total = CompactionStats::default();
        for store in &self.shards {
            let stats = store.compact()?;
            total.bytes_before += stats.bytes_before;
            total.bytes_after += stats.bytes_after;
            total.records_kept += stats.records_kept;
        }
        Ok(total)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of logs this engine manages
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Keys held by all indexes (resident keys only for a bounded cache)
    pub fn len(&self) -> usize {
        self.shards.iter().map(Store::indexed_keys).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total byte length of all logs
    pub fn log_len(&self) -> Result<u64> {
        self.shards.iter().map(Store::log_len).sum()
    }

    /// Shard stores in bucket order
    pub fn shards(&self) -> &[Store] {
        &self.shards
    }

    /// Recovery reports from open, in shard order
    pub fn recovery_reports(&self) -> Vec<&RecoveryReport> {
        self.shards.iter().map(Store::recovery).collect()
    }
}

impl KvStore for Engine {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        Engine::put(self, key, value)
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        Engine::get(self, key)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        Engine::delete(self, key)
    }
}

fn recovery_panicked() -> KvError {
    KvError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "shard recovery thread panicked",
    ))
}
