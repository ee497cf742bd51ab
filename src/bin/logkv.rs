//! LogKV CLI
//!
//! Runs one store operation against a local data directory.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use logkv::config::{CacheBackend, DeleteStrategy, IndexMode, Sharding, SyncStrategy};
use logkv::{Config, Engine, KvError};
use tracing_subscriber::{fmt, EnvFilter};

/// LogKV CLI
#[derive(Parser, Debug)]
#[command(name = "logkv")]
#[command(about = "Append-only log key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./storage")]
    data_dir: String,

    /// What the index caches per key
    #[arg(long, value_enum, default_value_t = ModeArg::Offset)]
    mode: ModeArg,

    /// Use a bounded LRU cache of this many entries (value mode only)
    #[arg(long)]
    cache_capacity: Option<usize>,

    /// How deletes neutralize records
    #[arg(long, value_enum, default_value_t = StrategyArg::Tombstone)]
    delete_strategy: StrategyArg,

    /// Spread keys over one log per last character
    #[arg(long)]
    sharded: bool,

    /// Skip fsync after writes
    #[arg(long)]
    no_sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeArg {
    Offset,
    Value,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StrategyArg {
    Tombstone,
    Rewrite,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Rewrite the logs down to live records (rewrite strategy only)
    Compact,

    /// Print key and byte counts
    Stats,
}

impl Args {
    fn config(&self) -> Config {
        let index_mode = match self.mode {
            ModeArg::Offset => IndexMode::Offset,
            ModeArg::Value => IndexMode::FullValue,
        };
        let cache_backend = match self.cache_capacity {
            Some(capacity) => CacheBackend::Bounded { capacity },
            None => CacheBackend::Unbounded,
        };
        let delete_strategy = match self.delete_strategy {
            StrategyArg::Tombstone => DeleteStrategy::Tombstone,
            StrategyArg::Rewrite => DeleteStrategy::RewriteSwap,
        };

        Config::builder()
            .data_dir(&self.data_dir)
            .index_mode(index_mode)
            .cache_backend(cache_backend)
            .delete_strategy(delete_strategy)
            .sharding(if self.sharded {
                Sharding::ByLastChar
            } else {
                Sharding::Single
            })
            .sync_strategy(if self.no_sync {
                SyncStrategy::OsBuffered
            } else {
                SyncStrategy::EveryWrite
            })
            .build()
    }
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,logkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("LogKV v{}", logkv::VERSION);

    let engine = match Engine::open(args.config()) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to open store at {}: {}", args.data_dir, e);
            return ExitCode::FAILURE;
        }
    };

    match run(&engine, &args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(KvError::KeyNotFound) => {
            eprintln!("(not found)");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(engine: &Engine, command: &Commands) -> logkv::Result<()> {
    match command {
        Commands::Get { key } => {
            let value = engine.get(key.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Commands::Put { key, value } => {
            engine.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { key } => {
            engine.delete(key.as_bytes())?;
            println!("OK");
        }
        Commands::Compact => {
            let stats = engine.compact()?;
            println!(
                "compacted {} -> {} bytes, {} records kept",
                stats.bytes_before, stats.bytes_after, stats.records_kept
            );
        }
        Commands::Stats => {
            println!("shards: {}", engine.shard_count());
            println!("indexed keys: {}", engine.len());
            println!("log bytes: {}", engine.log_len()?);
            let partial = engine
                .recovery_reports()
                .iter()
                .filter(|report| !report.is_complete())
                .count();
            if partial > 0 {
                println!("partially recovered logs: {}", partial);
            }
        }
    }
    Ok(())
}
