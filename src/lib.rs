//! # LogKV
//!
//! A persistent key-value store with:
//! - An append-only, line-delimited log file (or 36 sharded logs)
//! - An in-memory index holding either record offsets or full values
//! - In-place tombstone deletes that never shift a cached offset
//! - Rewrite-and-swap deletes and compaction for value-cached stores
//! - Blocking log replay on startup
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                               │
//! │                (put / get / delete contract)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Shard Router (last char → bucket)
//!          ┌────────────┼────────────┐
//!          ▼            ▼            ▼
//!   ┌─────────────┐ ┌────────┐ ┌─────────────┐
//!   │  Store (a)  │ │  ...   │ │  Store (9)  │
//!   └──────┬──────┘ └────────┘ └─────────────┘
//!          │
//!    ┌─────┴───────────┬────────────────┐
//!    ▼                 ▼                ▼
//! ┌────────┐    ┌─────────────┐   ┌───────────┐
//! │ Index  │    │  Log File   │   │ Compactor │
//! │HashMap │    │ key,value\n │   │ tombstone │
//! │ or LRU │    │   (append)  │   │ / rewrite │
//! └────────┘    └─────────────┘   └───────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod log;
pub mod index;
pub mod recovery;
pub mod compaction;
pub mod shard;
pub mod store;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::Engine;
pub use store::{KvStore, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LogKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
