//! Log Module
//!
//! Append-only record log on durable storage.
//!
//! ## Responsibilities
//! - Append records and report the offset they start at
//! - Read one record back from a known offset
//! - Overwrite a record in place without shifting its neighbours
//! - Sequential, restartable scans in file order
//!
//! File handles are opened per operation and dropped before returning, so no
//! descriptor outlives a call, including on error paths.

mod file;
mod scanner;

pub use file::LogFile;
pub use scanner::{LogScanner, ScannedRecord};

/// A byte range in the log occupied by one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    /// Start of the line, from file start
    pub offset: u64,

    /// Length of the line, terminator included
    pub len: u64,
}
