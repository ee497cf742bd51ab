//! Recovery Module
//!
//! Rebuilds an index by replaying a log from the first byte.
//!
//! Later records of a key replace earlier ones, so the finished index holds
//! each live key's most recent location. Tombstones are skipped but still
//! advance the position. A line that fails to decode is skipped up to its
//! terminator and collected in the report rather than returned as an `Err`;
//! records after it are still replayed. An I/O error mid-scan stops the
//! replay and is reported the same way.

use tracing::{debug, info, warn};

use crate::config::IndexMode;
use crate::error::{KvError, Result};
use crate::index::{Index, IndexEntry};
use crate::log::LogFile;

/// Result of a recovery pass
#[derive(Debug, Default)]
pub struct RecoveryReport {
    /// Live records applied to the index
    pub records_replayed: u64,

    /// Tombstones passed over
    pub tombstones_skipped: u64,

    /// Bytes consumed before the scan ended
    pub bytes_scanned: u64,

    /// Keys held by the index when replay ended
    pub indexed_keys: u64,

    /// Offsets of live records replaced by a later record of the same key
    /// (offset mode only)
    pub superseded: Vec<u64>,

    /// Lines that failed to decode, plus an I/O error that ended the scan
    pub errors: Vec<KvError>,
}

impl RecoveryReport {
    /// True if every line of the log was replayed
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Log replay
pub struct Recovery;

impl Recovery {
    /// Replay `log` into `index`
    ///
    /// Returns `Err` only when the log cannot be opened.
    pub fn rebuild(index: &mut dyn Index, log: &LogFile, mode: IndexMode) -> Result<RecoveryReport> {
        let mut scanner = log.scan()?;
        let mut report = RecoveryReport::default();

        let mut position: u64 = 0;

        while let Some(item) = scanner.next() {
            // Running position, advanced by every consumed line
            let offset = position;
            position = scanner.position();

            let scanned = match item {
                Ok(scanned) => scanned,
                Err(e @ KvError::CorruptRecord(_)) => {
                    warn!(
                        path = %log.path().display(),
                        offset,
                        skipped = position - offset,
                        error = %e,
                        "Skipping corrupt log line"
                    );
                    report.errors.push(e);
                    continue;
                }
                Err(e) => {
                    warn!(
                        path = %log.path().display(),
                        offset,
                        error = %e,
                        "Log replay stopped early, keeping {} records",
                        report.records_replayed
                    );
                    report.errors.push(e);
                    break;
                }
            };
            debug_assert_eq!(offset, scanned.offset);

            if scanned.record.is_tombstone() {
                report.tombstones_skipped += 1;
                continue;
            }

            let record = scanned.record;
            let entry = IndexEntry::for_mode(mode, offset, &record.value);

            if let Some(IndexEntry::Offset(previous)) = index.add(record.key, entry) {
                report.superseded.push(previous);
            }
            report.records_replayed += 1;
        }

        report.bytes_scanned = position;
        report.indexed_keys = index.len() as u64;

        info!(
            path = %log.path().display(),
            records = report.records_replayed,
            tombstones = report.tombstones_skipped,
            indexed_keys = report.indexed_keys,
            bytes = report.bytes_scanned,
            errors = report.errors.len(),
            "Log replay finished"
        );
        if !report.superseded.is_empty() {
            debug!(
                count = report.superseded.len(),
                "Replay found superseded live records"
            );
        }

        Ok(report)
    }
}
