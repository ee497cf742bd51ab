//! In-place tombstoning
//!
//! Length-preserving overwrites. The log never shrinks.

use crate::error::{KvError, Result};
use crate::log::LogFile;
use crate::record;

/// Overwrite the record of `key` at `offset` with a blank of equal length
///
/// The record is read first to learn its length and to check that it
/// really belongs to `key`. Returns the number of bytes blanked.
pub fn tombstone_at(log: &LogFile, offset: u64, key: &[u8]) -> Result<u64> {
    let existing = log.read_at(offset)?;

    if existing.is_tombstone() {
        return Err(KvError::CorruptRecord(format!(
            "offset {} already holds a tombstone",
            offset
        )));
    }
    if existing.key != key {
        return Err(KvError::CorruptRecord(format!(
            "offset {} holds key {:?}, expected {:?}",
            offset,
            String::from_utf8_lossy(&existing.key),
            String::from_utf8_lossy(key)
        )));
    }

    let len = existing.encoded_len();
    let blank = record::blank_of(len as usize)?;
    log.overwrite_at(offset, &blank)?;
    Ok(len)
}

/// Blank every live record of `key`, returning how many were blanked
///
/// Used when the index does not know where the key lives.
pub fn tombstone_all(log: &LogFile, key: &[u8]) -> Result<usize> {
    // Collect first so the scan's handle is closed before writing
    let mut targets = Vec::new();
    for item in log.scan()? {
        // A corrupt line cannot be a record of `key`
        let scanned = match item {
            Ok(scanned) => scanned,
            Err(KvError::CorruptRecord(_)) => continue,
            Err(e) => return Err(e),
        };
        if scanned.record.key == key {
            targets.push(scanned.extent());
        }
    }

    for extent in &targets {
        let blank = record::blank_of(extent.len as usize)?;
        log.overwrite_at(extent.offset, &blank)?;
    }

    Ok(targets.len())
}
