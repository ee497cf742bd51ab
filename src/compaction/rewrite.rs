//! Rewrite-and-swap
//!
//! Copies the surviving records into `<log>.compact` next to the log, syncs
//! it, then renames it over the log. The rename is the only step a reader of
//! the log can observe; a failure before it leaves the original intact.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::log::{LogFile, ScannedRecord};
use crate::record;

use super::CompactionStats;

/// Path of the temp file used while rewriting `log_path`
pub fn temp_path(log_path: &Path) -> PathBuf {
    let mut name = log_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".compact");
    log_path.with_file_name(name)
}

/// Remove every record of `key`, returning how many were removed
///
/// Tombstones are dropped along the way. When nothing matches, the temp
/// file is discarded and the log is left untouched.
pub fn rewrite_without(log: &LogFile, key: &[u8]) -> Result<usize> {
    let mut removed = 0;
    let mut rewrite = Rewrite::new(log.path());

    let kept = rewrite.write(log, |scanned| {
        if scanned.record.key == key {
            removed += 1;
            false
        } else {
            true
        }
    })?;

    if removed == 0 {
        // Dropping the rewrite removes the temp file
        return Ok(0);
    }

    rewrite.commit(log.path())?;
    debug!(removed, kept, "Rewrote log without key");
    Ok(removed)
}

/// Keep only the newest live record of each key
pub fn compact_log(log: &LogFile) -> Result<CompactionStats> {
    let bytes_before = log.len()?;

    // First pass: where does each key's newest record start?
    let mut newest: HashMap<Vec<u8>, u64> = HashMap::new();
    for item in log.scan()? {
        let scanned = item?;
        if !scanned.record.is_tombstone() {
            newest.insert(scanned.record.key, scanned.offset);
        }
    }

    let mut rewrite = Rewrite::new(log.path());
    let kept = rewrite.write(log, |scanned| {
        newest.get(&scanned.record.key) == Some(&scanned.offset)
    })?;
    rewrite.commit(log.path())?;

    Ok(CompactionStats {
        bytes_before,
        bytes_after: log.len()?,
        records_kept: kept,
    })
}

// =============================================================================
// Temp File Handling
// =============================================================================

/// A temp file that is removed on drop unless committed
struct Rewrite {
    path: PathBuf,
    committed: bool,
}

impl Rewrite {
    fn new(log_path: &Path) -> Self {
        Self {
            path: temp_path(log_path),
            committed: false,
        }
    }

    /// Copy the live records `keep` accepts, then sync; returns the count
    ///
    /// A corrupt line aborts the copy so its bytes are never dropped from
    /// the log silently.
    fn write<F>(&mut self, log: &LogFile, mut keep: F) -> Result<u64>
    where
        F: FnMut(&ScannedRecord) -> bool,
    {
        let mut writer = BufWriter::new(File::create(&self.path)?);

        let mut kept = 0;
        for item in log.scan()? {
            let scanned = item?;
            if scanned.record.is_tombstone() || !keep(&scanned) {
                continue;
            }
            let line = record::encode(&scanned.record.key, &scanned.record.value)?;
            writer.write_all(&line)?;
            kept += 1;
        }

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(kept)
    }

    /// Atomically replace the log with the temp file
    fn commit(mut self, log_path: &Path) -> Result<()> {
        fs::rename(&self.path, log_path)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Rewrite {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove temp file")
            }
        }
    }
}
