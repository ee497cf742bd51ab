//! Log File
//!
//! Positioned access to a single log file.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::SyncStrategy;
use crate::error::{KvError, Result};
use crate::record::{self, Record, LINE_SEP};

use super::LogScanner;

/// Handle to an append-only log file
///
/// Holds only the path; every operation opens its own file handle.
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
    sync_strategy: SyncStrategy,
}

impl LogFile {
    /// Open or create a log file
    ///
    /// The parent directory must already exist.
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            sync_strategy,
        })
    }

    /// Append a record, returning the offset it begins at
    ///
    /// The offset is derived from the file length after the write, so growth
    /// by anything else between open and write does not skew it.
    pub fn append(&self, key: &[u8], value: &[u8]) -> Result<u64> {
        // Rejected before any I/O
        let line = record::encode(key, value)?;

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if let Err(e) = file.write_all(&line) {
            // A partial line would swallow the next append
            drop(file);
            if let Err(seal) = self.seal_tail() {
                warn!(path = %self.path.display(), error = %seal, "Failed to terminate torn record");
            }
            return Err(e.into());
        }
        self.sync(&file)?;

        let end = file.metadata()?.len();
        end.checked_sub(line.len() as u64).ok_or_else(|| {
            KvError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "log shorter than the record just written",
            ))
        })
    }

    /// Decode the single record starting at `offset`
    pub fn read_at(&self, offset: u64) -> Result<Record> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        let read = reader.read_until(LINE_SEP, &mut line)?;
        if read == 0 {
            return Err(KvError::CorruptRecord(format!(
                "no record at offset {} (end of log)",
                offset
            )));
        }

        record::decode(&line).map_err(|e| match e {
            KvError::CorruptRecord(reason) => {
                KvError::CorruptRecord(format!("at offset {}: {}", offset, reason))
            }
            other => other,
        })
    }

    /// Overwrite bytes at `offset` without truncating or shifting the file
    pub fn overwrite_at(&self, offset: u64, bytes: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new().write(true).open(&self.path)?;

        let len = file.metadata()?.len();
        if offset + bytes.len() as u64 > len {
            return Err(KvError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "overwrite of {} bytes at offset {} runs past end of log ({} bytes)",
                    bytes.len(),
                    offset,
                    len
                ),
            )));
        }

        file.seek(SeekFrom::Start(offset))?;
        // write_all reports a short write as WriteZero
        file.write_all(bytes)?;
        self.sync(&file)
    }

    /// Terminate a torn final line so the next append starts on a fresh line
    ///
    /// Returns true if a terminator was written.
    pub fn seal_tail(&self) -> Result<bool> {
        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;

        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(false);
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        if last[0] == LINE_SEP {
            return Ok(false);
        }

        // Append mode: the terminator lands at the end regardless of the seek
        file.write_all(&[LINE_SEP])?;
        self.sync(&file)?;
        Ok(true)
    }

    /// Start a fresh scan from offset 0
    pub fn scan(&self) -> Result<LogScanner> {
        let file = File::open(&self.path)?;
        Ok(LogScanner::new(BufReader::new(file)))
    }

    /// Current byte length of the log
    pub fn len(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sync_strategy(&self) -> SyncStrategy {
        self.sync_strategy
    }

    fn sync(&self, file: &File) -> Result<()> {
        if self.sync_strategy == SyncStrategy::EveryWrite {
            file.sync_data()?;
        }
        Ok(())
    }
}
