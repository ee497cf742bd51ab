//! Log Scanner
//!
//! Lazy, file-ordered iteration over every line of a log.

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::error::{KvError, Result};
use crate::record::{self, Record, LINE_SEP};

use super::Extent;

/// One line yielded by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    /// Where the line starts
    pub offset: u64,

    /// Decoded line (tombstones have an empty key)
    pub record: Record,
}

impl ScannedRecord {
    pub fn extent(&self) -> Extent {
        Extent {
            offset: self.offset,
            len: self.record.encoded_len(),
        }
    }
}

/// Iterator over log lines
///
/// Offsets are the running sum of the lengths of lines already consumed.
/// A line that does not decode is yielded as `CorruptRecord` and skipped up
/// to its terminator; the scan then continues with the next line. An I/O
/// error is yielded once and ends the iteration.
pub struct LogScanner {
    reader: BufReader<File>,
    position: u64,
    buf: Vec<u8>,
    done: bool,
}

impl LogScanner {
    pub(super) fn new(reader: BufReader<File>) -> Self {
        Self {
            reader,
            position: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    fn read_next(&mut self) -> Result<Option<ScannedRecord>> {
        self.buf.clear();
        let read = self.reader.read_until(LINE_SEP, &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }

        // Advance by the bytes consumed, whether or not they decode
        let offset = self.position;
        self.position += read as u64;

        let record = record::decode(&self.buf).map_err(|e| match e {
            KvError::CorruptRecord(reason) => {
                KvError::CorruptRecord(format!("at offset {}: {}", offset, reason))
            }
            other => other,
        })?;

        Ok(Some(ScannedRecord { offset, record }))
    }

    /// Bytes consumed so far, corrupt lines included
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Iterator for LogScanner {
    type Item = Result<ScannedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_next() {
            Ok(Some(scanned)) => Some(Ok(scanned)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e @ KvError::CorruptRecord(_)) => Some(Err(e)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
