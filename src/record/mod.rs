//! Record Module
//!
//! Defines the on-disk record format of the log.
//!
//! ## Responsibilities
//! - Encode (key, value) pairs as delimited lines
//! - Decode lines back into records
//! - Produce length-matched tombstones for in-place deletes
//!
//! ## Line Format
//! ```text
//! ┌─────────────┬───┬───────────────┬────┐
//! │ key (≥1)    │ , │ value (≥1)    │ \n │   live record
//! └─────────────┴───┴───────────────┴────┘
//! ┌───┬───────────────────────────────┬────┐
//! │ , │ padding (spaces)              │ \n │   tombstone, same total length
//! └───┴───────────────────────────────┴────┘
//! ```
//!
//! No header, no checksum. A tombstone is recognized by its empty key field.

mod codec;

pub use codec::{blank_of, decode, encode, validate_key, validate_value};

/// Separates key from value
pub const FIELD_SEP: u8 = b',';

/// Terminates every record
pub const LINE_SEP: u8 = b'\n';

/// Padding byte inside tombstones
pub const PADDING: u8 = b' ';

/// Smallest possible encoded line: separator + terminator
pub const MIN_LINE_LEN: usize = 2;

/// A decoded line of the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Empty for tombstones
    pub key: Vec<u8>,

    /// Padding for tombstones
    pub value: Vec<u8>,
}

impl Record {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// True if this line is a deleted-record placeholder
    pub fn is_tombstone(&self) -> bool {
        self.key.is_empty()
    }

    /// Number of bytes this record occupies in the log
    pub fn encoded_len(&self) -> u64 {
        (self.key.len() + 1 + self.value.len() + 1) as u64
    }
}
