//! Record codec
//!
//! Encoding and decoding functions for log lines.

use crate::error::{KvError, Result};

use super::{Record, FIELD_SEP, LINE_SEP, MIN_LINE_LEN, PADDING};

// =============================================================================
// Validation
// =============================================================================

/// Check that a key can be stored (non-empty, no separators)
pub fn validate_key(key: &[u8]) -> Result<()> {
    validate_field("key", key)
}

/// Check that a value can be stored (non-empty, no separators)
pub fn validate_value(value: &[u8]) -> Result<()> {
    validate_field("value", value)
}

fn validate_field(name: &str, field: &[u8]) -> Result<()> {
    if field.is_empty() {
        return Err(KvError::InvalidRecord(format!("{} must not be empty", name)));
    }
    if field.contains(&FIELD_SEP) {
        return Err(KvError::InvalidRecord(format!(
            "{} must not contain the field separator ','",
            name
        )));
    }
    if field.contains(&LINE_SEP) {
        return Err(KvError::InvalidRecord(format!(
            "{} must not contain a line terminator",
            name
        )));
    }
    Ok(())
}

// =============================================================================
// Encoding/Decoding
// =============================================================================

/// Encode a record line
///
/// Format: key + ',' + value + '\n'
pub fn encode(key: &[u8], value: &[u8]) -> Result<Vec<u8>> {
    validate_key(key)?;
    validate_value(value)?;

    let mut line = Vec::with_capacity(key.len() + value.len() + 2);
    line.extend_from_slice(key);
    line.push(FIELD_SEP);
    line.extend_from_slice(value);
    line.push(LINE_SEP);
    Ok(line)
}

/// Decode exactly one line, terminator included
///
/// Returns a tombstone record (empty key) for blanked lines.
pub fn decode(line: &[u8]) -> Result<Record> {
    let body = match line.split_last() {
        Some((&LINE_SEP, body)) => body,
        Some(_) => {
            return Err(KvError::CorruptRecord(
                "record is missing its line terminator".to_string(),
            ))
        }
        None => return Err(KvError::CorruptRecord("empty record".to_string())),
    };

    if body.contains(&LINE_SEP) {
        return Err(KvError::CorruptRecord(
            "record contains an embedded line terminator".to_string(),
        ));
    }

    let sep = body.iter().position(|&b| b == FIELD_SEP).ok_or_else(|| {
        KvError::CorruptRecord("record is missing its field separator".to_string())
    })?;

    let (key, rest) = body.split_at(sep);
    let value = &rest[1..];

    if key.is_empty() {
        // Tombstone: only padding may follow the separator
        if value.iter().any(|&b| b != PADDING) {
            return Err(KvError::CorruptRecord(
                "tombstone padding contains data".to_string(),
            ));
        }
        return Ok(Record::new(Vec::new(), value.to_vec()));
    }

    if value.contains(&FIELD_SEP) {
        return Err(KvError::CorruptRecord(
            "record has more than one field separator".to_string(),
        ));
    }
    if value.is_empty() {
        return Err(KvError::CorruptRecord("record has an empty value".to_string()));
    }

    Ok(Record::new(key.to_vec(), value.to_vec()))
}

/// Produce a tombstone of exactly `len` bytes
pub fn blank_of(len: usize) -> Result<Vec<u8>> {
    if len < MIN_LINE_LEN {
        return Err(KvError::InvalidRecord(format!(
            "tombstone needs at least {} bytes, got {}",
            MIN_LINE_LEN, len
        )));
    }

    let mut blank = Vec::with_capacity(len);
    blank.push(FIELD_SEP);
    blank.resize(len - 1, PADDING);
    blank.push(LINE_SEP);
    Ok(blank)
}
