//! Tests for the record codec
//!
//! These tests verify:
//! - Line layout of encoded records
//! - Rejection of keys and values that would break framing
//! - Decoding of live records and tombstones
//! - Corruption detection
//! - Length-matched blanks

use logkv::record::{self, Record};
use logkv::KvError;

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_single_record() {
    let line = record::encode(b"bob", b"25").unwrap();
    assert_eq!(line, b"bob,25\n".to_vec());
}

#[test]
fn test_encode_rejects_field_separator() {
    assert!(matches!(
        record::encode(b"a,b", b"1"),
        Err(KvError::InvalidRecord(_))
    ));
    assert!(matches!(
        record::encode(b"a", b"1,2"),
        Err(KvError::InvalidRecord(_))
    ));
}

#[test]
fn test_encode_rejects_line_separator() {
    assert!(matches!(
        record::encode(b"a\nb", b"1"),
        Err(KvError::InvalidRecord(_))
    ));
    assert!(matches!(
        record::encode(b"a", b"1\n"),
        Err(KvError::InvalidRecord(_))
    ));
}

#[test]
fn test_encode_rejects_empty_fields() {
    assert!(matches!(record::encode(b"", b"1"), Err(KvError::InvalidRecord(_))));
    assert!(matches!(record::encode(b"a", b""), Err(KvError::InvalidRecord(_))));
}

#[test]
fn test_encode_binary_value() {
    let value = [0u8, 1, 2, 255, b' '];
    let line = record::encode(b"bin", &value).unwrap();
    let decoded = record::decode(&line).unwrap();
    assert_eq!(decoded.value, value.to_vec());
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_live_record() {
    let record = record::decode(b"alice,31\n").unwrap();
    assert_eq!(record, Record::new(b"alice".to_vec(), b"31".to_vec()));
    assert!(!record.is_tombstone());
    assert_eq!(record.encoded_len(), 9);
}

#[test]
fn test_decode_missing_terminator() {
    assert!(matches!(
        record::decode(b"alice,31"),
        Err(KvError::CorruptRecord(_))
    ));
}

#[test]
fn test_decode_missing_separator() {
    assert!(matches!(
        record::decode(b"alice31\n"),
        Err(KvError::CorruptRecord(_))
    ));
}

#[test]
fn test_decode_extra_separator() {
    assert!(matches!(
        record::decode(b"alice,3,1\n"),
        Err(KvError::CorruptRecord(_))
    ));
}

#[test]
fn test_decode_empty_value() {
    assert!(matches!(
        record::decode(b"alice,\n"),
        Err(KvError::CorruptRecord(_))
    ));
}

#[test]
fn test_decode_empty_input() {
    assert!(matches!(record::decode(b""), Err(KvError::CorruptRecord(_))));
}

#[test]
fn test_decode_tombstone_with_data_is_corrupt() {
    assert!(matches!(
        record::decode(b",  x \n"),
        Err(KvError::CorruptRecord(_))
    ));
}

// =============================================================================
// Blank Tests
// =============================================================================

#[test]
fn test_blank_matches_record_length() {
    let line = record::encode(b"alice", b"30").unwrap();
    let blank = record::blank_of(line.len()).unwrap();

    assert_eq!(blank.len(), line.len());
    assert_eq!(blank, b",       \n".to_vec());

    let decoded = record::decode(&blank).unwrap();
    assert!(decoded.is_tombstone());
    assert_eq!(decoded.encoded_len(), line.len() as u64);
}

#[test]
fn test_blank_of_smallest_record() {
    // "k,v\n" is the shortest live record
    let blank = record::blank_of(4).unwrap();
    assert_eq!(blank, b",  \n".to_vec());
}

#[test]
fn test_blank_too_short() {
    assert!(matches!(record::blank_of(0), Err(KvError::InvalidRecord(_))));
    assert!(matches!(record::blank_of(1), Err(KvError::InvalidRecord(_))));
}
