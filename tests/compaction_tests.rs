//! Tests for deletes and compaction
//!
//! These tests verify:
//! - Strategy pairing is checked at construction
//! - In-place tombstones keep the log length and other offsets
//! - Rewrite-and-swap removes every copy of a key and leaves no temp file
//! - Full compaction keeps only the newest live record per key

use std::fs;

use logkv::compaction::{self, Compactor};
use logkv::config::{DeleteStrategy, IndexMode, SyncStrategy};
use logkv::index::{BoundedIndex, Index, IndexEntry, UnboundedIndex};
use logkv::log::LogFile;
use logkv::recovery::Recovery;
use logkv::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, LogFile) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("compact.csv");
    let log = LogFile::open(&path, SyncStrategy::OsBuffered).unwrap();
    (temp_dir, log)
}

fn live_keys(log: &LogFile) -> Vec<Vec<u8>> {
    log.scan()
        .unwrap()
        .map(|r| r.unwrap())
        .filter(|s| !s.record.is_tombstone())
        .map(|s| s.record.key)
        .collect()
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_rewrite_with_offset_index_rejected() {
    let result = Compactor::new(DeleteStrategy::RewriteSwap, IndexMode::Offset);
    assert!(matches!(result, Err(KvError::Config(_))));
}

#[test]
fn test_valid_pairings_accepted() {
    Compactor::new(DeleteStrategy::Tombstone, IndexMode::Offset).unwrap();
    Compactor::new(DeleteStrategy::Tombstone, IndexMode::FullValue).unwrap();
    Compactor::new(DeleteStrategy::RewriteSwap, IndexMode::FullValue).unwrap();
}

// =============================================================================
// Tombstone Strategy Tests
// =============================================================================

#[test]
fn test_tombstone_delete_keeps_length_and_offsets() {
    let (_temp, log) = setup_temp_log();
    let mut index = UnboundedIndex::new();
    Recovery::rebuild(&mut index, &log, IndexMode::Offset).unwrap();

    let a = log.append(b"alice", b"30").unwrap();
    index.add(b"alice".to_vec(), IndexEntry::Offset(a));
    let b = log.append(b"bob", b"25").unwrap();
    index.add(b"bob".to_vec(), IndexEntry::Offset(b));
    let before = log.len().unwrap();

    let compactor = Compactor::new(DeleteStrategy::Tombstone, IndexMode::Offset).unwrap();
    compactor.delete(&log, &mut index, b"alice").unwrap();

    assert_eq!(log.len().unwrap(), before);
    assert_eq!(index.get(b"alice"), None);
    assert_eq!(index.get(b"bob"), Some(IndexEntry::Offset(b)));
    assert_eq!(log.read_at(b).unwrap().value, b"25".to_vec());
    assert!(log.read_at(a).unwrap().is_tombstone());
}

#[test]
fn test_tombstone_delete_missing_key() {
    let (_temp, log) = setup_temp_log();
    log.append(b"alice", b"30").unwrap();
    let before = fs::read(log.path()).unwrap();

    let compactor = Compactor::new(DeleteStrategy::Tombstone, IndexMode::Offset).unwrap();
    let mut index = UnboundedIndex::new();
    let result = compactor.delete(&log, &mut index, b"bob");

    assert!(matches!(result, Err(KvError::KeyNotFound)));
    assert_eq!(fs::read(log.path()).unwrap(), before);
}

#[test]
fn test_tombstone_at_wrong_key_is_corrupt() {
    let (_temp, log) = setup_temp_log();
    let a = log.append(b"alice", b"30").unwrap();

    let result = compaction::tombstone_at(&log, a, b"bob");

    assert!(matches!(result, Err(KvError::CorruptRecord(_))));
    assert!(!log.read_at(a).unwrap().is_tombstone());
}

#[test]
fn test_tombstone_at_twice_is_corrupt() {
    let (_temp, log) = setup_temp_log();
    let a = log.append(b"alice", b"30").unwrap();

    assert_eq!(compaction::tombstone_at(&log, a, b"alice").unwrap(), 9);
    assert!(matches!(
        compaction::tombstone_at(&log, a, b"alice"),
        Err(KvError::CorruptRecord(_))
    ));
}

#[test]
fn test_tombstone_all_blanks_every_copy() {
    let (_temp, log) = setup_temp_log();
    log.append(b"alice", b"30").unwrap();
    log.append(b"bob", b"25").unwrap();
    log.append(b"alice", b"31").unwrap();
    let before = log.len().unwrap();

    let blanked = compaction::tombstone_all(&log, b"alice").unwrap();

    assert_eq!(blanked, 2);
    assert_eq!(log.len().unwrap(), before);
    assert_eq!(live_keys(&log), vec![b"bob".to_vec()]);
}

#[test]
fn test_tombstone_all_skips_corrupt_lines() {
    let (_temp, log) = setup_temp_log();
    fs::write(log.path(), b"alice,30\nbroken\nalice,31\n").unwrap();

    let blanked = compaction::tombstone_all(&log, b"alice").unwrap();

    assert_eq!(blanked, 2);
    assert_eq!(
        fs::read(log.path()).unwrap(),
        b",       \nbroken\n,       \n".to_vec()
    );
}

#[test]
fn test_tombstone_delete_full_value_bounded_after_eviction() {
    let (_temp, log) = setup_temp_log();
    let mut index = BoundedIndex::new(1);
    log.append(b"a", b"1").unwrap();
    log.append(b"b", b"2").unwrap();
    Recovery::rebuild(&mut index, &log, IndexMode::FullValue).unwrap();
    assert_eq!(index.get(b"a"), None); // evicted

    let compactor = Compactor::new(DeleteStrategy::Tombstone, IndexMode::FullValue).unwrap();
    compactor.delete(&log, &mut index, b"a").unwrap();

    assert_eq!(live_keys(&log), vec![b"b".to_vec()]);
}

// =============================================================================
// Rewrite Strategy Tests
// =============================================================================

#[test]
fn test_rewrite_removes_key_and_temp_file() {
    let (_temp, log) = setup_temp_log();
    log.append(b"alice", b"30").unwrap();
    log.append(b"bob", b"25").unwrap();
    log.append(b"alice", b"31").unwrap();

    let removed = compaction::rewrite_without(&log, b"alice").unwrap();

    assert_eq!(removed, 2);
    assert_eq!(fs::read(log.path()).unwrap(), b"bob,25\n".to_vec());
    assert!(!compaction::temp_path(log.path()).exists());
}

#[test]
fn test_rewrite_missing_key_leaves_log_untouched() {
    let (_temp, log) = setup_temp_log();
    log.append(b"alice", b"30").unwrap();
    let before = fs::read(log.path()).unwrap();

    let removed = compaction::rewrite_without(&log, b"bob").unwrap();

    assert_eq!(removed, 0);
    assert_eq!(fs::read(log.path()).unwrap(), before);
    assert!(!compaction::temp_path(log.path()).exists());
}

#[test]
fn test_rewrite_aborts_on_corrupt_line() {
    let (_temp, log) = setup_temp_log();
    fs::write(log.path(), b"alice,30\nbroken\nbob,25\n").unwrap();
    let before = fs::read(log.path()).unwrap();

    let result = compaction::rewrite_without(&log, b"alice");

    assert!(matches!(result, Err(KvError::CorruptRecord(_))));
    assert_eq!(fs::read(log.path()).unwrap(), before);
    assert!(!compaction::temp_path(log.path()).exists());
}

#[test]
fn test_rewrite_delete_updates_index() {
    let (_temp, log) = setup_temp_log();
    log.append(b"alice", b"30").unwrap();
    log.append(b"bob", b"25").unwrap();
    let mut index = UnboundedIndex::new();
    Recovery::rebuild(&mut index, &log, IndexMode::FullValue).unwrap();

    let compactor = Compactor::new(DeleteStrategy::RewriteSwap, IndexMode::FullValue).unwrap();
    compactor.delete(&log, &mut index, b"bob").unwrap();

    assert_eq!(index.get(b"bob"), None);
    assert!(index.get(b"alice").is_some());
    assert!(matches!(
        compactor.delete(&log, &mut index, b"bob"),
        Err(KvError::KeyNotFound)
    ));
}

#[test]
fn test_temp_path_is_sibling() {
    let (_temp, log) = setup_temp_log();
    let temp = compaction::temp_path(log.path());

    assert_eq!(temp.parent(), log.path().parent());
    assert_eq!(temp.file_name().unwrap(), "compact.csv.compact");
}

// =============================================================================
// Full Compaction Tests
// =============================================================================

#[test]
fn test_compact_keeps_newest_live_records() {
    let (_temp, log) = setup_temp_log();
    log.append(b"alice", b"30").unwrap();
    log.append(b"bob", b"25").unwrap();
    log.append(b"alice", b"31").unwrap();
    compaction::tombstone_all(&log, b"bob").unwrap();

    let compactor = Compactor::new(DeleteStrategy::RewriteSwap, IndexMode::FullValue).unwrap();
    let stats = compactor.compact(&log).unwrap();

    assert_eq!(stats.bytes_before, 25);
    assert_eq!(stats.bytes_after, 9);
    assert_eq!(stats.records_kept, 1);
    assert_eq!(fs::read(log.path()).unwrap(), b"alice,31\n".to_vec());
}

#[test]
fn test_compact_requires_rewrite_strategy() {
    let (_temp, log) = setup_temp_log();
    let compactor = Compactor::new(DeleteStrategy::Tombstone, IndexMode::FullValue).unwrap();

    assert!(matches!(compactor.compact(&log), Err(KvError::Config(_))));
}
