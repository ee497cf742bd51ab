//! Shard Router
//!
//! Maps a key to one of 36 buckets by its last byte, ASCII case-folded:
//! `a`..`z` are buckets 0..25 and `0`..`9` are buckets 26..35. Routing is a
//! pure function of the key.

use std::path::Path;

use crate::error::{KvError, Result};

/// Bucket characters, in bucket order
pub const BUCKETS: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Number of shards in a sharded engine
pub const SHARD_COUNT: usize = BUCKETS.len();

/// Stateless key → shard mapping
pub struct ShardRouter;

impl ShardRouter {
    /// Shard index for `key`
    pub fn route(key: &[u8]) -> Result<usize> {
        let last = key
            .last()
            .ok_or_else(|| KvError::UnroutableKey("empty key".to_string()))?
            .to_ascii_lowercase();

        match last {
            b'a'..=b'z' => Ok((last - b'a') as usize),
            b'0'..=b'9' => Ok(26 + (last - b'0') as usize),
            other => Err(KvError::UnroutableKey(format!(
                "last byte {:?} of key {:?} has no bucket",
                other as char,
                String::from_utf8_lossy(key)
            ))),
        }
    }

    /// Bucket character of a shard
    pub fn bucket(shard: usize) -> Option<char> {
        BUCKETS.get(shard).map(|&b| b as char)
    }

    /// Log file name of a shard: `data_records.csv` → `data_records_a.csv`
    pub fn shard_file_name(base: &str, shard: usize) -> Option<String> {
        let bucket = Self::bucket(shard)?;
        let path = Path::new(base);
        let stem = path.file_stem()?.to_string_lossy();

        Some(match path.extension() {
            Some(ext) => format!("{}_{}.{}", stem, bucket, ext.to_string_lossy()),
            None => format!("{}_{}", stem, bucket),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_letters_and_digits() {
        assert_eq!(ShardRouter::route(b"alpha").unwrap(), 0);
        assert_eq!(ShardRouter::route(b"buzz").unwrap(), 25);
        assert_eq!(ShardRouter::route(b"key0").unwrap(), 26);
        assert_eq!(ShardRouter::route(b"key9").unwrap(), 35);
    }

    #[test]
    fn test_route_case_folds() {
        assert_eq!(
            ShardRouter::route(b"userA").unwrap(),
            ShardRouter::route(b"usera").unwrap()
        );
    }

    #[test]
    fn test_route_rejects_other_bytes() {
        assert!(matches!(ShardRouter::route(b"key-"), Err(KvError::UnroutableKey(_))));
        assert!(matches!(ShardRouter::route(b""), Err(KvError::UnroutableKey(_))));
    }

    #[test]
    fn test_shard_file_names() {
        assert_eq!(
            ShardRouter::shard_file_name("data_records.csv", 0).unwrap(),
            "data_records_a.csv"
        );
        assert_eq!(ShardRouter::shard_file_name("log", 35).unwrap(), "log_9");
        assert!(ShardRouter::shard_file_name("log", SHARD_COUNT).is_none());
    }
}
