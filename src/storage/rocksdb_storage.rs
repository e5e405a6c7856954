//! RocksDB-backed key-value storage.
//!
//! Production backend for the event index. Batched writes map to native
//! RocksDB write batches; prefix scans use a forward iterator positioned at
//! the prefix with an early stop once keys leave the prefix range.

use crate::storage::kv::{KvError, KvStorage, ScanFn, WriteBatch};
use rocksdb::{DB, IteratorMode, Options};
use std::path::Path;

/// RocksDB-backed [`KvStorage`] implementation.
pub struct RocksKv {
    db: DB,
}

impl RocksKv {
    /// Opens (or creates) a database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KvError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).map_err(|err| KvError::Backend(err.to_string()))?;
        Ok(Self { db })
    }
}

impl KvStorage for RocksKv {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        self.db
            .put(key, value)
            .map_err(|err| KvError::Backend(err.to_string()))
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.db.get(key).ok().flatten()
    }

    fn commit_write_batch(&self, batch: WriteBatch) -> Result<(), KvError> {
        let mut native = rocksdb::WriteBatch::default();
        for (key, value) in batch.ops {
            native.put(key, value);
        }
        self.db
            .write(native)
            .map_err(|err| KvError::Backend(err.to_string()))
    }

    fn prefix_foreach_data(&self, prefix: &[u8], f: &mut ScanFn<'_>) -> Result<(), KvError> {
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix, rocksdb::Direction::Forward));
        for item in iter {
            let (key, value) = item.map_err(|err| KvError::Backend(err.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            f(&key, &value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn put_get_round_trip() {
        let dir = tempdir().expect("tempdir");
        let kv = RocksKv::open(dir.path()).expect("open");

        kv.put(b"key", b"value").expect("put");
        assert_eq!(kv.get(b"key"), Some(b"value".to_vec()));
        assert_eq!(kv.get(b"missing"), None);
    }

    #[test]
    fn batch_commit_is_atomic_and_visible() {
        let dir = tempdir().expect("tempdir");
        let kv = RocksKv::open(dir.path()).expect("open");

        let mut batch = kv.new_write_batch();
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.put(b"b".to_vec(), b"2".to_vec());
        kv.commit_write_batch(batch).expect("commit");

        assert_eq!(kv.get(b"a"), Some(b"1".to_vec()));
        assert_eq!(kv.get(b"b"), Some(b"2".to_vec()));
    }

    #[test]
    fn prefix_scan_is_bounded_and_ordered() {
        let dir = tempdir().expect("tempdir");
        let kv = RocksKv::open(dir.path()).expect("open");

        kv.put(b"blk:1:b", b"2").expect("put");
        kv.put(b"blk:1:a", b"1").expect("put");
        kv.put(b"blk:2:a", b"3").expect("put");
        kv.put(b"blj:9", b"x").expect("put");

        let mut keys = Vec::new();
        kv.prefix_foreach_data(b"blk:1:", &mut |key, _| {
            keys.push(key.to_vec());
            Ok(())
        })
        .expect("scan");

        assert_eq!(keys, vec![b"blk:1:a".to_vec(), b"blk:1:b".to_vec()]);
    }

    #[test]
    fn reopen_preserves_data() {
        let dir = tempdir().expect("tempdir");
        {
            let kv = RocksKv::open(dir.path()).expect("open");
            kv.put(b"persistent", b"yes").expect("put");
        }
        let kv = RocksKv::open(dir.path()).expect("reopen");
        assert_eq!(kv.get(b"persistent"), Some(b"yes".to_vec()));
    }
}
