//! Key-value storage abstraction.
//!
//! Consumers need three capabilities: point reads/writes, atomic batched
//! writes, and ordered prefix scans. Backends implement [`KvStorage`];
//! [`MemKv`] is the in-memory implementation used by tests and light
//! tooling.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Mutex;
use thiserror::Error;

/// Errors surfaced by storage backends.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A set of writes committed atomically.
#[derive(Default)]
pub struct WriteBatch {
    pub(crate) ops: Vec<(Vec<u8>, Vec<u8>)>,
}

impl WriteBatch {
    /// Queues a put; nothing is visible until the batch is committed.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push((key, value));
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Visitor callback for prefix scans. Returning an error stops the scan.
pub type ScanFn<'a> = dyn FnMut(&[u8], &[u8]) -> Result<(), KvError> + 'a;

/// Storage backend surface.
///
/// Implementations must be safe for shared use; writes from a committed
/// batch become visible atomically.
pub trait KvStorage {
    /// Writes a single key-value pair.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvError>;

    /// Reads a value, `None` if the key is absent.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Creates an empty write batch for this backend.
    fn new_write_batch(&self) -> WriteBatch {
        WriteBatch::default()
    }

    /// Commits all writes in the batch atomically.
    fn commit_write_batch(&self, batch: WriteBatch) -> Result<(), KvError>;

    /// Visits every key-value pair whose key starts with `prefix`, in
    /// ascending key order.
    fn prefix_foreach_data(&self, prefix: &[u8], f: &mut ScanFn<'_>) -> Result<(), KvError>;
}

/// In-memory KV backend over a mutex-guarded ordered map.
#[derive(Default)]
pub struct MemKv {
    inner: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("kv lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStorage for MemKv {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        self.inner
            .lock()
            .expect("kv lock poisoned")
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.lock().expect("kv lock poisoned").get(key).cloned()
    }

    fn commit_write_batch(&self, batch: WriteBatch) -> Result<(), KvError> {
        let mut inner = self.inner.lock().expect("kv lock poisoned");
        for (key, value) in batch.ops {
            inner.insert(key, value);
        }
        Ok(())
    }

    fn prefix_foreach_data(&self, prefix: &[u8], f: &mut ScanFn<'_>) -> Result<(), KvError> {
        let inner = self.inner.lock().expect("kv lock poisoned");
        let range = inner.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded));
        for (key, value) in range {
            if !key.starts_with(prefix) {
                break;
            }
            f(key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get() {
        let kv = MemKv::new();
        kv.put(b"a", b"1").expect("put");
        assert_eq!(kv.get(b"a"), Some(b"1".to_vec()));
        assert_eq!(kv.get(b"b"), None);
    }

    #[test]
    fn put_overwrites() {
        let kv = MemKv::new();
        kv.put(b"a", b"1").expect("put");
        kv.put(b"a", b"2").expect("put");
        assert_eq!(kv.get(b"a"), Some(b"2".to_vec()));
    }

    #[test]
    fn batch_commit_applies_all_writes() {
        let kv = MemKv::new();
        let mut batch = kv.new_write_batch();
        batch.put(b"x".to_vec(), b"1".to_vec());
        batch.put(b"y".to_vec(), b"2".to_vec());
        assert_eq!(batch.len(), 2);

        kv.commit_write_batch(batch).expect("commit");
        assert_eq!(kv.get(b"x"), Some(b"1".to_vec()));
        assert_eq!(kv.get(b"y"), Some(b"2".to_vec()));
    }

    #[test]
    fn uncommitted_batch_is_invisible() {
        let kv = MemKv::new();
        let mut batch = kv.new_write_batch();
        batch.put(b"x".to_vec(), b"1".to_vec());
        assert_eq!(kv.get(b"x"), None);
    }

    #[test]
    fn prefix_scan_visits_only_matching_keys_in_order() {
        let kv = MemKv::new();
        kv.put(b"blk:1:a", b"1").expect("put");
        kv.put(b"blk:1:b", b"2").expect("put");
        kv.put(b"blk:2:a", b"3").expect("put");
        kv.put(b"other", b"4").expect("put");

        let mut seen = Vec::new();
        kv.prefix_foreach_data(b"blk:1:", &mut |key, value| {
            seen.push((key.to_vec(), value.to_vec()));
            Ok(())
        })
        .expect("scan");

        assert_eq!(
            seen,
            vec![
                (b"blk:1:a".to_vec(), b"1".to_vec()),
                (b"blk:1:b".to_vec(), b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn prefix_scan_stops_on_error() {
        let kv = MemKv::new();
        kv.put(b"p:1", b"1").expect("put");
        kv.put(b"p:2", b"2").expect("put");

        let mut visits = 0;
        let result = kv.prefix_foreach_data(b"p:", &mut |_, _| {
            visits += 1;
            Err(KvError::Backend("stop".into()))
        });
        assert!(result.is_err());
        assert_eq!(visits, 1);
    }

    #[test]
    fn empty_prefix_scans_everything() {
        let kv = MemKv::new();
        kv.put(b"a", b"1").expect("put");
        kv.put(b"b", b"2").expect("put");

        let mut count = 0;
        kv.prefix_foreach_data(b"", &mut |_, _| {
            count += 1;
            Ok(())
        })
        .expect("scan");
        assert_eq!(count, 2);
    }
}
