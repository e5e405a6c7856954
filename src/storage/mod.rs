//! Key-value storage subsystem.
//!
//! - [`kv`]: the [`KvStorage`](kv::KvStorage) trait (point reads/writes,
//!   atomic write batches, ordered prefix scans) and an in-memory backend
//! - [`rocksdb_storage`]: production RocksDB-backed implementation

pub mod kv;
pub mod rocksdb_storage;
