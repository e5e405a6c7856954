//! Block-indexed event persistence.
//!
//! Events collected during a block's transactions are cached per
//! transaction hash, then written to the KV store in one batch at block
//! commit. Rows are keyed
//! `"blk:" || block_hash || ":" || "address:" || contract || ":" ||
//! "event:" || sha256(block_hash || tx_hash || event_selector)`,
//! so both whole-block and per-address lookups are ordered prefix scans.
//!
//! There is no rollback path: rows written for a block that is later
//! reorged away remain in the index.

use crate::core::block::Block;
use crate::storage::kv::{KvError, KvStorage};
use crate::types::address::Address;
use crate::types::hash::Hash;
use crate::vm::logger::Event;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

const BLOCK_KEY_PREFIX: &[u8] = b"blk:";
const ADDRESS_KEY_PREFIX: &[u8] = b"address:";
const EVENT_KEY_PREFIX: &[u8] = b"event:";

/// Hex-string serialization for raw event payload bytes.
mod hex_bytes {
    use serde::de;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text.strip_prefix("0x").unwrap_or(&text)).map_err(de::Error::custom)
    }
}

/// One indexed event row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventObj {
    #[serde(rename = "block_number")]
    pub block_height: u64,
    pub block_hash: Hash,
    pub transaction_hash: Hash,
    pub event_hash: Hash,
    #[serde(with = "hex_bytes")]
    pub event_value: Vec<u8>,
    pub address: Address,
}

/// Event index over a KV backend.
///
/// The per-transaction cache is mutex-guarded: `put_all_events` and
/// `save_events` may race from the driver's perspective and must exclude
/// each other.
pub struct LogStorage<S: KvStorage> {
    db: S,
    caches: Mutex<HashMap<Hash, Vec<Event>>>,
}

impl<S: KvStorage> LogStorage<S> {
    pub fn new(db: S) -> Self {
        Self {
            db,
            caches: Mutex::new(HashMap::new()),
        }
    }

    fn make_block_key(block: Hash, rest: &[u8]) -> Vec<u8> {
        let mut key =
            Vec::with_capacity(BLOCK_KEY_PREFIX.len() + block.as_slice().len() + 1 + rest.len());
        key.extend_from_slice(BLOCK_KEY_PREFIX);
        key.extend_from_slice(block.as_slice());
        key.push(b':');
        key.extend_from_slice(rest);
        key
    }

    fn make_address_key(address: Address, rest: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(
            ADDRESS_KEY_PREFIX.len() + address.as_slice().len() + 1 + rest.len(),
        );
        key.extend_from_slice(ADDRESS_KEY_PREFIX);
        key.extend_from_slice(address.as_slice());
        key.push(b':');
        key.extend_from_slice(rest);
        key
    }

    fn make_event_key(obj_hash: Hash) -> Vec<u8> {
        let mut key = Vec::with_capacity(EVENT_KEY_PREFIX.len() + obj_hash.as_slice().len());
        key.extend_from_slice(EVENT_KEY_PREFIX);
        key.extend_from_slice(obj_hash.as_slice());
        key
    }

    fn make_obj_hash(block: Hash, tx: Hash, event: Hash) -> Hash {
        Hash::sha256()
            .chain(block.as_slice())
            .chain(tx.as_slice())
            .chain(event.as_slice())
            .finalize()
    }

    /// Buffers a transaction's events, stamping each with the emitting
    /// contract address. Replaces any events previously buffered for the
    /// same transaction.
    pub fn put_all_events(&self, tx: Hash, address: Address, mut events: Vec<Event>) {
        for event in &mut events {
            event.address = address;
        }
        self.caches
            .lock()
            .expect("event cache lock poisoned")
            .insert(tx, events);
    }

    /// Writes all buffered events for `block` in one batch and clears the
    /// cache. The cache is only cleared after the batch commits.
    pub fn save_events(&self, block: &Block) -> Result<(), KvError> {
        let mut caches = self.caches.lock().expect("event cache lock poisoned");
        let block_hash = block.header_hash();

        let mut batch = self.db.new_write_batch();
        for (tx_hash, events) in caches.iter() {
            for event in events {
                let obj = EventObj {
                    block_height: block.height(),
                    block_hash,
                    transaction_hash: *tx_hash,
                    event_hash: event.hash,
                    event_value: event.value.clone(),
                    address: event.address,
                };
                let data =
                    serde_json::to_vec(&obj).map_err(|err| KvError::Backend(err.to_string()))?;

                let obj_hash = Self::make_obj_hash(block_hash, *tx_hash, event.hash);
                let event_key = Self::make_event_key(obj_hash);
                let address_key = Self::make_address_key(event.address, &event_key);
                let full_key = Self::make_block_key(block_hash, &address_key);
                batch.put(full_key, data);
            }
        }
        self.db.commit_write_batch(batch)?;
        caches.clear();
        Ok(())
    }

    /// Returns every event row indexed for `block`.
    pub fn get_event_logs(&self, block: Hash) -> Result<Vec<EventObj>, KvError> {
        let prefix = Self::make_block_key(block, &[]);
        self.scan(&prefix)
    }

    /// Returns the event rows indexed for `block` and emitted by `address`.
    pub fn get_event_logs_by_address(
        &self,
        block: Hash,
        address: Address,
    ) -> Result<Vec<EventObj>, KvError> {
        let address_prefix = Self::make_address_key(address, &[]);
        let prefix = Self::make_block_key(block, &address_prefix);
        self.scan(&prefix)
    }

    fn scan(&self, prefix: &[u8]) -> Result<Vec<EventObj>, KvError> {
        let mut rows = Vec::new();
        self.db.prefix_foreach_data(prefix, &mut |_key, value| {
            let obj: EventObj =
                serde_json::from_slice(value).map_err(|err| KvError::Backend(err.to_string()))?;
            rows.push(obj);
            Ok(())
        })?;
        Ok(rows)
    }

    /// Number of transactions with buffered, not-yet-committed events.
    pub fn pending_transactions(&self) -> usize {
        self.caches.lock().expect("event cache lock poisoned").len()
    }
}
