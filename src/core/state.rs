//! Account state tree interface and in-memory implementation.
//!
//! The VM consumes state through the [`StateTree`] trait: contract code,
//! per-address nonces, and named storage slots addressed by
//! `(address, slot_hash)`. Production deployments back this with a
//! Merkle-indexed tree; [`MemStateTree`] is the in-memory implementation
//! used by tests and light tooling.

use crate::core::account::Account;
use crate::types::address::Address;
use crate::types::hash::Hash;
use std::collections::BTreeMap;

/// State access surface consumed by the VM.
///
/// Missing slots are reported as `None`, which rehydration treats as
/// "absent" (zero-valued typed default) rather than an empty value.
pub trait StateTree {
    /// Returns the contract code installed at `addr`, or `None`.
    fn get_code(&self, addr: Address) -> Option<Vec<u8>>;
    /// Installs contract code at `addr`, replacing any previous code.
    fn set_code(&mut self, addr: Address, code: Vec<u8>);
    /// Returns the current nonce of `addr` (0 for unknown addresses).
    fn get_nonce(&self, addr: Address) -> u64;
    /// Increases the nonce of `addr` by `delta`.
    fn add_nonce(&mut self, addr: Address, delta: u64);
    /// Returns the raw value of a storage slot, or `None` if absent.
    fn get_state_value(&self, addr: Address, key: Hash) -> Option<Vec<u8>>;
    /// Stores a slot value, overwriting any previous value.
    fn set_state(&mut self, addr: Address, key: Hash, value: Vec<u8>);
}

/// Composes the global state key for a contract storage slot:
/// `sha256(address_bytes || slot_hash)`.
pub fn make_state_key(addr: Address, slot_hash: Hash) -> Hash {
    Hash::sha256()
        .chain(addr.as_slice())
        .chain(slot_hash.as_slice())
        .finalize()
}

/// In-memory account state tree.
///
/// Accounts live in an ordered map so the root fold is deterministic.
/// Not durable; production state lives behind a persistent tree with the
/// same [`StateTree`] surface.
#[derive(Default)]
pub struct MemStateTree {
    accounts: BTreeMap<Address, Account>,
}

impl MemStateTree {
    /// Creates an empty state tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the account stored at `addr`, if any.
    pub fn account(&self, addr: Address) -> Option<&Account> {
        self.accounts.get(&addr)
    }

    fn account_mut(&mut self, addr: Address) -> &mut Account {
        self.accounts.entry(addr).or_default()
    }

    /// Computes a deterministic digest over the entire tree contents.
    ///
    /// Slot entries are folded under their composed global state key, so
    /// the root commits to the same `(address, slot)` keying the lookup
    /// path uses.
    pub fn root(&self) -> Hash {
        let mut builder = Hash::sha256().chain(b"STATE");
        for (addr, account) in &self.accounts {
            builder.update(addr.as_slice());
            builder.update(&account.nonce().to_le_bytes());
            builder.update(account.code().unwrap_or_default());
            for (slot_hash, value) in account.slots() {
                builder.update(make_state_key(*addr, *slot_hash).as_slice());
                builder.update(value);
            }
        }
        builder.finalize()
    }
}

impl StateTree for MemStateTree {
    fn get_code(&self, addr: Address) -> Option<Vec<u8>> {
        self.accounts.get(&addr)?.code().map(<[u8]>::to_vec)
    }

    fn set_code(&mut self, addr: Address, code: Vec<u8>) {
        self.account_mut(addr).set_code(code);
    }

    fn get_nonce(&self, addr: Address) -> u64 {
        self.accounts.get(&addr).map_or(0, Account::nonce)
    }

    fn add_nonce(&mut self, addr: Address, delta: u64) {
        self.account_mut(addr).add_nonce(delta);
    }

    fn get_state_value(&self, addr: Address, key: Hash) -> Option<Vec<u8>> {
        self.accounts.get(&addr)?.slot(key).map(<[u8]>::to_vec)
    }

    fn set_state(&mut self, addr: Address, key: Hash, value: Vec<u8>) {
        self.account_mut(addr).set_slot(key, value);
    }
}
