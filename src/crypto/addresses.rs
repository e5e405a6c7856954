//! Deterministic address derivation.
//!
//! Addresses are 25 bytes: a version byte, a 20-byte RIPEMD-160 digest, and
//! a 4-byte double-SHA-256 checksum. Contract addresses are derived from the
//! hash of the creating account and its nonce, so a given (creator, nonce)
//! pair always yields the same contract address.

use crate::types::address::{ADDRESS_SIZE, Address};
use crate::types::hash::Hash;
use ripemd::{Digest, Ripemd160};

/// Version byte prefixed to every address payload.
pub const ADDRESS_VERSION: u8 = 0x01;

/// Checksum length in bytes.
pub const CHECKSUM_SIZE: usize = 4;

/// Computes the 4-byte checksum of a version-prefixed payload:
/// the first bytes of `sha256(sha256(payload))`.
pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let first = Hash::sha256_of(payload);
    let second = Hash::sha256_of(first.as_slice());
    let mut out = [0u8; CHECKSUM_SIZE];
    out.copy_from_slice(&second.as_slice()[..CHECKSUM_SIZE]);
    out
}

/// Packages a 20-byte digest into a versioned, checksummed address.
fn package(digest: [u8; 20]) -> Address {
    let mut bytes = [0u8; ADDRESS_SIZE];
    bytes[0] = ADDRESS_VERSION;
    bytes[1..21].copy_from_slice(&digest);
    let check = checksum(&bytes[..21]);
    bytes[21..].copy_from_slice(&check);
    Address(bytes)
}

/// Derives an address from arbitrary pre-image data:
/// `ripemd160(sha256(data))` packaged with version and checksum.
pub fn address_from_preimage(data: &[u8]) -> Address {
    let digest = Hash::sha256_of(data);
    package(Ripemd160::digest(digest.as_slice()).into())
}

/// Derives a contract address from the creator hash and its nonce.
///
/// Pure function: equal `(creator_hash, nonce)` pairs always produce equal
/// addresses. The nonce is mixed in as 8 little-endian bytes.
pub fn create_address(creator_hash: Hash, nonce: u64) -> Address {
    let mut data = [0u8; 40];
    data[..32].copy_from_slice(creator_hash.as_slice());
    data[32..].copy_from_slice(&nonce.to_le_bytes());
    address_from_preimage(&data)
}

/// Returns true if the address carries a valid version and checksum.
pub fn verify_address(addr: Address) -> bool {
    if addr.0[0] != ADDRESS_VERSION {
        return false;
    }
    checksum(&addr.0[..21]) == addr.0[21..]
}
