//! 25-byte blockchain addresses with a base58 text form.

use base58::{FromBase58, ToBase58};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Address length in bytes: version (1) + payload digest (20) + checksum (4).
pub const ADDRESS_SIZE: usize = 25;

/// Fixed-size 25-byte address identifying accounts and contracts.
///
/// The all-zero value is the "unset" sentinel used by contracts to signal
/// absent owners and failed lookups. Equality and ordering are byte-wise,
/// so addresses can key ordered maps directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; ADDRESS_SIZE]);

/// Errors produced when parsing an address from its base58 text form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    /// Input contains a character outside the base58 alphabet.
    #[error("invalid base58 character in address")]
    InvalidBase58,
    /// Decoded payload is not exactly [`ADDRESS_SIZE`] bytes.
    #[error("address must decode to {ADDRESS_SIZE} bytes, got {0}")]
    InvalidLength(usize),
}

impl Address {
    /// Creates a zero-valued address (all bytes are 0x00).
    pub const fn zero() -> Address {
        Address([0u8; ADDRESS_SIZE])
    }

    /// Returns true if every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Returns the address as a byte slice.
    pub const fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Creates an address from a byte slice.
    ///
    /// Returns `None` if the slice length is not exactly [`ADDRESS_SIZE`] bytes.
    pub fn from_slice(slice: &[u8]) -> Option<Address> {
        if slice.len() != ADDRESS_SIZE {
            return None;
        }
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(slice);
        Some(Address(bytes))
    }

    /// Returns the base58 text form of the address.
    pub fn b58_string(&self) -> String {
        self.0.to_base58()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.b58_string())
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s
            .from_base58()
            .map_err(|_| AddressParseError::InvalidBase58)?;
        Address::from_slice(&bytes).ok_or(AddressParseError::InvalidLength(bytes.len()))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.b58_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
