//! Typed values exchanged with built-in contracts.
//!
//! Five leaf types cross the call boundary: address, uint8, uint256, bool,
//! and string (opaque bytes). Each has a fixed wire form (see
//! [`Buffer`](crate::vm::buffer::Buffer)) and a self-describing JSON form
//! used for storage slots and event payloads:
//!
//! - address: base58 string
//! - uint256: `0x`-prefixed 64-digit hex string
//! - string: `0x`-prefixed hex of the raw bytes
//! - uint8: JSON number
//! - bool: JSON bool
//!
//! Uint256 arithmetic is checked: overflow past 2^256-1 and underflow below
//! zero return `None`, which contract methods surface as in-protocol
//! sentinel failures.

use crate::types::address::{ADDRESS_SIZE, Address};
use crate::vm::errors::VmError;
use num_bigint::BigUint;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Leaf parameter and return types understood by the call codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint8,
    Uint256,
    Bool,
    String,
}

impl ParamType {
    /// Returns the canonical type identifier used in exported ABIs.
    pub fn type_name(self) -> &'static str {
        match self {
            ParamType::Address => "CTypeAddress",
            ParamType::Uint8 => "CTypeUint8",
            ParamType::Uint256 => "CTypeUint256",
            ParamType::Bool => "CTypeBool",
            ParamType::String => "CTypeString",
        }
    }
}

/// Contract-level address value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CTypeAddress(pub Address);

impl CTypeAddress {
    pub const fn zero() -> Self {
        CTypeAddress(Address::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for CTypeAddress {
    fn from(addr: Address) -> Self {
        CTypeAddress(addr)
    }
}

impl Serialize for CTypeAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CTypeAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Address::deserialize(deserializer).map(CTypeAddress)
    }
}

/// Single-byte unsigned integer value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CTypeUint8(pub u8);

/// 32-byte big-endian unsigned integer value.
///
/// Arithmetic lifts to [`BigUint`]; results outside `[0, 2^256)` are `None`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CTypeUint256(pub [u8; 32]);

impl CTypeUint256 {
    pub const fn zero() -> Self {
        CTypeUint256([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        CTypeUint256(bytes)
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    /// Converts from a big integer, returning `None` above 2^256-1.
    pub fn from_biguint(value: &BigUint) -> Option<Self> {
        let raw = value.to_bytes_be();
        if raw.len() > 32 {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes[32 - raw.len()..].copy_from_slice(&raw);
        Some(CTypeUint256(bytes))
    }

    /// Adds two values; `None` on overflow past 2^256-1.
    pub fn checked_add(&self, other: &CTypeUint256) -> Option<CTypeUint256> {
        Self::from_biguint(&(self.to_biguint() + other.to_biguint()))
    }

    /// Subtracts `other`; `None` if the result would be negative.
    pub fn checked_sub(&self, other: &CTypeUint256) -> Option<CTypeUint256> {
        let (a, b) = (self.to_biguint(), other.to_biguint());
        if a < b {
            return None;
        }
        Self::from_biguint(&(a - b))
    }

    /// Returns the canonical `0x`-prefixed 64-digit hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl From<u64> for CTypeUint256 {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl fmt::Debug for CTypeUint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for CTypeUint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

impl Serialize for CTypeUint256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CTypeUint256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let raw = text.strip_prefix("0x").unwrap_or(&text);
        if raw.len() > 64 || raw.len() % 2 != 0 {
            return Err(de::Error::custom("uint256 hex out of range"));
        }
        let decoded = hex::decode(raw).map_err(de::Error::custom)?;
        let mut bytes = [0u8; 32];
        bytes[32 - decoded.len()..].copy_from_slice(&decoded);
        Ok(CTypeUint256(bytes))
    }
}

/// Boolean value carried on the wire as a single byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CTypeBool(pub u8);

/// True constant.
pub const C_BOOL_TRUE: CTypeBool = CTypeBool(1);
/// False constant.
pub const C_BOOL_FALSE: CTypeBool = CTypeBool(0);

impl CTypeBool {
    pub fn is_true(&self) -> bool {
        self.0 == 1
    }
}

impl From<bool> for CTypeBool {
    fn from(value: bool) -> Self {
        if value { C_BOOL_TRUE } else { C_BOOL_FALSE }
    }
}

impl Serialize for CTypeBool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.is_true())
    }
}

impl<'de> Deserialize<'de> for CTypeBool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bool::deserialize(deserializer).map(CTypeBool::from)
    }
}

/// Length-prefixed byte string. Contents are opaque (not required to be
/// UTF-8).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CTypeString(pub Vec<u8>);

impl CTypeString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for CTypeString {
    fn from(s: &str) -> Self {
        CTypeString(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for CTypeString {
    fn from(bytes: Vec<u8>) -> Self {
        CTypeString(bytes)
    }
}

impl fmt::Debug for CTypeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl Serialize for CTypeString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(&self.0)))
    }
}

impl<'de> Deserialize<'de> for CTypeString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let raw = text.strip_prefix("0x").unwrap_or(&text);
        hex::decode(raw).map(CTypeString).map_err(de::Error::custom)
    }
}

/// A decoded argument or method return value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CValue {
    Address(CTypeAddress),
    Uint8(CTypeUint8),
    Uint256(CTypeUint256),
    Bool(CTypeBool),
    String(CTypeString),
}

impl CValue {
    /// Returns the leaf type of this value.
    pub fn param_type(&self) -> ParamType {
        match self {
            CValue::Address(_) => ParamType::Address,
            CValue::Uint8(_) => ParamType::Uint8,
            CValue::Uint256(_) => ParamType::Uint256,
            CValue::Bool(_) => ParamType::Bool,
            CValue::String(_) => ParamType::String,
        }
    }

    /// Serializes the value into its raw return-buffer form: fixed-width
    /// big-endian for integers, raw bytes for addresses and strings, a
    /// single byte for bools.
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        match self {
            CValue::Address(v) => v.0.as_slice().to_vec(),
            CValue::Uint8(v) => vec![v.0],
            CValue::Uint256(v) => v.0.to_vec(),
            CValue::Bool(v) => vec![v.0],
            CValue::String(v) => v.0.clone(),
        }
    }

    pub fn as_address(&self) -> Result<CTypeAddress, VmError> {
        match self {
            CValue::Address(v) => Ok(*v),
            _ => Err(VmError::UnsupportedType(ParamType::Address.type_name())),
        }
    }

    pub fn as_uint8(&self) -> Result<CTypeUint8, VmError> {
        match self {
            CValue::Uint8(v) => Ok(*v),
            _ => Err(VmError::UnsupportedType(ParamType::Uint8.type_name())),
        }
    }

    pub fn as_uint256(&self) -> Result<CTypeUint256, VmError> {
        match self {
            CValue::Uint256(v) => Ok(*v),
            _ => Err(VmError::UnsupportedType(ParamType::Uint256.type_name())),
        }
    }

    pub fn as_bool(&self) -> Result<CTypeBool, VmError> {
        match self {
            CValue::Bool(v) => Ok(*v),
            _ => Err(VmError::UnsupportedType(ParamType::Bool.type_name())),
        }
    }

    pub fn as_string(&self) -> Result<CTypeString, VmError> {
        match self {
            CValue::String(v) => Ok(v.clone()),
            _ => Err(VmError::UnsupportedType(ParamType::String.type_name())),
        }
    }
}

/// Widens an address to the VM's fixed parameter width, zero-filling a
/// short source slice. Used by the codec's end-of-input tolerance.
pub(crate) fn address_from_partial(bytes: &[u8]) -> CTypeAddress {
    let mut out = [0u8; ADDRESS_SIZE];
    let take = bytes.len().min(ADDRESS_SIZE);
    out[..take].copy_from_slice(&bytes[..take]);
    CTypeAddress(Address(out))
}
