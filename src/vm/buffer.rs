//! Typed wire codec for call arguments and return data.
//!
//! Arguments are packed back-to-back with fixed layouts:
//!
//! - string: 4-byte little-endian length, then the raw bytes
//! - uint8: 1 byte
//! - uint256: 32 bytes big-endian
//! - address: 25 bytes
//! - bool: 1 byte (0 or 1)
//!
//! Readers error with [`VmError::UnexpectedEof`] on short input, except the
//! address reader: a trailing address may be truncated or absent entirely
//! and decodes with the missing suffix zero-filled.

use crate::types::address::ADDRESS_SIZE;
use crate::types::hash::{HASH_SIZE, Hash};
use crate::vm::errors::VmError;
use crate::vm::values::{
    CTypeAddress, CTypeBool, CTypeString, CTypeUint8, CTypeUint256, CValue, ParamType,
    address_from_partial,
};

/// Append-only byte buffer with typed readers and writers.
#[derive(Default)]
pub struct Buffer {
    data: Vec<u8>,
    pos: usize,
}

impl Buffer {
    /// Creates a buffer positioned at the start of `data`.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Creates an empty buffer for writing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Consumes the buffer, returning the full backing storage.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the full backing storage.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    // Writers

    /// Appends raw bytes with no framing.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Appends a length-prefixed string (4-byte little-endian length).
    pub fn write_string(&mut self, value: &CTypeString) {
        self.data
            .extend_from_slice(&(value.len() as u32).to_le_bytes());
        self.data.extend_from_slice(value.as_bytes());
    }

    /// Appends a single byte.
    pub fn write_uint8(&mut self, value: CTypeUint8) {
        self.data.push(value.0);
    }

    /// Appends 32 big-endian bytes.
    pub fn write_uint256(&mut self, value: &CTypeUint256) {
        self.data.extend_from_slice(&value.0);
    }

    /// Appends the fixed-width address bytes.
    pub fn write_address(&mut self, value: &CTypeAddress) {
        self.data.extend_from_slice(value.0.as_slice());
    }

    /// Appends a single 0/1 byte.
    pub fn write_bool(&mut self, value: CTypeBool) {
        self.data.push(value.0);
    }

    /// Appends any typed value in its argument encoding.
    pub fn write_value(&mut self, value: &CValue) {
        match value {
            CValue::Address(v) => self.write_address(v),
            CValue::Uint8(v) => self.write_uint8(*v),
            CValue::Uint256(v) => self.write_uint256(v),
            CValue::Bool(v) => self.write_bool(*v),
            CValue::String(v) => self.write_string(v),
        }
    }

    // Readers

    fn read_exact(&mut self, n: usize) -> Result<&[u8], VmError> {
        if self.remaining() < n {
            return Err(VmError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads a 32-byte method selector.
    pub fn read_selector(&mut self) -> Result<Hash, VmError> {
        let bytes = self.read_exact(HASH_SIZE)?;
        Ok(Hash::from_slice(bytes).expect("read_exact returns HASH_SIZE bytes"))
    }

    /// Reads a length-prefixed string.
    pub fn read_string(&mut self) -> Result<CTypeString, VmError> {
        let len_bytes = self.read_exact(4)?;
        let len = u32::from_le_bytes(len_bytes.try_into().expect("4 bytes")) as usize;
        let bytes = self.read_exact(len)?;
        Ok(CTypeString(bytes.to_vec()))
    }

    /// Reads a single byte.
    pub fn read_uint8(&mut self) -> Result<CTypeUint8, VmError> {
        Ok(CTypeUint8(self.read_exact(1)?[0]))
    }

    /// Reads 32 big-endian bytes.
    pub fn read_uint256(&mut self) -> Result<CTypeUint256, VmError> {
        let bytes = self.read_exact(32)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Ok(CTypeUint256(out))
    }

    /// Reads a fixed-width address.
    ///
    /// End-of-input tolerance: if fewer than [`ADDRESS_SIZE`] bytes remain,
    /// the available bytes are consumed and the rest of the address is
    /// zero-filled.
    pub fn read_address(&mut self) -> Result<CTypeAddress, VmError> {
        let take = self.remaining().min(ADDRESS_SIZE);
        let bytes = self.read_exact(take)?;
        Ok(address_from_partial(bytes))
    }

    /// Reads a strict 0/1 boolean byte.
    pub fn read_bool(&mut self) -> Result<CTypeBool, VmError> {
        match self.read_exact(1)?[0] {
            0 => Ok(CTypeBool(0)),
            1 => Ok(CTypeBool(1)),
            _ => Err(VmError::UnsupportedType(ParamType::Bool.type_name())),
        }
    }

    /// Reads one value of the given parameter type.
    pub fn read_value(&mut self, ty: ParamType) -> Result<CValue, VmError> {
        match ty {
            ParamType::Address => self.read_address().map(CValue::Address),
            ParamType::Uint8 => self.read_uint8().map(CValue::Uint8),
            ParamType::Uint256 => self.read_uint256().map(CValue::Uint256),
            ParamType::Bool => self.read_bool().map(CValue::Bool),
            ParamType::String => self.read_string().map(CValue::String),
        }
    }
}
