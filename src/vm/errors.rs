use crate::types::hash::Hash;
use thiserror::Error;

/// Errors surfaced by contract execution.
///
/// These are transport/dispatch failures only. A method that rejects a call
/// for in-protocol reasons (insufficient balance, unauthorized caller)
/// returns a sentinel value (`False`, zero) instead of an error, and any
/// storage writes performed up to that point are kept.
#[derive(Debug, Error)]
pub enum VmError {
    /// Contract code or call input does not start with the expected magic.
    #[error("unknown magic number")]
    UnknownMagicNumber,
    /// Contract code or call input is too short to carry a header.
    #[error("invalid contract code")]
    InvalidContractCode,
    /// Header names a contract id outside the built-in catalogue.
    #[error("unknown contract id: {0:#04x}")]
    UnknownContractId(u8),
    /// Selector does not match any method of the target contract.
    #[error("method not found: {0}")]
    NotFoundMethod(Hash),
    /// A decoded argument does not fit its declared parameter type.
    #[error("unsupported value for parameter type {0}")]
    UnsupportedType(&'static str),
    /// Call input ended while decoding arguments.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A storage slot failed to decode into its declared type.
    #[error("state value decode failed: {0}")]
    StateCodec(#[from] serde_json::Error),
}
