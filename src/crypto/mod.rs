//! Cryptographic primitives: address derivation and signing key pairs.

pub mod addresses;
pub mod key_pair;
