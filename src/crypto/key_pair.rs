//! ECDSA signature key pairs on secp256k1.

use crate::crypto::addresses::address_from_preimage;
use crate::types::address::Address;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;

/// Private key for signing transactions.
///
/// Generated using cryptographically secure randomness from the OS.
#[derive(Clone)]
pub struct PrivateKey {
    key: SigningKey,
}

/// Public key for signature verification and address derivation.
///
/// The address is derived by hashing the uncompressed SEC1 encoding of the
/// verifying key and packaging the digest with version and checksum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub key: VerifyingKey,
    pub address: Address,
}

impl PrivateKey {
    /// Generates a new random private key using OS-provided entropy.
    pub fn new() -> Self {
        Self {
            key: SigningKey::random(&mut OsRng),
        }
    }

    /// Creates a private key from raw bytes.
    ///
    /// Returns `None` if the bytes do not represent a valid scalar for secp256k1.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        SigningKey::from_bytes(bytes.into())
            .ok()
            .map(|key| Self { key })
    }

    /// Returns the public key for this private key.
    pub fn public_key(&self) -> PublicKey {
        let key = *self.key.verifying_key();
        PublicKey {
            key,
            address: public_key_address(&key),
        }
    }

    /// Signs the given message bytes.
    pub fn sign(&self, data: &[u8]) -> Signature {
        self.key.sign(data)
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PublicKey {
    /// Verifies a signature over the given message bytes.
    pub fn verify(&self, data: &[u8], signature: &Signature) -> bool {
        self.key.verify(data, signature).is_ok()
    }
}

/// Derives the account address for a verifying key.
fn public_key_address(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    address_from_preimage(encoded.as_bytes())
}
