//! Minimal block container.
//!
//! Only the parts of a block the event index depends on are modeled here:
//! a header carrying the chain position and state commitment, and the list
//! of transaction hashes the block includes.

use crate::types::hash::Hash;

/// Block metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Header format version.
    pub version: u32,
    /// Height of this block in the chain (genesis = 0).
    pub height: u64,
    /// Unix timestamp of block production in seconds.
    pub timestamp: u64,
    /// Hash of the parent block header.
    pub previous_block: Hash,
    /// Root of the account state tree after applying this block.
    pub state_root: Hash,
}

impl Header {
    /// Computes the domain-separated hash of this header.
    ///
    /// The `"HEADER"` prefix prevents collisions with other hash domains.
    pub fn hash(&self) -> Hash {
        let mut builder = Hash::sha256().chain(b"HEADER");
        builder.update(&self.version.to_le_bytes());
        builder.update(&self.height.to_le_bytes());
        builder.update(&self.timestamp.to_le_bytes());
        builder.update(self.previous_block.as_slice());
        builder.update(self.state_root.as_slice());
        builder.finalize()
    }
}

/// A block: header plus the hashes of the transactions it includes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Hash>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Hash>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// Returns the chain height of this block.
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Returns the hash of this block's header.
    pub fn header_hash(&self) -> Hash {
        self.header.hash()
    }
}
