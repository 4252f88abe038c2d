//! Block storage indexed by hash and height.
//!
//! The store keeps a single chain. Every block is appended on top of the
//! current tip, reorganizations are performed by dropping the blocks above
//! the fork point and inserting the blocks of the new branch.

mod error;
mod memory;

pub use self::error::Error;
pub use self::memory::MemoryChainStore;

use bitcoin::{Block, BlockHash};

pub(crate) const LOG_TARGET: &str = "mass_chain_db";

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an indexed block, identified by its height and hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedBlock {
    /// Block height.
    pub number: u32,
    /// Block hash.
    pub hash: BlockHash,
}

impl std::fmt::Display for IndexedBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{},{}", self.number, self.hash)
    }
}

/// Trait for interfacing with the block storage.
pub trait ChainStore: Send + Sync {
    /// Returns the block for given hash.
    fn fetch_block_by_hash(&self, hash: &BlockHash) -> Result<Block>;

    /// Returns the height of the block with given hash.
    fn fetch_block_height_by_hash(&self, hash: &BlockHash) -> Result<u32>;

    /// Returns the hash of the block at given height.
    fn fetch_block_hash_by_height(&self, height: u32) -> Result<BlockHash>;

    /// Returns the hashes of the blocks in `start..end`.
    ///
    /// The range stops early at the first missing height.
    fn fetch_height_range(&self, start: u32, end: u32) -> Vec<BlockHash>;

    /// Appends `block` on top of the chain and returns its height.
    ///
    /// The height is the parent height plus one. Only the first block of an
    /// empty store may have an unknown parent, it becomes height 0.
    fn insert_block(&self, block: Block) -> Result<u32>;

    /// Whether the block with given hash is stored.
    fn exists_hash(&self, hash: &BlockHash) -> bool;

    /// Returns the most recent block of the chain, `None` if the store is empty.
    fn newest_tip(&self) -> Option<IndexedBlock>;

    /// Removes every block above the block with given hash, which becomes the tip.
    fn drop_after_block(&self, hash: &BlockHash) -> Result<()>;
}
