//! Error types for the chain store.

use bitcoin::BlockHash;

/// Errors that can occur during chain store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No block with this hash is stored.
    #[error("block {0} is missing")]
    BlockHashMissing(BlockHash),

    /// No block is stored at this height.
    #[error("no block at height {0}")]
    HeightMissing(u32),

    /// The parent of a non-genesis block is unknown.
    #[error("parent {parent} of block {hash} is unknown")]
    OrphanBlock { hash: BlockHash, parent: BlockHash },

    /// The block is already stored.
    #[error("block {0} already exists")]
    DuplicateBlock(BlockHash),

    /// The parent is stored but is no longer the tip.
    ///
    /// Blocks above the parent have to be dropped before building on it.
    #[error("parent {parent} is not the chain tip {tip}")]
    NotOnTip { parent: BlockHash, tip: BlockHash },
}
