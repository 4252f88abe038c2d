use crate::{ChainStore, Error, IndexedBlock, LOG_TARGET, Result};
use bitcoin::{Block, BlockHash};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Chain {
    blocks: HashMap<BlockHash, Block>,
    heights: HashMap<BlockHash, u32>,
    // Index is the block height.
    hashes: Vec<BlockHash>,
}

impl Chain {
    fn tip(&self) -> Option<IndexedBlock> {
        let hash = *self.hashes.last()?;
        Some(IndexedBlock {
            number: (self.hashes.len() - 1) as u32,
            hash,
        })
    }
}

/// In-memory [`ChainStore`], safe to share between threads.
#[derive(Debug, Default)]
pub struct MemoryChainStore {
    chain: RwLock<Chain>,
}

impl MemoryChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.chain.read().hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.read().hashes.is_empty()
    }
}

impl ChainStore for MemoryChainStore {
    fn fetch_block_by_hash(&self, hash: &BlockHash) -> Result<Block> {
        self.chain
            .read()
            .blocks
            .get(hash)
            .cloned()
            .ok_or(Error::BlockHashMissing(*hash))
    }

    fn fetch_block_height_by_hash(&self, hash: &BlockHash) -> Result<u32> {
        self.chain
            .read()
            .heights
            .get(hash)
            .copied()
            .ok_or(Error::BlockHashMissing(*hash))
    }

    fn fetch_block_hash_by_height(&self, height: u32) -> Result<BlockHash> {
        match self.chain.read().hashes.get(height as usize) {
            Some(hash) => Ok(*hash),
            None => {
                tracing::trace!(target: LOG_TARGET, "Failed to find block at height {height}");
                Err(Error::HeightMissing(height))
            }
        }
    }

    fn fetch_height_range(&self, start: u32, end: u32) -> Vec<BlockHash> {
        let chain = self.chain.read();
        let start = (start as usize).min(chain.hashes.len());
        let end = (end as usize).clamp(start, chain.hashes.len());
        chain.hashes[start..end].to_vec()
    }

    fn insert_block(&self, block: Block) -> Result<u32> {
        let hash = block.block_hash();
        let parent = block.header.prev_blockhash;

        let mut chain = self.chain.write();

        if chain.blocks.contains_key(&hash) {
            return Err(Error::DuplicateBlock(hash));
        }

        let height = match chain.tip() {
            None => 0,
            Some(tip) if tip.hash == parent => tip.number + 1,
            Some(tip) => {
                return Err(if chain.heights.contains_key(&parent) {
                    Error::NotOnTip {
                        parent,
                        tip: tip.hash,
                    }
                } else {
                    Error::OrphanBlock { hash, parent }
                });
            }
        };

        chain.blocks.insert(hash, block);
        chain.heights.insert(hash, height);
        chain.hashes.push(hash);

        tracing::debug!(target: LOG_TARGET, "Inserted block #{height},{hash}");

        Ok(height)
    }

    fn exists_hash(&self, hash: &BlockHash) -> bool {
        self.chain.read().blocks.contains_key(hash)
    }

    fn newest_tip(&self) -> Option<IndexedBlock> {
        self.chain.read().tip()
    }

    fn drop_after_block(&self, hash: &BlockHash) -> Result<()> {
        let mut chain = self.chain.write();

        let height = *chain
            .heights
            .get(hash)
            .ok_or(Error::BlockHashMissing(*hash))?;

        let dropped = chain.hashes.split_off(height as usize + 1);
        for dropped_hash in &dropped {
            chain.blocks.remove(dropped_hash);
            chain.heights.remove(dropped_hash);
        }

        tracing::debug!(
            target: LOG_TARGET,
            "Dropped {} blocks after #{height},{hash}",
            dropped.len()
        );

        Ok(())
    }
}
