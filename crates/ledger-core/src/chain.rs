use crate::constants::NULL_SENTINEL;
use crate::error::{ChainViolation, LedgerError, Result, ViolationKind};
use crate::mine::{MiningOptions, MiningReport};
use crate::Block;
use tracing::{info, warn};

/// Ordered, hash-linked sequence of blocks.
///
/// The ledger is never empty: construction and [`Ledger::reset`] both leave
/// a genesis block at index 0. Mutation goes through [`Ledger::add_block`]
/// (or its halves [`Ledger::link`] and [`Ledger::append`]), which callers
/// must serialise.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    difficulty: u32,
    next_index: u64,
}

impl Ledger {
    pub fn new(difficulty: u32) -> Self {
        Self {
            chain: vec![Self::create_genesis()],
            difficulty,
            next_index: 1,
        }
    }

    /// Rebuilds a ledger from persisted blocks, in any order.
    pub fn from_blocks(mut blocks: Vec<Block>, difficulty: u32) -> Result<Self> {
        if blocks.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        blocks.sort_by_key(|b| b.index);
        let ledger = Self {
            next_index: blocks.len() as u64,
            chain: blocks,
            difficulty,
        };
        ledger.validate().map_err(LedgerError::Corrupt)?;
        Ok(ledger)
    }

    /// Unlinked, unmined block with sentinel addresses and zero reward.
    pub fn create_genesis() -> Block {
        Block::with_reward(NULL_SENTINEL, NULL_SENTINEL, 0, 0, NULL_SENTINEL, 0)
    }

    pub fn latest(&self) -> Result<&Block> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    /// Links, mines and appends `candidate`. Runs until a nonce is found.
    pub fn add_block(&mut self, candidate: Block) -> Result<Block> {
        self.add_block_with(candidate, &MiningOptions::unbounded())
            .map(|(block, _)| block)
    }

    /// [`Ledger::add_block`] with bounded mining. An aborted search leaves
    /// the ledger untouched.
    pub fn add_block_with(
        &mut self,
        candidate: Block,
        options: &MiningOptions,
    ) -> Result<(Block, MiningReport)> {
        let mut block = self.link(candidate)?;
        let report = block.mine_with(self.difficulty, options)?;
        let admitted = self.append(block)?.clone();
        Ok((admitted, report))
    }

    /// Assigns the next index and the tip's hash to `candidate` without
    /// admitting it.
    pub fn link(&self, mut candidate: Block) -> Result<Block> {
        candidate.index = self.next_index;
        candidate.previous_hash = self.latest()?.hash.clone();
        candidate.nonce = 0;
        candidate.recompute_hash();
        Ok(candidate)
    }

    /// Admits a block produced by [`Ledger::link`] and mined since.
    pub fn append(&mut self, block: Block) -> Result<&Block> {
        let tip = self.latest()?;
        let reason = if block.index != self.next_index {
            Some(format!(
                "index {} but next index is {}",
                block.index, self.next_index
            ))
        } else if block.previous_hash != tip.hash {
            Some(format!("block {} does not extend the tip", block.index))
        } else if !block.is_intact() {
            Some(format!("block {} hash does not match contents", block.index))
        } else if !block.meets_difficulty(self.difficulty) {
            Some(format!(
                "block {} hash misses difficulty {}",
                block.index, self.difficulty
            ))
        } else {
            None
        };
        if let Some(reason) = reason {
            warn!(%reason, "block rejected");
            return Err(LedgerError::Rejected(reason));
        }

        info!(
            index = block.index,
            nonce = block.nonce,
            hash = %block.hash,
            "block admitted"
        );
        self.next_index += 1;
        self.chain.push(block);
        self.latest()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks every block's hash and index, and every non-genesis block's
    /// link and proof-of-work. Stops at the first violation.
    pub fn validate(&self) -> std::result::Result<(), ChainViolation> {
        for (i, block) in self.chain.iter().enumerate() {
            let violation = |kind| ChainViolation { index: i, kind };
            if block.index != i as u64 {
                return Err(violation(ViolationKind::IndexOutOfOrder));
            }
            if !block.is_intact() {
                return Err(violation(ViolationKind::HashMismatch));
            }
            if i == 0 {
                continue;
            }
            if block.previous_hash != self.chain[i - 1].hash {
                return Err(violation(ViolationKind::BrokenLink));
            }
            if !block.meets_difficulty(self.difficulty) {
                return Err(violation(ViolationKind::InsufficientWork));
            }
        }
        Ok(())
    }

    /// Undoes the newest admission. Genesis is never removed.
    pub fn rollback_latest(&mut self) -> Option<Block> {
        if self.chain.len() <= 1 {
            return None;
        }
        let block = self.chain.pop()?;
        self.next_index -= 1;
        warn!(index = block.index, hash = %block.hash, "block rolled back");
        Some(block)
    }

    /// Discards every block and starts over from a fresh genesis.
    pub fn reset(&mut self) -> &Block {
        self.chain = vec![Self::create_genesis()];
        self.next_index = 1;
        &self.chain[0]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn snapshot(&self) -> Vec<Block> {
        self.chain.clone()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }
}
