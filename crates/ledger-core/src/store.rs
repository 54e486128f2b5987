use crate::block::now_millis;
use crate::{Amount, Block};
use anyhow::Result;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// A requested transfer waiting for a miner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: Amount,
    pub fee: Amount,
    pub timestamp: u64,
}

impl PendingTransaction {
    /// New transaction with a random 128-bit hex id.
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: Amount, fee: Amount) -> Self {
        let mut id = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut id);
        Self {
            id: hex::encode(id),
            from: from.into(),
            to: to.into(),
            amount,
            fee,
            timestamp: now_millis(),
        }
    }

    /// Candidate block settling this transaction, rewarding `miner`.
    pub fn to_block(&self, miner: impl Into<String>) -> Block {
        Block::new(self.from.clone(), self.to.clone(), self.amount, self.fee, miner)
    }
}

/// Persistence the service needs for blocks and pending transactions.
/// This lives in `ledger-core` so storage crates can depend on it without a cycle.
pub trait LedgerStore: Send + Sync {
    fn insert_block(&self, block: &Block) -> Result<()>;
    /// Every persisted block, ordered by index.
    fn blocks(&self) -> Result<Vec<Block>>;
    /// Blocks where `address` is sender, recipient or miner, ordered by index.
    fn blocks_touching(&self, address: &str) -> Result<Vec<Block>>;

    fn insert_transaction(&self, tx: &PendingTransaction) -> Result<()>;
    fn transaction(&self, id: &str) -> Result<Option<PendingTransaction>>;
    fn transactions(&self) -> Result<Vec<PendingTransaction>>;
    /// Returns whether a transaction was removed.
    fn delete_transaction(&self, id: &str) -> Result<bool>;

    /// Removes every block and transaction.
    fn drop_all(&self) -> Result<()>;
}
