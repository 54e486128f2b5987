use anyhow::{Context, Result};
use ledger_core::balance::touches;
use ledger_core::{Block, LedgerStore, PendingTransaction};
use serde::de::DeserializeOwned;
use sled::{Db, IVec, Tree};
use std::path::Path;
use tracing::{debug, info};

const TREE_BLOCKS: &str = "blocks";
const TREE_TRANSACTIONS: &str = "transactions";

/// Blocks keyed by big-endian index, pending transactions keyed by id.
#[derive(Clone)]
pub struct SledStore {
  db: Db,
  blocks: Tree,
  transactions: Tree,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let db = sled::open(path).with_context(|| format!("opening sled at {}", path.display()))?;
    let blocks = db.open_tree(TREE_BLOCKS)?;
    let transactions = db.open_tree(TREE_TRANSACTIONS)?;
    info!(path = %path.display(), "sled store opened");
    Ok(Self {
      db,
      blocks,
      transactions,
    })
  }

  fn decode_all<T: DeserializeOwned>(tree: &Tree) -> Result<Vec<T>> {
    tree
      .iter()
      .values()
      .map(|v| {
        let v: IVec = v?;
        bincode::deserialize(&v).context("decoding stored record")
      })
      .collect()
  }
}

impl LedgerStore for SledStore {
  fn insert_block(&self, block: &Block) -> Result<()> {
    let key = block.index.to_be_bytes();
    let bytes = bincode::serialize(block)?;
    self.blocks.insert(key, bytes)?;
    self.db.flush()?;
    debug!(index = block.index, "block persisted");
    Ok(())
  }

  fn blocks(&self) -> Result<Vec<Block>> {
    Self::decode_all(&self.blocks)
  }

  fn blocks_touching(&self, address: &str) -> Result<Vec<Block>> {
    Ok(
      self
        .blocks()?
        .into_iter()
        .filter(|b| touches(b, address))
        .collect(),
    )
  }

  fn insert_transaction(&self, tx: &PendingTransaction) -> Result<()> {
    let bytes = bincode::serialize(tx)?;
    self.transactions.insert(tx.id.as_bytes(), bytes)?;
    self.db.flush()?;
    Ok(())
  }

  fn transaction(&self, id: &str) -> Result<Option<PendingTransaction>> {
    self
      .transactions
      .get(id.as_bytes())?
      .map(|v| bincode::deserialize(&v).context("decoding stored transaction"))
      .transpose()
  }

  fn transactions(&self) -> Result<Vec<PendingTransaction>> {
    Self::decode_all(&self.transactions)
  }

  fn delete_transaction(&self, id: &str) -> Result<bool> {
    let removed = self.transactions.remove(id.as_bytes())?.is_some();
    self.db.flush()?;
    Ok(removed)
  }

  fn drop_all(&self) -> Result<()> {
    self.blocks.clear()?;
    self.transactions.clear()?;
    self.db.flush()?;
    info!("sled store cleared");
    Ok(())
  }
}
