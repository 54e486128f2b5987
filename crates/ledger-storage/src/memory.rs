use anyhow::{anyhow, Result};
use ledger_core::balance::touches;
use ledger_core::{Block, LedgerStore, PendingTransaction};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Volatile store for tests and throwaway nodes.
#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
  blocks: BTreeMap<u64, Block>,
  transactions: BTreeMap<String, PendingTransaction>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
    self.inner.lock().map_err(|_| anyhow!("memory store lock poisoned"))
  }
}

impl LedgerStore for MemoryStore {
  fn insert_block(&self, block: &Block) -> Result<()> {
    self.lock()?.blocks.insert(block.index, block.clone());
    Ok(())
  }

  fn blocks(&self) -> Result<Vec<Block>> {
    Ok(self.lock()?.blocks.values().cloned().collect())
  }

  fn blocks_touching(&self, address: &str) -> Result<Vec<Block>> {
    Ok(
      self
        .lock()?
        .blocks
        .values()
        .filter(|b| touches(b, address))
        .cloned()
        .collect(),
    )
  }

  fn insert_transaction(&self, tx: &PendingTransaction) -> Result<()> {
    self.lock()?.transactions.insert(tx.id.clone(), tx.clone());
    Ok(())
  }

  fn transaction(&self, id: &str) -> Result<Option<PendingTransaction>> {
    Ok(self.lock()?.transactions.get(id).cloned())
  }

  fn transactions(&self) -> Result<Vec<PendingTransaction>> {
    Ok(self.lock()?.transactions.values().cloned().collect())
  }

  fn delete_transaction(&self, id: &str) -> Result<bool> {
    Ok(self.lock()?.transactions.remove(id).is_some())
  }

  fn drop_all(&self) -> Result<()> {
    let mut inner = self.lock()?;
    inner.blocks.clear();
    inner.transactions.clear();
    Ok(())
  }
}
