use anyhow::{bail, Result};
use ledger_core::{Block, LedgerStore, PendingTransaction};
use ledger_node::{LedgerService, NodeConfig};
use ledger_storage::MemoryStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const TEST_DIFFICULTY: u32 = 1;

pub fn test_config() -> NodeConfig {
    NodeConfig {
        difficulty: TEST_DIFFICULTY,
        ..NodeConfig::default()
    }
}

/// In-memory store whose block writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_block_writes: AtomicBool,
}

impl FlakyStore {
    pub fn fail_block_writes(&self, fail: bool) {
        self.fail_block_writes.store(fail, Ordering::SeqCst);
    }
}

impl LedgerStore for FlakyStore {
    fn insert_block(&self, block: &Block) -> Result<()> {
        if self.fail_block_writes.load(Ordering::SeqCst) {
            bail!("disk full");
        }
        self.inner.insert_block(block)
    }

    fn blocks(&self) -> Result<Vec<Block>> {
        self.inner.blocks()
    }

    fn blocks_touching(&self, address: &str) -> Result<Vec<Block>> {
        self.inner.blocks_touching(address)
    }

    fn insert_transaction(&self, tx: &PendingTransaction) -> Result<()> {
        self.inner.insert_transaction(tx)
    }

    fn transaction(&self, id: &str) -> Result<Option<PendingTransaction>> {
        self.inner.transaction(id)
    }

    fn transactions(&self) -> Result<Vec<PendingTransaction>> {
        self.inner.transactions()
    }

    fn delete_transaction(&self, id: &str) -> Result<bool> {
        self.inner.delete_transaction(id)
    }

    fn drop_all(&self) -> Result<()> {
        self.inner.drop_all()
    }
}

pub fn flaky_service() -> (Arc<FlakyStore>, LedgerService<FlakyStore>) {
    let store = Arc::new(FlakyStore::default());
    let service = LedgerService::open(store.clone(), test_config()).expect("open service");
    (store, service)
}
