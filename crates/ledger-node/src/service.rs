use crate::config::NodeConfig;
use ledger_core::constants::{NULL_SENTINEL, SYSTEM_ADDRESS};
use ledger_core::{
    authorize, compute_balance, Amount, Balance, Block, ChainViolation, Ledger, LedgerError,
    LedgerStore, PendingTransaction,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The store failed. Any block mined for the failed write has been
    /// rolled back.
    #[error("persistence failure: {0:#}")]
    Persistence(anyhow::Error),

    #[error("mining worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ServiceError {
    fn store(err: anyhow::Error) -> Self {
        ServiceError::Persistence(err)
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: Amount,
    pub fee: Amount,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MineRequest {
    /// Pending transaction id.
    pub id: String,
    /// Miner credited with the fee and reward.
    pub address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddressQuery {
    pub address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddressView {
    pub transactions: Vec<Block>,
    pub balance: Balance,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub length: usize,
    pub violation: Option<ChainViolation>,
}

/// Owns the in-memory ledger and keeps it consistent with the store.
///
/// Every admission (mint, mined transfer, reset) holds `mining_gate` from
/// linking until the block is persisted, so at most one search runs at a
/// time. The ledger lock itself is only held for the short link and append
/// steps; readers are not blocked by an in-flight search.
pub struct LedgerService<S> {
    ledger: Arc<RwLock<Ledger>>,
    store: Arc<S>,
    mining_gate: Arc<Mutex<()>>,
    config: Arc<NodeConfig>,
}

impl<S> Clone for LedgerService<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            store: self.store.clone(),
            mining_gate: self.mining_gate.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: LedgerStore + 'static> LedgerService<S> {
    /// Restores the ledger from `store`, or starts a fresh one when the
    /// store is empty or holds a chain that fails validation.
    pub fn open(store: Arc<S>, config: NodeConfig) -> Result<Self> {
        let blocks = store.blocks().map_err(ServiceError::store)?;
        let ledger = if blocks.is_empty() {
            Self::fresh(store.as_ref(), config.difficulty)?
        } else {
            match Ledger::from_blocks(blocks, config.difficulty) {
                Ok(ledger) => {
                    info!(height = ledger.len(), "ledger restored from store");
                    ledger
                }
                Err(err) => {
                    warn!(%err, "stored chain unusable, starting over");
                    store.drop_all().map_err(ServiceError::store)?;
                    Self::fresh(store.as_ref(), config.difficulty)?
                }
            }
        };
        Ok(Self {
            ledger: Arc::new(RwLock::new(ledger)),
            store,
            mining_gate: Arc::new(Mutex::new(())),
            config: Arc::new(config),
        })
    }

    fn fresh(store: &S, difficulty: u32) -> Result<Ledger> {
        let ledger = Ledger::new(difficulty);
        let genesis = ledger.latest()?;
        store.insert_block(genesis).map_err(ServiceError::store)?;
        info!(hash = %genesis.hash, "genesis block 0 created");
        Ok(ledger)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn ledger(&self) -> &Arc<RwLock<Ledger>> {
        &self.ledger
    }

    /// Authorises a transfer against the sender's history and queues it.
    ///
    /// A sender with no history first receives a mined grant block from
    /// `system` (unless disabled); authorisation still looks at the history
    /// as it was before that grant.
    pub async fn add_transaction(&self, req: TransferRequest) -> Result<PendingTransaction> {
        info!(from = %req.from, to = %req.to, amount = req.amount, fee = req.fee, "transaction received");
        let history = self
            .store
            .blocks_touching(&req.from)
            .map_err(ServiceError::store)?;

        if history.is_empty() && self.config.first_contact_mint {
            let gate = self.mining_gate.clone().lock_owned().await;
            // A concurrent request may have minted while we waited.
            let still_new = self
                .store
                .blocks_touching(&req.from)
                .map_err(ServiceError::store)?
                .is_empty();
            if still_new {
                info!(address = %req.from, "new address");
                let grant = Block::with_reward(
                    SYSTEM_ADDRESS,
                    req.from.clone(),
                    self.config.policy.mint_grant,
                    0,
                    NULL_SENTINEL,
                    0,
                );
                let block = self.admit(gate, grant, None).await?;
                info!(hash = %block.hash, amount = block.amount, "grant minted for new address");
            }
        }

        if let Err(err) = authorize(&req.from, &history, req.amount, req.fee, &self.config.policy) {
            warn!(%err, "transaction refused");
            return Err(err.into());
        }

        let tx = PendingTransaction::new(req.from, req.to, req.amount, req.fee);
        self.store
            .insert_transaction(&tx)
            .map_err(ServiceError::store)?;
        info!(id = %tx.id, "transaction queued");
        Ok(tx)
    }

    /// Mines the pending transaction `req.id` into a block rewarding
    /// `req.address`, persists it and removes the transaction.
    pub async fn mine_transaction(&self, req: MineRequest) -> Result<Block> {
        info!(id = %req.id, miner = %req.address, "mine requested");
        let gate = self.mining_gate.clone().lock_owned().await;
        let tx = self
            .store
            .transaction(&req.id)
            .map_err(ServiceError::store)?
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {}", req.id)))?;
        self.admit(gate, tx.to_block(req.address), Some(tx.id)).await
    }

    /// Links, mines, appends and persists `candidate` on a blocking worker.
    /// A failed write pops the block again before the error is returned.
    async fn admit(
        &self,
        gate: OwnedMutexGuard<()>,
        candidate: Block,
        settles: Option<String>,
    ) -> Result<Block> {
        let ledger = self.ledger.clone();
        let store = self.store.clone();
        let options = self.config.mining.clone();

        tokio::task::spawn_blocking(move || -> Result<Block> {
            let _gate = gate;
            let (mut block, difficulty) = {
                let ledger = ledger.blocking_read();
                (ledger.link(candidate)?, ledger.difficulty())
            };
            let report = block.mine_with(difficulty, &options).map_err(LedgerError::from)?;
            let admitted = ledger.blocking_write().append(block)?.clone();

            if let Err(err) = store.insert_block(&admitted) {
                ledger.blocking_write().rollback_latest();
                warn!(index = admitted.index, error = %err, "persisting block failed");
                return Err(ServiceError::Persistence(err));
            }
            if let Some(id) = settles {
                match store.delete_transaction(&id) {
                    Ok(true) => {}
                    Ok(false) => warn!(%id, "settled transaction already gone"),
                    Err(err) => warn!(%id, error = %err, "removing settled transaction failed"),
                }
            }
            info!(
                index = admitted.index,
                attempts = report.attempts,
                elapsed = ?report.elapsed,
                hash = %admitted.hash,
                "block mined"
            );
            Ok(admitted)
        })
        .await?
    }

    pub async fn view_address(&self, address: &str) -> Result<AddressView> {
        let transactions = self
            .store
            .blocks_touching(address)
            .map_err(ServiceError::store)?;
        let balance = compute_balance(address, &transactions);
        Ok(AddressView {
            transactions,
            balance,
        })
    }

    pub async fn blocks(&self) -> Result<Vec<Block>> {
        self.store.blocks().map_err(ServiceError::store)
    }

    pub async fn transactions(&self) -> Result<Vec<PendingTransaction>> {
        self.store.transactions().map_err(ServiceError::store)
    }

    pub async fn validate(&self) -> ValidationReport {
        let ledger = self.ledger.read().await;
        let violation = ledger.validate().err();
        ValidationReport {
            valid: violation.is_none(),
            length: ledger.len(),
            violation,
        }
    }

    /// Drops the store and the in-memory chain, then persists a new genesis.
    pub async fn reset(&self) -> Result<Block> {
        warn!("reset received");
        let _gate = self.mining_gate.lock().await;
        self.store.drop_all().map_err(ServiceError::store)?;
        let mut ledger = self.ledger.write().await;
        let genesis = ledger.reset().clone();
        self.store
            .insert_block(&genesis)
            .map_err(ServiceError::store)?;
        info!(hash = %genesis.hash, "genesis block 0 created");
        Ok(genesis)
    }
}
