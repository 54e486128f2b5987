//! Proof-of-work transfer ledger: blocks, hashing, mining, chain
//! validation and derived balances.

pub mod balance;
pub mod block;
pub mod chain;
pub mod constants;
pub mod error;
pub mod hash;
pub mod mine;
pub mod store;

/// Integer minor units.
pub type Amount = u64;
/// Signed sum of amounts; wide enough that folding any history of `Amount`s cannot overflow.
pub type Balance = i128;

pub use balance::{authorize, compute_balance, AuthorizationPolicy};
pub use block::Block;
pub use chain::Ledger;
pub use error::{ChainViolation, LedgerError, MiningError, ViolationKind};
pub use mine::{CancelFlag, MiningOptions, MiningReport};
pub use store::{LedgerStore, PendingTransaction};
