use crate::{Amount, Balance};
use serde::Serialize;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The ledger holds no blocks. Only reachable through a broken initialisation.
    #[error("ledger has no blocks")]
    EmptyChain,

    #[error("insufficient balance for {address}: have {available}, need {required}")]
    InsufficientBalance {
        address: String,
        available: Balance,
        required: Amount,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("mining aborted: {0}")]
    Mining(#[from] MiningError),

    #[error("block rejected: {0}")]
    Rejected(String),

    #[error("chain is corrupt: {0}")]
    Corrupt(ChainViolation),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MiningError {
    #[error("gave up after {attempts} attempts")]
    AttemptsExhausted { attempts: u64 },
    #[error("deadline passed after {attempts} attempts")]
    DeadlineExceeded { attempts: u64 },
    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },
}

impl MiningError {
    pub fn attempts(&self) -> u64 {
        match *self {
            MiningError::AttemptsExhausted { attempts }
            | MiningError::DeadlineExceeded { attempts }
            | MiningError::Cancelled { attempts } => attempts,
        }
    }
}

/// First block found breaking a chain invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainViolation {
    pub index: usize,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Stored hash differs from the recomputed digest.
    HashMismatch,
    /// `previous_hash` differs from the predecessor's hash.
    BrokenLink,
    /// Hash lacks the required leading zeros.
    InsufficientWork,
    /// Block index differs from its position.
    IndexOutOfOrder,
}

impl fmt::Display for ChainViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ViolationKind::HashMismatch => "stored hash does not match contents",
            ViolationKind::BrokenLink => "previous hash does not match predecessor",
            ViolationKind::InsufficientWork => "hash does not meet difficulty",
            ViolationKind::IndexOutOfOrder => "index does not match position",
        };
        write!(f, "block {}: {}", self.index, what)
    }
}
