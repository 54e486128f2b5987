use crate::constants::NONCES_PER_BATCH;
use crate::error::MiningError;
use crate::hash::{digest, meets_difficulty};
use crate::Block;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared flag that asks an in-flight search to stop.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds on a nonce search. The default runs to completion on one thread.
#[derive(Clone, Debug, Default)]
pub struct MiningOptions {
    /// Maximum number of nonces to try.
    pub max_attempts: Option<u64>,
    /// Wall-clock budget measured from the start of the search.
    pub deadline: Option<Duration>,
    pub cancel: Option<CancelFlag>,
    /// Split each batch of nonces across the rayon pool.
    pub parallel: bool,
}

impl MiningOptions {
    pub fn unbounded() -> Self {
        Self::default()
    }

    fn check(&self, started: Instant, attempts: u64) -> Result<(), MiningError> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Err(MiningError::Cancelled { attempts });
        }
        if self.deadline.is_some_and(|d| started.elapsed() >= d) {
            return Err(MiningError::DeadlineExceeded { attempts });
        }
        if self.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(MiningError::AttemptsExhausted { attempts });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MiningReport {
    pub nonce: u64,
    pub hash: String,
    /// Nonces covered up to and including the winner.
    pub attempts: u64,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Mines `block` in place according to `options`.
pub fn run(
    block: &mut Block,
    difficulty: u32,
    options: &MiningOptions,
) -> Result<MiningReport, MiningError> {
    if options.parallel {
        search_parallel(block, difficulty, options)
    } else {
        search(block, difficulty, options)
    }
}

/// Sequential search from the block's current nonce. Limits are checked
/// every [`NONCES_PER_BATCH`] nonces, the attempt cap on every nonce.
pub fn search(
    block: &mut Block,
    difficulty: u32,
    options: &MiningOptions,
) -> Result<MiningReport, MiningError> {
    let started = Instant::now();
    let mut attempts = 0u64;
    block.recompute_hash();
    loop {
        if attempts % NONCES_PER_BATCH == 0 {
            options.check(started, attempts)?;
        } else if options.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(MiningError::AttemptsExhausted { attempts });
        }
        attempts += 1;
        if block.meets_difficulty(difficulty) {
            return Ok(finish(block, attempts, started));
        }
        block.nonce = block.nonce.wrapping_add(1);
        block.recompute_hash();
    }
}

/// Parallel search over batches of nonces. `find_first` keeps the result
/// identical to [`search`]: the lowest qualifying nonce wins.
pub fn search_parallel(
    block: &mut Block,
    difficulty: u32,
    options: &MiningOptions,
) -> Result<MiningReport, MiningError> {
    let started = Instant::now();
    let batch = NONCES_PER_BATCH * rayon::current_num_threads().max(1) as u64;

    // Only the nonce varies per attempt.
    let index = block.index;
    let previous_hash = block.previous_hash.clone();
    let timestamp = block.timestamp;
    let amount = block.amount;

    let first = block.nonce;
    let mut attempts = 0u64;
    loop {
        options.check(started, attempts)?;
        let mut len = batch;
        if let Some(max) = options.max_attempts {
            len = len.min(max - attempts);
        }
        let lo = first.saturating_add(attempts);
        let hi = lo.saturating_add(len);
        if lo == hi {
            return Err(MiningError::AttemptsExhausted { attempts });
        }

        let found = (lo..hi).into_par_iter().find_first(|nonce| {
            let hash = digest(index, &previous_hash, timestamp, amount, *nonce);
            meets_difficulty(&hash, difficulty)
        });

        match found {
            Some(nonce) => {
                attempts += nonce - lo + 1;
                block.nonce = nonce;
                block.recompute_hash();
                return Ok(finish(block, attempts, started));
            }
            None => attempts += hi - lo,
        }
    }
}

fn finish(block: &Block, attempts: u64, started: Instant) -> MiningReport {
    let elapsed = started.elapsed();
    debug!(
        index = block.index,
        nonce = block.nonce,
        attempts,
        ?elapsed,
        "nonce found"
    );
    MiningReport {
        nonce: block.nonce,
        hash: block.hash.clone(),
        attempts,
        elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Block {
        let mut block = Block::new("Alice", "Bob", 10, 1, "Miner");
        block.index = 1;
        block.previous_hash = digest(0, "null", 0, 0, 0);
        block.timestamp = 1_600_000_000_000;
        block.recompute_hash();
        block
    }

    #[test]
    fn search_matches_plain_mine() {
        let mut expected = candidate();
        expected.mine(3);

        let mut block = candidate();
        let report = search(&mut block, 3, &MiningOptions::unbounded()).unwrap();
        assert_eq!(block, expected);
        assert_eq!(report.nonce, expected.nonce);
        assert_eq!(report.attempts, expected.nonce + 1);
    }

    #[test]
    fn parallel_search_matches_sequential() {
        let mut sequential = candidate();
        search(&mut sequential, 3, &MiningOptions::default()).unwrap();

        let mut parallel = candidate();
        let options = MiningOptions {
            parallel: true,
            ..Default::default()
        };
        let report = search_parallel(&mut parallel, 3, &options).unwrap();
        assert_eq!(parallel.nonce, sequential.nonce);
        assert_eq!(parallel.hash, sequential.hash);
        assert_eq!(report.attempts, sequential.nonce + 1);
        assert!(parallel.is_intact());
    }

    #[test]
    fn attempt_cap_stops_search() {
        let mut block = candidate();
        let options = MiningOptions {
            max_attempts: Some(10),
            ..Default::default()
        };
        // 64 zero digits is unreachable.
        let err = search(&mut block, 64, &options).unwrap_err();
        assert_eq!(err, MiningError::AttemptsExhausted { attempts: 10 });

        let mut block = candidate();
        let err = search_parallel(&mut block, 64, &options).unwrap_err();
        assert_eq!(err, MiningError::AttemptsExhausted { attempts: 10 });
    }

    #[test]
    fn cancelled_search_returns_immediately() {
        let flag = CancelFlag::new();
        flag.cancel();
        let options = MiningOptions {
            cancel: Some(flag),
            ..Default::default()
        };
        let mut block = candidate();
        assert_eq!(
            search(&mut block, 64, &options).unwrap_err(),
            MiningError::Cancelled { attempts: 0 }
        );
        assert_eq!(
            run(&mut block, 64, &MiningOptions { parallel: true, ..options }).unwrap_err(),
            MiningError::Cancelled { attempts: 0 }
        );
    }

    #[test]
    fn deadline_stops_search() {
        let options = MiningOptions {
            deadline: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let mut block = candidate();
        let err = search(&mut block, 64, &options).unwrap_err();
        assert!(matches!(err, MiningError::DeadlineExceeded { .. }));
        assert!(err.attempts() > 0);
    }

    #[test]
    fn zero_difficulty_accepts_first_nonce() {
        let mut block = candidate();
        let report = search(&mut block, 0, &MiningOptions::default()).unwrap();
        assert_eq!(report.nonce, 0);
        assert_eq!(report.attempts, 1);
    }
}
