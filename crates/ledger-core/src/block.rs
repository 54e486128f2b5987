use crate::constants::{BLOCK_REWARD, NULL_SENTINEL};
use crate::error::MiningError;
use crate::hash::{digest, meets_difficulty};
use crate::mine::{self, MiningOptions, MiningReport};
use crate::Amount;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One settled transfer (or a mint) plus its linkage and mining metadata.
///
/// The serialised form is exactly
/// `{index, from, to, timestamp, amount, fee, reward, miner, previousHash, hash, nonce}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub from: String,
    pub to: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub amount: Amount,
    pub fee: Amount,
    pub reward: Amount,
    pub miner: String,
    pub previous_hash: String,
    pub hash: String,
    pub nonce: u64,
}

impl Block {
    /// A transfer paying the default block reward to `miner`.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        amount: Amount,
        fee: Amount,
        miner: impl Into<String>,
    ) -> Self {
        Self::with_reward(from, to, amount, fee, miner, BLOCK_REWARD)
    }

    pub fn with_reward(
        from: impl Into<String>,
        to: impl Into<String>,
        amount: Amount,
        fee: Amount,
        miner: impl Into<String>,
        reward: Amount,
    ) -> Self {
        let mut block = Self {
            index: 0,
            from: from.into(),
            to: to.into(),
            timestamp: now_millis(),
            amount,
            fee,
            reward,
            miner: miner.into(),
            previous_hash: NULL_SENTINEL.to_string(),
            hash: String::new(),
            nonce: 0,
        };
        block.recompute_hash();
        block
    }

    /// Digest of the current mining fields. Does not touch `self.hash`.
    pub fn compute_hash(&self) -> String {
        digest(
            self.index,
            &self.previous_hash,
            self.timestamp,
            self.amount,
            self.nonce,
        )
    }

    pub fn recompute_hash(&mut self) {
        self.hash = self.compute_hash();
    }

    /// Stored hash agrees with the block's contents.
    pub fn is_intact(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        meets_difficulty(&self.hash, difficulty)
    }

    /// Searches nonces upward from the current one until the hash has
    /// `difficulty` leading zeros. Unbounded. Returns the number of digests
    /// evaluated.
    pub fn mine(&mut self, difficulty: u32) -> u64 {
        self.recompute_hash();
        let mut attempts = 1u64;
        while !self.meets_difficulty(difficulty) {
            self.nonce = self.nonce.wrapping_add(1);
            self.recompute_hash();
            attempts += 1;
        }
        attempts
    }

    /// Like [`Block::mine`], honouring the limits in `options`.
    pub fn mine_with(
        &mut self,
        difficulty: u32,
        options: &MiningOptions,
    ) -> Result<MiningReport, MiningError> {
        mine::run(self, difficulty, options)
    }

    pub fn is_mint(&self) -> bool {
        self.from == crate::constants::SYSTEM_ADDRESS
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HASH_HEX_SIZE;

    fn fixed_block() -> Block {
        let mut block = Block::new("Alice", "Bob", 200, 10, "Carol");
        block.timestamp = 1_600_000_000_000;
        block.recompute_hash();
        block
    }

    #[test]
    fn new_block_defaults() {
        let block = Block::new("Alice", "Bob", 200, 10, "Carol");
        assert_eq!(block.index, 0);
        assert_eq!(block.nonce, 0);
        assert_eq!(block.reward, BLOCK_REWARD);
        assert_eq!(block.previous_hash, NULL_SENTINEL);
        assert_eq!(block.hash.len(), HASH_HEX_SIZE);
        assert!(block.timestamp > 0);
        assert!(block.is_intact());
    }

    #[test]
    fn construction_does_not_validate_amounts() {
        let block = Block::with_reward("Alice", "Alice", 0, 0, "Alice", 0);
        assert_eq!(block.amount, 0);
        assert!(block.is_intact());
    }

    #[test]
    fn hash_ignores_non_mining_fields() {
        let a = fixed_block();
        let mut b = a.clone();
        b.to = "Mallory".to_string();
        b.fee = 999;
        b.miner = "Mallory".to_string();
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn hash_changes_with_nonce() {
        let mut block = fixed_block();
        let before = block.hash.clone();
        block.nonce += 1;
        assert!(!block.is_intact());
        block.recompute_hash();
        assert_ne!(before, block.hash);
    }

    #[test]
    fn mine_finds_first_qualifying_nonce() {
        let mut block = fixed_block();
        let attempts = block.mine(2);
        assert!(block.hash.starts_with("00"));
        assert!(block.is_intact());
        assert_eq!(attempts, block.nonce + 1);
        for nonce in 0..block.nonce {
            let h = digest(block.index, &block.previous_hash, block.timestamp, block.amount, nonce);
            assert!(!meets_difficulty(&h, 2), "nonce {nonce} already qualified");
        }
    }

    #[test]
    fn mining_is_deterministic() {
        let mut a = fixed_block();
        let mut b = fixed_block();
        a.mine(3);
        b.mine(3);
        assert_eq!(a.nonce, b.nonce);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn mine_refreshes_a_stale_hash() {
        let mut block = fixed_block();
        block.index = 9;
        block.previous_hash = "abc".to_string();
        block.mine(1);
        assert!(block.is_intact());
    }

    #[test]
    fn serialized_field_set() {
        let block = fixed_block();
        let value = serde_json::to_value(&block).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "amount", "fee", "from", "hash", "index", "miner", "nonce", "previousHash",
                "reward", "timestamp", "to"
            ]
        );
    }

    #[test]
    fn json_round_trip_reproduces_hash() {
        let mut block = fixed_block();
        block.index = 4;
        block.previous_hash = digest(3, "x", 1, 2, 3);
        block.mine(2);
        let json = serde_json::to_string(&block).unwrap();
        let restored: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, block);
        assert_eq!(restored.compute_hash(), block.hash);
    }

    #[test]
    fn bincode_round_trip_reproduces_hash() {
        let block = fixed_block();
        let bytes = bincode::serialize(&block).unwrap();
        let restored: Block = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.compute_hash(), block.hash);
    }
}
