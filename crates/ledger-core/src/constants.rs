use crate::Amount;

pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Leading zero hex digits required of every mined block hash.
pub const DIFFICULTY: u32 = 4;
/// Bonus paid to the miner of a block on top of its fee.
pub const BLOCK_REWARD: Amount = 5;
/// One-time allowance granted to an address with no history.
pub const MINT_GRANT: Amount = 1000;

/// Sender of mint blocks; never debited.
pub const SYSTEM_ADDRESS: &str = "system";
/// Placeholder for unlinked hashes and the genesis addresses.
pub const NULL_SENTINEL: &str = "null";

/// Nonces tested between checks of the mining limits.
pub const NONCES_PER_BATCH: u64 = 4096;
