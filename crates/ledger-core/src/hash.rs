use crate::Amount;
use sha2::{Digest, Sha256};

/// SHA-256 over the mining fields, hex encoded.
///
/// Fields are rendered in decimal and concatenated in a fixed order:
/// `index`, `previous_hash`, `timestamp`, `amount`, `nonce`. Amounts are
/// integers, so re-serialising a stored block always reproduces the same
/// message.
pub fn digest(index: u64, previous_hash: &str, timestamp: u64, amount: Amount, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string());
    hasher.update(previous_hash);
    hasher.update(timestamp.to_string());
    hasher.update(amount.to_string());
    hasher.update(nonce.to_string());
    hex::encode(hasher.finalize())
}

/// True when the first `difficulty` characters of `hash` are all `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Number of leading `'0'` hex digits in `hash`.
pub fn leading_zero_digits(hash: &str) -> u32 {
    hash.bytes().take_while(|b| *b == b'0').count() as u32
}
