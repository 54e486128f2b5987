use crate::constants::MINT_GRANT;
use crate::error::{LedgerError, Result};
use crate::{Amount, Balance, Block};

/// Whether `address` appears as sender, recipient or miner of `block`.
pub fn touches(block: &Block, address: &str) -> bool {
    block.from == address || block.to == address || block.miner == address
}

/// Folds the effect of `blocks` on `address`, starting from zero.
///
/// Each role is applied independently, so a block where the address is both
/// sender and miner debits `amount + fee` and credits `fee + reward`.
/// Blocks not touching the address contribute nothing.
pub fn compute_balance<'a, I>(address: &str, blocks: I) -> Balance
where
    I: IntoIterator<Item = &'a Block>,
{
    blocks.into_iter().fold(0, |mut balance: Balance, block| {
        if block.from == address {
            balance -= Balance::from(block.amount) + Balance::from(block.fee);
        }
        if block.to == address {
            balance += Balance::from(block.amount);
        }
        if block.miner == address {
            balance += Balance::from(block.fee) + Balance::from(block.reward);
        }
        balance
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorizationPolicy {
    /// Spend allowed to an address with no history at all.
    pub mint_grant: Amount,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self {
            mint_grant: MINT_GRANT,
        }
    }
}

/// Decides whether `address` may move `amount + fee`, given every block
/// touching it. Returns the balance the decision was based on.
pub fn authorize(
    address: &str,
    history: &[Block],
    amount: Amount,
    fee: Amount,
    policy: &AuthorizationPolicy,
) -> Result<Balance> {
    let balance = compute_balance(address, history);
    let insufficient = || LedgerError::InsufficientBalance {
        address: address.to_string(),
        available: balance,
        required: amount.saturating_add(fee),
    };
    let required = amount.checked_add(fee).ok_or_else(insufficient)?;

    if Balance::from(required) <= balance {
        return Ok(balance);
    }
    if history.is_empty() && required <= policy.mint_grant {
        return Ok(Balance::from(policy.mint_grant));
    }
    Err(insufficient())
}
