use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_LISTEN};
use clap::Parser;
use ledger_core::constants::DIFFICULTY;
use ledger_core::{AuthorizationPolicy, MiningOptions};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node", about = "Proof-of-work transfer ledger node")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:2000
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Data directory for sled
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Give up mining a block after this many nonces (default: never)
    #[arg(long)]
    pub max_attempts: Option<u64>,

    /// Give up mining a block after this many seconds (default: never)
    #[arg(long)]
    pub mining_deadline_secs: Option<u64>,

    /// Spread each nonce search over all cores
    #[arg(long)]
    pub parallel_mining: bool,

    /// Do not mint the grant block for addresses seen for the first time
    #[arg(long)]
    pub no_first_contact_mint: bool,
}

/// Runtime settings of a node. Protocol constants come from
/// `ledger_core::constants`.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub listen: String,
    pub data_dir: PathBuf,
    pub difficulty: u32,
    pub mining: MiningOptions,
    pub policy: AuthorizationPolicy,
    /// Mint a `system` grant block when an unknown sender first submits.
    pub first_contact_mint: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            difficulty: DIFFICULTY,
            mining: MiningOptions::unbounded(),
            policy: AuthorizationPolicy::default(),
            first_contact_mint: true,
        }
    }
}

impl From<Args> for NodeConfig {
    fn from(args: Args) -> Self {
        Self {
            listen: args.listen,
            data_dir: args.data_dir,
            mining: MiningOptions {
                max_attempts: args.max_attempts,
                deadline: args.mining_deadline_secs.map(Duration::from_secs),
                cancel: None,
                parallel: args.parallel_mining,
            },
            first_contact_mint: !args.no_first_contact_mint,
            ..Self::default()
        }
    }
}
