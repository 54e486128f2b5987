use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:2000)
    #[arg(long, global = true, default_value = "http://127.0.0.1:2000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Queue a transfer
    Submit {
        /// Sender
        #[arg(long)]
        from: String,
        /// Recipient
        #[arg(long)]
        to: String,
        /// Amount in minor units
        #[arg(long)]
        amount: u64,
        /// Fee paid to the miner
        #[arg(long, default_value_t = 0)]
        fee: u64,
    },
    /// Mine a pending transaction into a block
    Mine {
        /// Pending transaction id
        #[arg(long)]
        id: String,
        /// Miner address credited with fee and reward
        #[arg(long)]
        address: String,
    },
    /// Show an address's blocks and balance
    Balance {
        #[arg(long)]
        address: String,
    },
    /// List mined blocks
    Blocks,
    /// List pending transactions
    Pending,
    /// Check chain integrity on the node
    Validate,
    /// Wipe the node's chain and storage
    Reset,
}

#[derive(Serialize)]
struct Transfer {
    from: String,
    to: String,
    amount: u64,
    fee: u64,
}

#[derive(Serialize)]
struct MineIn {
    id: String,
    address: String,
}

#[derive(Serialize)]
struct AddressIn {
    address: String,
}

async fn print_response(res: Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    debug!(%status, "node replied");
    match serde_json::from_str::<Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    if !status.is_success() {
        bail!("node returned {status}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = Client::new();
    let res = match cli.cmd {
        Command::Submit {
            from,
            to,
            amount,
            fee,
        } => {
            let tx = Transfer {
                from,
                to,
                amount,
                fee,
            };
            client.post(format!("{node}/add-transaction")).json(&tx).send().await?
        }
        Command::Mine { id, address } => {
            client
                .post(format!("{node}/mine-block"))
                .json(&MineIn { id, address })
                .send()
                .await?
        }
        Command::Balance { address } => {
            client
                .post(format!("{node}/view-address"))
                .json(&AddressIn { address })
                .send()
                .await?
        }
        Command::Blocks => client.get(format!("{node}/list-blocks")).send().await?,
        Command::Pending => client.get(format!("{node}/list-transactions")).send().await?,
        Command::Validate => client.get(format!("{node}/validate")).send().await?,
        Command::Reset => client.get(format!("{node}/reset")).send().await?,
    };
    print_response(res).await
}
