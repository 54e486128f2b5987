use anyhow::Context;
use clap::Parser;
use ledger_node::{router, Args, LedgerService, NodeConfig};
use ledger_storage::SledStore;
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = NodeConfig::from(Args::parse());
    let store = Arc::new(SledStore::open(&config.data_dir)?);
    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {}", config.listen))?;

    // A ledger that cannot be initialised is fatal.
    let service = LedgerService::open(store, config).context("initialising ledger")?;
    let app = router(service);

    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
