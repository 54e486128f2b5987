//! HTTP shell around the ledger core: configuration, the service that
//! serialises mining and persistence, and the axum routes.

mod constants;

pub mod config;
pub mod routes;
pub mod service;

pub use config::{Args, NodeConfig};
pub use routes::router;
pub use service::{LedgerService, ServiceError};
