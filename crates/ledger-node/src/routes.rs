use crate::constants::{BANNER, RESET_COMPLETE};
use crate::service::{
    AddressQuery, AddressView, LedgerService, MineRequest, ServiceError, TransferRequest,
    ValidationReport,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{Block, LedgerError, LedgerStore, PendingTransaction};
use serde::Serialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct Queued {
    transaction: PendingTransaction,
    error: u8,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Ledger(LedgerError::InsufficientBalance { .. }) => {
                StatusCode::PAYMENT_REQUIRED
            }
            ServiceError::Ledger(LedgerError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::Ledger(LedgerError::Mining(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Ledger(LedgerError::Rejected(_)) => StatusCode::CONFLICT,
            ServiceError::Ledger(LedgerError::EmptyChain | LedgerError::Corrupt(_))
            | ServiceError::Persistence(_)
            | ServiceError::Worker(_) => {
                error!(error = %self, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router<S: LedgerStore + 'static>(service: LedgerService<S>) -> Router {
    Router::new()
        .route("/", get(|| async { BANNER }))
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/list-transactions", get(list_transactions::<S>))
        .route("/list-blocks", get(list_blocks::<S>))
        .route("/add-transaction", post(add_transaction::<S>))
        .route("/mine-block", post(mine_block::<S>))
        .route("/view-address", post(view_address::<S>))
        .route("/validate", get(validate::<S>))
        .route("/reset", get(reset::<S>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn list_transactions<S: LedgerStore + 'static>(
    State(service): State<LedgerService<S>>,
) -> Result<Json<Vec<PendingTransaction>>, ServiceError> {
    Ok(Json(service.transactions().await?))
}

async fn list_blocks<S: LedgerStore + 'static>(
    State(service): State<LedgerService<S>>,
) -> Result<Json<Vec<Block>>, ServiceError> {
    Ok(Json(service.blocks().await?))
}

async fn add_transaction<S: LedgerStore + 'static>(
    State(service): State<LedgerService<S>>,
    Json(req): Json<TransferRequest>,
) -> Result<Json<Queued>, ServiceError> {
    let transaction = service.add_transaction(req).await?;
    Ok(Json(Queued {
        transaction,
        error: 0,
    }))
}

async fn mine_block<S: LedgerStore + 'static>(
    State(service): State<LedgerService<S>>,
    Json(req): Json<MineRequest>,
) -> Result<Json<Block>, ServiceError> {
    Ok(Json(service.mine_transaction(req).await?))
}

async fn view_address<S: LedgerStore + 'static>(
    State(service): State<LedgerService<S>>,
    Json(query): Json<AddressQuery>,
) -> Result<Json<AddressView>, ServiceError> {
    Ok(Json(service.view_address(&query.address).await?))
}

async fn validate<S: LedgerStore + 'static>(
    State(service): State<LedgerService<S>>,
) -> Json<ValidationReport> {
    Json(service.validate().await)
}

async fn reset<S: LedgerStore + 'static>(
    State(service): State<LedgerService<S>>,
) -> Result<&'static str, ServiceError> {
    service.reset().await?;
    Ok(RESET_COMPLETE)
}
