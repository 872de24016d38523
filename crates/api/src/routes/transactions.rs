//! Transaction lifecycle endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use flowlend_orchestrator::OperationRequest;
use flowlend_types::{LifecycleStatus, OperationKind, TxId, TxLifecycle};
use tracing::info;

use crate::{error::ApiError, state::AppState, ApiResult};

/// Request to submit a borrow or repay operation
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTransactionRequest {
    /// Operation kind: "borrow" or "repay"
    pub kind: OperationKind,
    /// Amount as a decimal string (e.g. "100.0")
    pub amount: String,
    /// Fungible asset identifier (e.g. "FLOW")
    pub asset: String,
}

/// Terminal outcome of a submitted operation.
///
/// Ledger-level failures are reported here with `success: false`; only
/// input and caller errors surface as HTTP error statuses.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTransactionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TxId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/v1/transactions - Submit a borrow or repay operation
///
/// Resolves once the ledger reached a terminal status for the operation.
/// While it is pending, GET /api/v1/transactions/current serves the
/// lifecycle snapshot for rendering.
pub async fn submit_transaction(
    State(state): State<AppState>,
    Json(payload): Json<SubmitTransactionRequest>,
) -> ApiResult<Json<SubmitTransactionResponse>> {
    // Validate before touching the orchestrator; InvalidInput never
    // reaches the lifecycle state
    let operation = OperationRequest::new(payload.kind, payload.amount, payload.asset)
        .build()
        .map_err(ApiError::from)?;

    // Callers serialize: one operation in flight per orchestrator
    if state.orchestrator.snapshot().await.status == LifecycleStatus::Pending {
        return Err(ApiError::Conflict(
            "a transaction is already in flight".to_string(),
        ));
    }

    info!(
        "Submitting {} of {} {}",
        operation.kind, operation.amount, operation.asset
    );

    match state.orchestrator.start(operation).await {
        Ok(transaction_id) => Ok(Json(SubmitTransactionResponse {
            success: true,
            transaction_id: Some(transaction_id),
            error: None,
        })),
        Err(err) => Ok(Json(SubmitTransactionResponse {
            success: false,
            transaction_id: None,
            error: Some(err.to_string()),
        })),
    }
}

/// GET /api/v1/transactions/current - Current lifecycle snapshot
pub async fn current_transaction(State(state): State<AppState>) -> Json<TxLifecycle> {
    Json(state.orchestrator.snapshot().await)
}

/// POST /api/v1/transactions/reset - Return the lifecycle to idle
///
/// Safe at any time; an in-flight ledger operation is not cancelled, its
/// late result is simply discarded.
pub async fn reset_transaction(State(state): State<AppState>) -> Json<TxLifecycle> {
    state.orchestrator.reset().await;
    Json(state.orchestrator.snapshot().await)
}
