//! API route definitions

pub mod transactions;
pub mod trust;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/transactions", post(transactions::submit_transaction))
        .route(
            "/api/v1/transactions/current",
            get(transactions::current_transaction),
        )
        .route(
            "/api/v1/transactions/reset",
            post(transactions::reset_transaction),
        )
        .route("/api/v1/trust/:score", get(trust::trust_tier))
        .with_state(state)
}

/// GET /api/v1/health - Liveness probe
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
