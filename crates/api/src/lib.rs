//! HTTP surface of the lending dashboard core.
//!
//! Exposes the transaction orchestrator to the dashboard UI: submit a
//! borrow/repay, read the lifecycle snapshot for reactive rendering,
//! reset after a terminal state, and derive trust tiers under the
//! configured policy.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use std::net::SocketAddr;
use tracing::info;

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Bind and serve the API until the task is aborted.
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
