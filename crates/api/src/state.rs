//! Shared application state for the API server

use std::sync::Arc;

use flowlend_ledger::HttpLedgerClient;
use flowlend_orchestrator::TransactionOrchestrator;
use flowlend_types::TierThresholds;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator driving the one in-flight borrow/repay operation
    pub orchestrator: Arc<TransactionOrchestrator<HttpLedgerClient>>,
    /// Trust tier policy thresholds, loaded from configuration
    pub tiers: TierThresholds,
}

impl AppState {
    /// Create new application state
    pub fn new(
        orchestrator: Arc<TransactionOrchestrator<HttpLedgerClient>>,
        tiers: TierThresholds,
    ) -> Self {
        Self {
            orchestrator,
            tiers,
        }
    }
}
