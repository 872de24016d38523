//! Transaction lifecycle orchestration service
//!
//! Drives one in-flight borrow/repay operation through its lifecycle:
//! Idle → Pending → Success or Error, terminal until an explicit reset.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, Result};
use flowlend_ledger::{IdentityProvider, LedgerClient};
use flowlend_types::{Operation, TxId, TxLifecycle};

/// Lifecycle state tagged with the identity of the operation it belongs to.
#[derive(Debug)]
struct TrackedLifecycle {
    lifecycle: TxLifecycle,
    /// Bumped by every `start` and `reset`. A resolution carrying an older
    /// epoch lost the race against a reset or a newer operation and must
    /// not touch the state.
    epoch: u64,
}

/// Main orchestration service.
///
/// Owns the single live lifecycle state. One operation may be in flight per
/// instance; callers serialize their `start` calls (the dashboard disables
/// its submit control while `Pending`). State writes after each suspension
/// point are guarded by the epoch check, so a finality result that arrives
/// after `reset()` or after a newer `start()` is silently discarded.
pub struct TransactionOrchestrator<C> {
    /// Ledger client used for submission and the finality wait.
    client: Arc<C>,

    /// Source of the current signer identity, consulted at call time.
    identity: Arc<dyn IdentityProvider>,

    /// The one live lifecycle state.
    state: RwLock<TrackedLifecycle>,
}

impl<C: LedgerClient> TransactionOrchestrator<C> {
    /// Create a new orchestrator in the `Idle` state.
    pub fn new(client: Arc<C>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            client,
            identity,
            state: RwLock::new(TrackedLifecycle {
                lifecycle: TxLifecycle::idle(),
                epoch: 0,
            }),
        }
    }

    /// Read the current lifecycle snapshot for rendering.
    pub async fn snapshot(&self) -> TxLifecycle {
        self.state.read().await.lifecycle.clone()
    }

    /// Drive one operation from submission through finality.
    ///
    /// Transitions to `Pending` before the first suspension point, then
    /// applies the submit outcome and the finality outcome in that order.
    /// Returns the terminal outcome to the caller even when the state
    /// writes were discarded as stale.
    pub async fn start(&self, operation: Operation) -> Result<TxId> {
        let epoch = {
            let mut state = self.state.write().await;
            state.epoch += 1;
            state.lifecycle = TxLifecycle::pending();
            state.epoch
        };

        info!(
            "Starting {} of {} {}",
            operation.kind, operation.amount, operation.asset
        );

        let signer = match self.identity.current_identity() {
            Some(signer) => signer,
            None => {
                let err = OrchestratorError::NoSigner;
                warn!("Cannot submit: {}", err);
                self.apply_if_current(epoch, TxLifecycle::failed(err.to_string(), None))
                    .await;
                return Err(err);
            }
        };

        let tx_id = match self.client.submit(&operation, &signer).await {
            Ok(tx_id) => tx_id,
            Err(e) => {
                let message = e.to_string();
                warn!("Submission failed: {}", message);
                self.apply_if_current(epoch, TxLifecycle::failed(message.clone(), None))
                    .await;
                return Err(OrchestratorError::Submission(message));
            }
        };

        // The id is visible before finality, never mutated afterward.
        self.apply_if_current(epoch, TxLifecycle::submitted(tx_id.clone()))
            .await;
        info!("Submitted transaction {}", tx_id);

        match self.client.await_finality(&tx_id).await {
            Ok(result) if result.is_success() => {
                self.apply_if_current(epoch, TxLifecycle::succeeded(tx_id.clone()))
                    .await;
                info!("Transaction {} sealed successfully", tx_id);
                Ok(tx_id)
            }
            Ok(result) => {
                let err = OrchestratorError::Rejected;
                warn!(
                    "Transaction {} ended {} (rejected: {})",
                    tx_id, result.status, result.rejected
                );
                self.apply_if_current(epoch, TxLifecycle::failed(err.to_string(), Some(tx_id)))
                    .await;
                Err(err)
            }
            Err(e) => {
                // The submission was real; keep the id in the error state.
                let message = e.to_string();
                warn!("Finality wait for {} failed: {}", tx_id, message);
                self.apply_if_current(epoch, TxLifecycle::failed(message.clone(), Some(tx_id)))
                    .await;
                Err(OrchestratorError::Finality(message))
            }
        }
    }

    /// Unconditionally return to `Idle`.
    ///
    /// Does not cancel an in-flight ledger operation (nothing can); it
    /// detaches the visible state from the wait, and the epoch bump makes
    /// any late resolution stale.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.epoch += 1;
        state.lifecycle = TxLifecycle::idle();
        debug!("Lifecycle reset to idle");
    }

    /// Apply a transition only if it still belongs to the current
    /// operation.
    async fn apply_if_current(&self, epoch: u64, next: TxLifecycle) -> bool {
        let mut state = self.state.write().await;
        if state.epoch != epoch {
            debug!("Discarding stale transition to {}", next.status);
            return false;
        }
        state.lifecycle = next;
        true
    }
}

/// Builder for TransactionOrchestrator
pub struct TransactionOrchestratorBuilder<C> {
    client: Option<Arc<C>>,
    identity: Option<Arc<dyn IdentityProvider>>,
}

impl<C: LedgerClient> TransactionOrchestratorBuilder<C> {
    pub fn new() -> Self {
        Self {
            client: None,
            identity: None,
        }
    }

    pub fn with_client(mut self, client: Arc<C>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn build(self) -> Result<Arc<TransactionOrchestrator<C>>> {
        let client = self
            .client
            .ok_or_else(|| OrchestratorError::Configuration("ledger client required".to_string()))?;
        let identity = self.identity.ok_or_else(|| {
            OrchestratorError::Configuration("identity provider required".to_string())
        })?;
        Ok(Arc::new(TransactionOrchestrator::new(client, identity)))
    }
}

impl<C: LedgerClient> Default for TransactionOrchestratorBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlend_ledger::{
        FinalityResult, LedgerError, NoIdentity, SignerContext, StaticIdentity, TxResultStatus,
    };
    use flowlend_types::{LifecycleStatus, OperationKind};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    #[derive(Debug, Clone, Copy)]
    enum FinalityOutcome {
        Sealed,
        Reverted,
        Failing(&'static str),
    }

    /// Scriptable ledger client. Assigns sequential ids ("tx1", "tx2", ...)
    /// and can hold the first submit or finality call open on a gate until
    /// the test releases it.
    struct MockLedger {
        fail_submit: Option<&'static str>,
        finality: FinalityOutcome,
        gate_submit: bool,
        gate_first_finality: bool,
        gate: Notify,
        submissions: AtomicU32,
        finality_calls: AtomicU32,
    }

    impl MockLedger {
        fn new() -> Self {
            Self {
                fail_submit: None,
                finality: FinalityOutcome::Sealed,
                gate_submit: false,
                gate_first_finality: false,
                gate: Notify::new(),
                submissions: AtomicU32::new(0),
                finality_calls: AtomicU32::new(0),
            }
        }

        fn release(&self) {
            self.gate.notify_one();
        }
    }

    impl LedgerClient for MockLedger {
        async fn submit(
            &self,
            _operation: &Operation,
            _signer: &SignerContext,
        ) -> std::result::Result<TxId, LedgerError> {
            if self.gate_submit {
                self.gate.notified().await;
            }
            if let Some(message) = self.fail_submit {
                return Err(LedgerError::ApiRequest(message.to_string()));
            }
            let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(TxId::from(format!("tx{}", n)))
        }

        async fn await_finality(
            &self,
            _tx_id: &TxId,
        ) -> std::result::Result<FinalityResult, LedgerError> {
            let call = self.finality_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.gate_first_finality && call == 1 {
                self.gate.notified().await;
            }
            match self.finality {
                FinalityOutcome::Sealed => Ok(FinalityResult {
                    status: TxResultStatus::Sealed,
                    rejected: false,
                    error_message: None,
                }),
                FinalityOutcome::Reverted => Ok(FinalityResult {
                    status: TxResultStatus::Sealed,
                    rejected: true,
                    error_message: Some("insufficient liquidity".to_string()),
                }),
                FinalityOutcome::Failing(message) => {
                    Err(LedgerError::ApiRequest(message.to_string()))
                }
            }
        }
    }

    fn orchestrator(ledger: MockLedger) -> Arc<TransactionOrchestrator<MockLedger>> {
        Arc::new(TransactionOrchestrator::new(
            Arc::new(ledger),
            Arc::new(StaticIdentity::new("0xf8d6e0586b0a20c7", 0)),
        ))
    }

    fn borrow(amount: &str) -> Operation {
        crate::builder::OperationRequest::new(OperationKind::Borrow, amount, "FLOW")
            .build()
            .expect("valid operation")
    }

    fn repay(amount: &str) -> Operation {
        crate::builder::OperationRequest::new(OperationKind::Repay, amount, "FLOW")
            .build()
            .expect("valid operation")
    }

    #[tokio::test]
    async fn test_pending_before_any_resolution() {
        let mut ledger = MockLedger::new();
        ledger.gate_submit = true;
        let orch = orchestrator(ledger);

        let handle = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.start(borrow("100.0")).await }
        });

        // Let the spawned start run up to the gated submit
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.status, LifecycleStatus::Pending);
        assert!(snapshot.transaction_id.is_none());

        orch.client.release();
        let tx_id = handle.await.expect("task").expect("success");
        assert_eq!(tx_id, TxId::from("tx1"));
        assert_eq!(orch.snapshot().await, TxLifecycle::succeeded(tx_id));
    }

    #[tokio::test]
    async fn test_borrow_success_scenario() {
        let orch = orchestrator(MockLedger::new());

        let tx_id = orch.start(borrow("100.0")).await.expect("sealed");
        assert_eq!(tx_id, TxId::from("tx1"));

        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.status, LifecycleStatus::Success);
        assert_eq!(snapshot.transaction_id, Some(TxId::from("tx1")));
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_submit_failure_leaves_no_transaction_id() {
        let mut ledger = MockLedger::new();
        ledger.fail_submit = Some("network error");
        let orch = orchestrator(ledger);

        let err = orch.start(repay("50.0")).await.expect_err("submission fails");
        assert!(matches!(err, OrchestratorError::Submission(_)));

        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.status, LifecycleStatus::Error);
        assert!(snapshot.transaction_id.is_none());
        assert!(snapshot.error.as_deref().unwrap().contains("network error"));
    }

    #[tokio::test]
    async fn test_finality_rejection_retains_transaction_id() {
        let mut ledger = MockLedger::new();
        ledger.finality = FinalityOutcome::Reverted;
        let orch = orchestrator(ledger);

        let err = orch.start(borrow("100.0")).await.expect_err("reverted");
        assert!(matches!(err, OrchestratorError::Rejected));

        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.status, LifecycleStatus::Error);
        assert_eq!(snapshot.transaction_id, Some(TxId::from("tx1")));
        assert_eq!(
            snapshot.error.as_deref(),
            Some("operation failed or was reverted")
        );
    }

    #[tokio::test]
    async fn test_finality_transport_failure_retains_transaction_id() {
        let mut ledger = MockLedger::new();
        ledger.finality = FinalityOutcome::Failing("connection reset");
        let orch = orchestrator(ledger);

        let err = orch.start(borrow("1")).await.expect_err("finality fails");
        assert!(matches!(err, OrchestratorError::Finality(_)));

        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.status, LifecycleStatus::Error);
        assert_eq!(snapshot.transaction_id, Some(TxId::from("tx1")));
    }

    #[tokio::test]
    async fn test_missing_signer_is_a_terminal_error() {
        let orch = Arc::new(TransactionOrchestrator::new(
            Arc::new(MockLedger::new()),
            Arc::new(NoIdentity),
        ));

        let err = orch.start(borrow("1")).await.expect_err("no signer");
        assert!(matches!(err, OrchestratorError::NoSigner));
        assert_eq!(orch.snapshot().await.status, LifecycleStatus::Error);
    }

    #[tokio::test]
    async fn test_reset_on_idle_is_a_noop() {
        let orch = orchestrator(MockLedger::new());
        let before = orch.snapshot().await;
        orch.reset().await;
        assert_eq!(orch.snapshot().await, before);
        assert_eq!(before, TxLifecycle::idle());
    }

    #[tokio::test]
    async fn test_reset_clears_terminal_state() {
        let orch = orchestrator(MockLedger::new());
        orch.start(borrow("100.0")).await.expect("sealed");
        orch.reset().await;
        assert_eq!(orch.snapshot().await, TxLifecycle::idle());
    }

    #[tokio::test]
    async fn test_late_resolution_does_not_clobber_reset() {
        let mut ledger = MockLedger::new();
        ledger.gate_first_finality = true;
        let orch = orchestrator(ledger);

        let handle = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.start(borrow("100.0")).await }
        });

        // Wait until the submission landed and the finality wait is parked
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.status, LifecycleStatus::Pending);
        assert_eq!(snapshot.transaction_id, Some(TxId::from("tx1")));

        orch.reset().await;
        assert_eq!(orch.snapshot().await, TxLifecycle::idle());

        // Release the parked finality wait; its resolution is stale now
        orch.client.release();
        let outcome = handle.await.expect("task");
        assert_eq!(outcome.expect("outcome still returned"), TxId::from("tx1"));
        assert_eq!(orch.snapshot().await, TxLifecycle::idle());
    }

    #[tokio::test]
    async fn test_late_resolution_does_not_clobber_newer_operation() {
        let mut ledger = MockLedger::new();
        ledger.gate_first_finality = true;
        let orch = orchestrator(ledger);

        let first = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.start(borrow("100.0")).await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            orch.snapshot().await.transaction_id,
            Some(TxId::from("tx1"))
        );

        // A newer operation takes over; only the first finality call gates
        let second = orch.start(repay("50.0")).await.expect("sealed");
        assert_eq!(second, TxId::from("tx2"));
        assert_eq!(
            orch.snapshot().await,
            TxLifecycle::succeeded(TxId::from("tx2"))
        );

        orch.client.release();
        let stale = first.await.expect("task");
        assert_eq!(stale.expect("outcome still returned"), TxId::from("tx1"));

        // The newer operation's terminal state survives the stale result
        assert_eq!(
            orch.snapshot().await,
            TxLifecycle::succeeded(TxId::from("tx2"))
        );
    }
}
