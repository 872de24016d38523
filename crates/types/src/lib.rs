use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque ledger transaction identifier, assigned at submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub String);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TxId {
    fn from(s: String) -> Self {
        TxId(s)
    }
}

impl From<&str> for TxId {
    fn from(s: &str) -> Self {
        TxId(s.to_string())
    }
}

/// Account address on the ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Address(s)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address(s.to_string())
    }
}

/// Identifier of a fungible asset (e.g. "FLOW", "USDC")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        AssetId(s)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        AssetId(s.to_string())
    }
}

/// Asset-moving operations the protocol supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Borrow,
    Repay,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Borrow => write!(f, "borrow"),
            OperationKind::Repay => write!(f, "repay"),
        }
    }
}

/// A validated asset-moving operation, ready for submission.
///
/// Construct through the request builder; `amount` is always positive and
/// `asset` non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub amount: Decimal,
    pub asset: AssetId,
}

/// Lifecycle state of the one in-flight transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Idle,
    Pending,
    Success,
    Error,
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleStatus::Idle => write!(f, "idle"),
            LifecycleStatus::Pending => write!(f, "pending"),
            LifecycleStatus::Success => write!(f, "success"),
            LifecycleStatus::Error => write!(f, "error"),
        }
    }
}

/// Snapshot of the transaction lifecycle, as rendered by the dashboard.
///
/// Invariant: `error` is present iff `status == Error`; `transaction_id` is
/// set once submission succeeds and never mutated afterward (an `Error`
/// snapshot keeps the id when the submission itself went through).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxLifecycle {
    pub status: LifecycleStatus,
    pub transaction_id: Option<TxId>,
    pub error: Option<String>,
}

impl TxLifecycle {
    /// Initial state: nothing in flight
    pub fn idle() -> Self {
        Self {
            status: LifecycleStatus::Idle,
            transaction_id: None,
            error: None,
        }
    }

    /// A submission is in flight; id and error are cleared
    pub fn pending() -> Self {
        Self {
            status: LifecycleStatus::Pending,
            transaction_id: None,
            error: None,
        }
    }

    /// Submission accepted; the id is visible while finality is still
    /// outstanding so a UI can show "submitted" distinctly from "confirmed"
    pub fn submitted(transaction_id: TxId) -> Self {
        Self {
            status: LifecycleStatus::Pending,
            transaction_id: Some(transaction_id),
            error: None,
        }
    }

    /// Terminal success for the given sealed transaction
    pub fn succeeded(transaction_id: TxId) -> Self {
        Self {
            status: LifecycleStatus::Success,
            transaction_id: Some(transaction_id),
            error: None,
        }
    }

    /// Terminal failure; `transaction_id` is retained when submission
    /// happened before the failure
    pub fn failed(error: impl Into<String>, transaction_id: Option<TxId>) -> Self {
        Self {
            status: LifecycleStatus::Error,
            transaction_id,
            error: Some(error.into()),
        }
    }

    /// True once the machine reached Success or Error
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            LifecycleStatus::Success | LifecycleStatus::Error
        )
    }
}

impl Default for TxLifecycle {
    fn default() -> Self {
        Self::idle()
    }
}

/// Read-only projection of a loan held against the protocol.
///
/// The ledger owns the canonical record; the dashboard never mutates these
/// fields, it re-reads them after a successful operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: u64,
    pub borrower: Address,
    pub principal: Decimal,
    pub current_balance: Decimal,
    /// Annual interest rate as a fraction (0.05 = 5%)
    pub interest_rate: Decimal,
    pub accrued_interest: Decimal,
    pub next_payment_due: DateTime<Utc>,
    pub minimum_payment: Decimal,
    pub collateral_amount: Decimal,
    pub collateral_asset: AssetId,
    /// Normalized risk ratio; values at or below 1.0 mean imminent liquidation
    pub health_factor: f64,
    pub days_overdue: u32,
}

impl Loan {
    /// Whether the position is at imminent liquidation risk
    pub fn is_at_liquidation_risk(&self) -> bool {
        self.health_factor <= 1.0
    }

    /// Whether a scheduled payment has been missed
    pub fn is_overdue(&self) -> bool {
        self.days_overdue > 0
    }

    /// Outstanding balance plus interest accrued so far
    pub fn total_owed(&self) -> Decimal {
        self.current_balance + self.accrued_interest
    }
}

/// Per-asset position held by the connected wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub asset: AssetId,
    pub lent: Decimal,
    pub borrowed: Decimal,
    pub collateral: Decimal,
    pub rewards: Decimal,
}

/// Aggregate view over all of a wallet's positions.
///
/// Always recomputed from the position set, never mutated independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub total_lent: Decimal,
    pub total_borrowed: Decimal,
    pub total_collateral: Decimal,
    pub total_rewards: Decimal,
    pub net_worth: Decimal,
    /// `total_borrowed / total_collateral`, 0 when nothing is collateralized
    pub utilization_ratio: f64,
    /// `total_collateral / total_borrowed`; absent when nothing is borrowed
    pub health_factor: Option<f64>,
}

impl Portfolio {
    /// Derive the aggregate from a set of positions
    pub fn from_positions(positions: &[Position]) -> Self {
        let mut total_lent = Decimal::ZERO;
        let mut total_borrowed = Decimal::ZERO;
        let mut total_collateral = Decimal::ZERO;
        let mut total_rewards = Decimal::ZERO;

        for position in positions {
            total_lent += position.lent;
            total_borrowed += position.borrowed;
            total_collateral += position.collateral;
            total_rewards += position.rewards;
        }

        let net_worth = total_lent + total_collateral + total_rewards - total_borrowed;

        let utilization_ratio = if total_collateral > Decimal::ZERO {
            (total_borrowed / total_collateral).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        let health_factor = if total_borrowed > Decimal::ZERO {
            (total_collateral / total_borrowed).to_f64()
        } else {
            None
        };

        Self {
            total_lent,
            total_borrowed,
            total_collateral,
            total_rewards,
            net_worth,
            utilization_ratio,
            health_factor,
        }
    }
}

/// Protocol-wide statistics shown on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolStats {
    pub total_borrowed: Decimal,
    pub total_collateral: Decimal,
    pub active_loans: u64,
    pub loans_at_risk: u64,
}

impl ProtocolStats {
    /// Aggregate over the current loan set; a loan is active while it
    /// carries a balance
    pub fn from_loans(loans: &[Loan]) -> Self {
        let mut total_borrowed = Decimal::ZERO;
        let mut total_collateral = Decimal::ZERO;
        let mut active_loans = 0u64;
        let mut loans_at_risk = 0u64;

        for loan in loans {
            if loan.current_balance > Decimal::ZERO {
                active_loans += 1;
                total_borrowed += loan.current_balance;
                total_collateral += loan.collateral_amount;
                if loan.is_at_liquidation_risk() {
                    loans_at_risk += 1;
                }
            }
        }

        Self {
            total_borrowed,
            total_collateral,
            active_loans,
            loans_at_risk,
        }
    }
}

/// Trust tier derived from a wallet's numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustTier {
    High,
    Medium,
    Low,
}

impl fmt::Display for TrustTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustTier::High => write!(f, "high"),
            TrustTier::Medium => write!(f, "medium"),
            TrustTier::Low => write!(f, "low"),
        }
    }
}

/// Tier cut points. These are protocol policy, not core logic, so they are
/// carried as configuration and validated when loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    high_min: u32,
    medium_min: u32,
}

impl TierThresholds {
    /// Validate and construct; `medium_min` must not exceed `high_min`
    pub fn new(high_min: u32, medium_min: u32) -> Result<Self> {
        if medium_min > high_min {
            return Err(Error::InvalidThresholds {
                high_min,
                medium_min,
            });
        }
        Ok(Self {
            high_min,
            medium_min,
        })
    }

    /// Minimum score for the high tier
    pub fn high_min(&self) -> u32 {
        self.high_min
    }

    /// Minimum score for the medium tier
    pub fn medium_min(&self) -> u32 {
        self.medium_min
    }

    /// Map a score to its tier. Pure and total over the score domain.
    pub fn tier_for(&self, score: u32) -> TrustTier {
        if score >= self.high_min {
            TrustTier::High
        } else if score >= self.medium_min {
            TrustTier::Medium
        } else {
            TrustTier::Low
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high_min: 75,
            medium_min: 50,
        }
    }
}

/// The connected wallet as the dashboard sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub address: Address,
    pub connected: bool,
    pub verified: bool,
    pub trust_score: u32,
}

impl User {
    /// Trust tier under the given policy thresholds
    pub fn tier(&self, thresholds: &TierThresholds) -> TrustTier {
        thresholds.tier_for(self.trust_score)
    }
}

/// Result type for domain model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Domain model errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid tier thresholds: medium_min {medium_min} exceeds high_min {high_min}")]
    InvalidThresholds { high_min: u32, medium_min: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal(s: &str) -> Decimal {
        s.parse().expect("valid decimal literal")
    }

    fn position(
        asset: &str,
        lent: &str,
        borrowed: &str,
        collateral: &str,
        rewards: &str,
    ) -> Position {
        Position {
            asset: AssetId::from(asset),
            lent: decimal(lent),
            borrowed: decimal(borrowed),
            collateral: decimal(collateral),
            rewards: decimal(rewards),
        }
    }

    fn loan(balance: &str, collateral: &str, health_factor: f64, days_overdue: u32) -> Loan {
        Loan {
            id: 1,
            borrower: Address::from("0xf8d6e0586b0a20c7"),
            principal: decimal(balance),
            current_balance: decimal(balance),
            interest_rate: decimal("0.05"),
            accrued_interest: decimal("0"),
            next_payment_due: Utc::now(),
            minimum_payment: decimal("10"),
            collateral_amount: decimal(collateral),
            collateral_asset: AssetId::from("FLOW"),
            health_factor,
            days_overdue,
        }
    }

    #[test]
    fn test_lifecycle_constructors_hold_invariant() {
        let idle = TxLifecycle::idle();
        assert_eq!(idle.status, LifecycleStatus::Idle);
        assert!(idle.transaction_id.is_none() && idle.error.is_none());
        assert!(!idle.is_terminal());

        let pending = TxLifecycle::pending();
        assert_eq!(pending.status, LifecycleStatus::Pending);
        assert!(pending.transaction_id.is_none() && pending.error.is_none());

        let submitted = TxLifecycle::submitted(TxId::from("tx9"));
        assert_eq!(submitted.status, LifecycleStatus::Pending);
        assert_eq!(submitted.transaction_id, Some(TxId::from("tx9")));
        assert!(!submitted.is_terminal());

        let succeeded = TxLifecycle::succeeded(TxId::from("tx1"));
        assert_eq!(succeeded.status, LifecycleStatus::Success);
        assert_eq!(succeeded.transaction_id, Some(TxId::from("tx1")));
        assert!(succeeded.error.is_none());
        assert!(succeeded.is_terminal());

        // A failure after submission keeps the real transaction id
        let failed = TxLifecycle::failed("network error", Some(TxId::from("tx2")));
        assert_eq!(failed.status, LifecycleStatus::Error);
        assert_eq!(failed.transaction_id, Some(TxId::from("tx2")));
        assert_eq!(failed.error.as_deref(), Some("network error"));
    }

    #[test]
    fn test_loan_risk_and_overdue() {
        assert!(loan("100", "120", 0.95, 0).is_at_liquidation_risk());
        assert!(loan("100", "200", 1.0, 0).is_at_liquidation_risk());
        assert!(!loan("100", "300", 2.4, 0).is_at_liquidation_risk());

        assert!(!loan("100", "300", 2.4, 0).is_overdue());
        assert!(loan("100", "300", 2.4, 3).is_overdue());
    }

    #[test]
    fn test_loan_total_owed() {
        let mut l = loan("100", "300", 2.0, 0);
        l.accrued_interest = decimal("2.5");
        assert_eq!(l.total_owed(), decimal("102.5"));
    }

    #[test]
    fn test_portfolio_aggregation() {
        let portfolio = Portfolio::from_positions(&[
            position("FLOW", "100", "50", "200", "1.5"),
            position("USDC", "0", "25", "100", "0"),
        ]);

        assert_eq!(portfolio.total_lent, decimal("100"));
        assert_eq!(portfolio.total_borrowed, decimal("75"));
        assert_eq!(portfolio.total_collateral, decimal("300"));
        assert_eq!(portfolio.total_rewards, decimal("1.5"));
        assert_eq!(portfolio.net_worth, decimal("326.5"));
        assert!((portfolio.utilization_ratio - 0.25).abs() < 1e-9);
        assert!((portfolio.health_factor.unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_portfolio_no_collateral_and_no_debt() {
        let empty = Portfolio::from_positions(&[]);
        assert_eq!(empty.utilization_ratio, 0.0);
        assert!(empty.health_factor.is_none());

        let no_collateral = Portfolio::from_positions(&[position("FLOW", "10", "5", "0", "0")]);
        assert_eq!(no_collateral.utilization_ratio, 0.0);
    }

    #[test]
    fn test_protocol_stats_skip_settled_loans() {
        let loans = vec![
            loan("100", "200", 1.8, 0),
            loan("0", "0", 10.0, 0), // repaid, not active
            loan("50", "55", 0.9, 2),
        ];

        let stats = ProtocolStats::from_loans(&loans);
        assert_eq!(stats.active_loans, 2);
        assert_eq!(stats.total_borrowed, decimal("150"));
        assert_eq!(stats.total_collateral, decimal("255"));
        assert_eq!(stats.loans_at_risk, 1);
    }

    #[test]
    fn test_tier_boundaries_follow_configuration() {
        let thresholds = TierThresholds::default();

        // Assert against the configured cut points, not literals
        assert_eq!(thresholds.tier_for(thresholds.high_min()), TrustTier::High);
        assert_eq!(
            thresholds.tier_for(thresholds.high_min() - 1),
            TrustTier::Medium
        );
        assert_eq!(
            thresholds.tier_for(thresholds.medium_min()),
            TrustTier::Medium
        );
        assert_eq!(
            thresholds.tier_for(thresholds.medium_min() - 1),
            TrustTier::Low
        );
        assert_eq!(thresholds.tier_for(u32::MAX), TrustTier::High);
        assert_eq!(thresholds.tier_for(0), TrustTier::Low);
    }

    #[test]
    fn test_tier_scenario_scores() {
        let thresholds = TierThresholds::default();
        assert!(80 >= thresholds.high_min());
        assert_eq!(thresholds.tier_for(80), TrustTier::High);

        let expected = if 40 >= thresholds.medium_min() {
            TrustTier::Medium
        } else {
            TrustTier::Low
        };
        assert_eq!(thresholds.tier_for(40), expected);
    }

    #[test]
    fn test_thresholds_reject_inverted_cut_points() {
        assert!(TierThresholds::new(50, 75).is_err());
        let custom = TierThresholds::new(90, 60).expect("valid thresholds");
        assert_eq!(custom.tier_for(89), TrustTier::Medium);
    }

    #[test]
    fn test_user_tier() {
        let thresholds = TierThresholds::default();
        let user = User {
            address: Address::from("0xf8d6e0586b0a20c7"),
            connected: true,
            verified: true,
            trust_score: thresholds.high_min(),
        };
        assert_eq!(user.tier(&thresholds), TrustTier::High);
    }

    #[test]
    fn test_status_serialization_is_snake_case() {
        let json = serde_json::to_string(&LifecycleStatus::Pending).expect("serialize");
        assert_eq!(json, "\"pending\"");
        let kind: OperationKind = serde_json::from_str("\"borrow\"").expect("deserialize");
        assert_eq!(kind, OperationKind::Borrow);
    }
}
