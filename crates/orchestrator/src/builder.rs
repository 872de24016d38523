//! Transaction request builder.
//!
//! Translates raw user input `(kind, amount string, asset identifier)` into
//! a validated, immutable [`Operation`]. Validation happens here, before the
//! orchestrator is ever involved, and has no side effects.

use crate::error::{OrchestratorError, Result};
use flowlend_types::{AssetId, Operation, OperationKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fractional digits of the ledger's fixed-point amount type.
pub const AMOUNT_SCALE: u32 = 8;

/// Raw, unvalidated user input for a borrow or repay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRequest {
    pub kind: OperationKind,
    pub amount: String,
    pub asset: String,
}

impl OperationRequest {
    pub fn new(kind: OperationKind, amount: impl Into<String>, asset: impl Into<String>) -> Self {
        Self {
            kind,
            amount: amount.into(),
            asset: asset.into(),
        }
    }

    /// Validate the request and build the operation.
    ///
    /// Fails with `InvalidInput` when the amount does not parse, is not
    /// positive, carries more precision than the ledger's fixed-point type,
    /// or the asset identifier is empty.
    pub fn build(&self) -> Result<Operation> {
        let asset = self.asset.trim();
        if asset.is_empty() {
            return Err(OrchestratorError::InvalidInput(
                "asset identifier must not be empty".to_string(),
            ));
        }

        let amount: Decimal = self.amount.trim().parse().map_err(|_| {
            OrchestratorError::InvalidInput(format!(
                "amount {:?} is not a valid decimal",
                self.amount
            ))
        })?;

        if amount <= Decimal::ZERO {
            return Err(OrchestratorError::InvalidInput(format!(
                "amount must be positive, got {}",
                amount
            )));
        }

        if amount.scale() > AMOUNT_SCALE {
            return Err(OrchestratorError::InvalidInput(format!(
                "amount {} exceeds {} fractional digits",
                amount, AMOUNT_SCALE
            )));
        }

        Ok(Operation {
            kind: self.kind,
            amount,
            asset: AssetId::from(asset),
        })
    }
}
