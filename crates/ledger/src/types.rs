//! Wire-level types for the ledger access API.

use flowlend_types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signer identity for an operation: the account that proposes, pays for
/// and authorizes the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerContext {
    pub address: Address,
    pub key_index: u32,
}

impl SignerContext {
    pub fn new(address: impl Into<Address>, key_index: u32) -> Self {
        Self {
            address: address.into(),
            key_index,
        }
    }
}

/// Status of a transaction result as reported by the access API.
///
/// `Sealed` is the ledger's canonical terminal status; whether the sealed
/// transaction actually succeeded is carried separately (see
/// [`FinalityResult`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxResultStatus {
    Unknown,
    Pending,
    Finalized,
    Executed,
    Sealed,
    Expired,
}

impl TxResultStatus {
    /// Parse the access API's status string
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PENDING" => TxResultStatus::Pending,
            "FINALIZED" => TxResultStatus::Finalized,
            "EXECUTED" => TxResultStatus::Executed,
            "SEALED" => TxResultStatus::Sealed,
            "EXPIRED" => TxResultStatus::Expired,
            _ => TxResultStatus::Unknown,
        }
    }

    /// Whether the ledger will never change this status again.
    /// `Executed` is not terminal: sealing still follows execution.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxResultStatus::Sealed | TxResultStatus::Expired)
    }
}

impl fmt::Display for TxResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxResultStatus::Unknown => write!(f, "UNKNOWN"),
            TxResultStatus::Pending => write!(f, "PENDING"),
            TxResultStatus::Finalized => write!(f, "FINALIZED"),
            TxResultStatus::Executed => write!(f, "EXECUTED"),
            TxResultStatus::Sealed => write!(f, "SEALED"),
            TxResultStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Terminal outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalityResult {
    /// Raw terminal status reported by the ledger
    pub status: TxResultStatus,
    /// True when the ledger executed the transaction but reverted it
    pub rejected: bool,
    /// Ledger-provided failure description, if any
    pub error_message: Option<String>,
}

impl FinalityResult {
    /// The one success shape: sealed and not reverted
    pub fn is_success(&self) -> bool {
        self.status == TxResultStatus::Sealed && !self.rejected
    }
}
