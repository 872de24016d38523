//! Ledger integration for the lending dashboard.
//!
//! This crate provides:
//! - The `LedgerClient` capability the orchestration core depends on
//!   (submit an operation, then await finality)
//! - An HTTP access-API implementation that polls transaction results
//!   until the ledger reports a terminal status
//! - Typed network selection with per-network contract address records,
//!   validated at configuration load
//! - Signer identity lookup via an injected read-only provider
//!
//! # Integration Flow
//!
//! 1. **Network selection**: `LedgerNetwork::parse()` from configuration,
//!    then `contract_addresses().validate()` at startup
//! 2. **Submission**: `LedgerClient::submit()` with the current signer
//! 3. **Finality**: `LedgerClient::await_finality()` suspends until the
//!    transaction is sealed or expired
//!
//! Once submitted, a ledger transaction cannot be un-submitted; callers
//! that stop caring about a result simply drop the wait.

pub mod client;
pub mod identity;
pub mod types;

// Re-export main types for convenience
pub use client::{
    ContractAddresses, HttpLedgerClient, LedgerClient, LedgerError, LedgerNetwork,
};
pub use identity::{IdentityProvider, NoIdentity, StaticIdentity};
pub use types::{FinalityResult, SignerContext, TxResultStatus};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_exports() {
        let _ = LedgerNetwork::Testnet;
        let _ = TxResultStatus::Sealed;
    }
}
