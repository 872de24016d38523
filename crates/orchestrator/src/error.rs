//! Error types for the transaction orchestrator

use thiserror::Error;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors surfaced at the orchestrator boundary.
///
/// Everything after input validation is also written into the lifecycle
/// state as a terminal `Error`; nothing escapes as an unhandled failure.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Malformed amount or asset, caught before any submission
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No wallet identity available to sign the operation
    #[error("no signer identity available")]
    NoSigner,

    /// The client layer rejected or could not send the operation
    #[error("{0}")]
    Submission(String),

    /// The finality wait itself failed (transport or client error)
    #[error("{0}")]
    Finality(String),

    /// The ledger executed the operation but did not seal it cleanly
    #[error("operation failed or was reverted")]
    Rejected,

    #[error("Configuration error: {0}")]
    Configuration(String),
}
