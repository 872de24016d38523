//! Ledger access API client.
//!
//! Provides async access to:
//! - Operation submission
//! - Transaction result polling until a terminal status
//! - Per-network contract address records

use crate::types::{FinalityResult, SignerContext, TxResultStatus};
use flowlend_types::{Address, Operation, TxId};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Ledger network configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerNetwork {
    Emulator,
    Testnet,
    Mainnet,
}

impl LedgerNetwork {
    /// Parse from string (environment variable).
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => LedgerNetwork::Mainnet,
            "emulator" | "local" => LedgerNetwork::Emulator,
            _ => LedgerNetwork::Testnet, // Default to testnet
        }
    }

    /// Get the access API base URL.
    pub fn api_url(&self) -> &'static str {
        match self {
            LedgerNetwork::Emulator => "http://127.0.0.1:8888/v1",
            LedgerNetwork::Testnet => "https://rest-testnet.onflow.org/v1",
            LedgerNetwork::Mainnet => "https://rest-mainnet.onflow.org/v1",
        }
    }

    /// Get the block explorer URL.
    pub fn explorer_url(&self) -> Option<&'static str> {
        match self {
            LedgerNetwork::Emulator => None, // No explorer for the emulator
            LedgerNetwork::Testnet => Some("https://testnet.flowscan.io"),
            LedgerNetwork::Mainnet => Some("https://www.flowscan.io"),
        }
    }

    /// Get the protocol contract addresses deployed on this network.
    pub fn contract_addresses(&self) -> ContractAddresses {
        match self {
            LedgerNetwork::Emulator => ContractAddresses {
                lending_pool: Address::from("0xf8d6e0586b0a20c7"),
                trust_registry: Address::from("0xf8d6e0586b0a20c7"),
            },
            LedgerNetwork::Testnet => ContractAddresses {
                lending_pool: Address::from("0x8a9f2c5b1d3e4f60"),
                trust_registry: Address::from("0x9b4c6e1a2f5d7e80"),
            },
            LedgerNetwork::Mainnet => ContractAddresses {
                lending_pool: Address::from("0x1654653399040a61"),
                trust_registry: Address::from("0x1d7e57aa55817448"),
            },
        }
    }
}

/// Fixed-field record of protocol contract addresses for one network.
///
/// Validated when configuration is loaded, not looked up dynamically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub lending_pool: Address,
    pub trust_registry: Address,
}

impl ContractAddresses {
    /// Check every field holds a well-formed account address
    pub fn validate(&self) -> Result<(), LedgerError> {
        for address in [&self.lending_pool, &self.trust_registry] {
            if !is_valid_address(&address.0) {
                return Err(LedgerError::InvalidAddress(address.0.clone()));
            }
        }
        Ok(())
    }
}

/// Account addresses are 8 bytes, hex encoded with a 0x prefix.
fn is_valid_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(hex) => hex.len() == 16 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Errors that can occur when interacting with the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("API request failed: {0}")]
    ApiRequest(String),

    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    ParseResponse(String),

    #[error("Submission error {status}: {body}")]
    Submission { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid account address: {0}")]
    InvalidAddress(String),
}

/// Capability the orchestration core requires of a ledger client.
///
/// `submit` resolves once the client layer accepted the operation;
/// `await_finality` suspends until the ledger reaches a terminal status for
/// the handle. Wire format, polling cadence and timeout policy are entirely
/// the implementation's concern.
pub trait LedgerClient: Send + Sync {
    /// Submit an operation for execution, returning its transaction id.
    fn submit(
        &self,
        operation: &Operation,
        signer: &SignerContext,
    ) -> impl Future<Output = Result<TxId, LedgerError>> + Send;

    /// Suspend until the transaction reaches a terminal status.
    fn await_finality(
        &self,
        tx_id: &TxId,
    ) -> impl Future<Output = Result<FinalityResult, LedgerError>> + Send;
}

/// Submission payload accepted by the access API.
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    operation: &'a Operation,
    proposer: &'a Address,
    payer: &'a Address,
    authorizers: Vec<&'a Address>,
    key_index: u32,
}

/// Submission response: the assigned transaction id.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

/// Transaction result as reported by the access API.
#[derive(Debug, Deserialize)]
struct TransactionResultResponse {
    status: String,
    #[serde(default)]
    status_code: i64,
    #[serde(default)]
    error_message: String,
}

/// Async client for the ledger access API.
pub struct HttpLedgerClient {
    network: LedgerNetwork,
    api_base: String,
    poll_interval: Duration,
    client: reqwest::Client,
}

impl HttpLedgerClient {
    /// Create a new client for the given network.
    pub fn new(network: LedgerNetwork) -> Self {
        Self {
            network,
            api_base: network.api_url().to_string(),
            poll_interval: Duration::from_secs(2),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client with a custom API URL (for self-hosted access nodes).
    pub fn with_api_url(network: LedgerNetwork, api_url: String) -> Self {
        Self {
            network,
            api_base: api_url,
            poll_interval: Duration::from_secs(2),
            client: reqwest::Client::new(),
        }
    }

    /// Override the result polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Get the network this client is configured for.
    pub fn network(&self) -> LedgerNetwork {
        self.network
    }

    /// Get transaction URL for the block explorer.
    pub fn tx_url(&self, tx_id: &TxId) -> String {
        if let Some(explorer) = self.network.explorer_url() {
            format!("{}/tx/{}", explorer, tx_id)
        } else {
            format!("tx:{}", tx_id)
        }
    }

    /// Fetch the current result for a transaction.
    async fn get_transaction_result(
        &self,
        tx_id: &TxId,
    ) -> Result<TransactionResultResponse, LedgerError> {
        let url = format!("{}/transaction_results/{}", self.api_base, tx_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LedgerError::ApiRequest(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::ApiError { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| LedgerError::ParseResponse(e.to_string()))
    }
}

impl LedgerClient for HttpLedgerClient {
    /// Submit the operation with the signer as proposer, payer and sole
    /// authorizer.
    async fn submit(
        &self,
        operation: &Operation,
        signer: &SignerContext,
    ) -> Result<TxId, LedgerError> {
        let url = format!("{}/transactions", self.api_base);

        let payload = SubmitRequest {
            operation,
            proposer: &signer.address,
            payer: &signer.address,
            authorizers: vec![&signer.address],
            key_index: signer.key_index,
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| LedgerError::ApiRequest(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Submission { status, body });
        }

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::ParseResponse(e.to_string()))?;

        debug!("Submitted {} operation: {}", operation.kind, submitted.id);

        Ok(TxId::from(submitted.id))
    }

    /// Poll the result endpoint until the ledger reports a terminal status.
    async fn await_finality(&self, tx_id: &TxId) -> Result<FinalityResult, LedgerError> {
        loop {
            let result = self.get_transaction_result(tx_id).await?;
            let status = TxResultStatus::parse(&result.status);

            if status.is_terminal() {
                let rejected = result.status_code != 0;
                debug!(
                    "Transaction {} reached terminal status {} (rejected: {})",
                    tx_id, status, rejected
                );
                return Ok(FinalityResult {
                    status,
                    rejected,
                    error_message: if result.error_message.is_empty() {
                        None
                    } else {
                        Some(result.error_message)
                    },
                });
            }

            debug!("Transaction {} still {}, polling again", tx_id, status);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
