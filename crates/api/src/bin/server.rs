//! Lending Dashboard API Server
//!
//! Serves the transaction orchestration core over REST for the dashboard
//! UI: operation submission, lifecycle snapshots, and trust tier lookup.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use flowlend_api::{start_server, AppState};
use flowlend_ledger::{HttpLedgerClient, LedgerNetwork, StaticIdentity};
use flowlend_orchestrator::TransactionOrchestratorBuilder;
use flowlend_types::TierThresholds;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting lending dashboard API server");

    // Load configuration from environment
    let config = load_config()?;

    // Validate the network's contract addresses before serving anything
    let addresses = config.network.contract_addresses();
    addresses.validate()?;
    info!(
        "Contract addresses validated: lending_pool={} trust_registry={}",
        addresses.lending_pool, addresses.trust_registry
    );

    // Initialize ledger client
    let client = match config.api_url_override.clone() {
        Some(url) => HttpLedgerClient::with_api_url(config.network, url),
        None => HttpLedgerClient::new(config.network),
    };
    info!("Ledger client initialized for {:?}", config.network);

    // The server signs with one configured account; a browser deployment
    // would inject the connected wallet here instead
    let identity = StaticIdentity::new(config.signer_address.as_str(), config.signer_key_index);

    let orchestrator = TransactionOrchestratorBuilder::new()
        .with_client(Arc::new(client))
        .with_identity(Arc::new(identity))
        .build()?;
    info!("Transaction orchestrator initialized");

    let state = AppState::new(orchestrator, config.tiers);

    // Parse listen address
    let addr: SocketAddr = config.listen_addr.parse()?;

    info!("Server configuration:");
    info!("  Network: {:?}", config.network);
    info!("  Listen Address: {}", addr);
    info!("  Signer: {}", config.signer_address);
    info!(
        "  Trust tiers: high >= {}, medium >= {}",
        config.tiers.high_min(),
        config.tiers.medium_min()
    );

    // Start the API server in a separate task
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(state, addr).await {
            error!("Server error: {}", e);
        }
    });

    // Wait for shutdown signal
    info!("Server running. Press Ctrl+C to shutdown.");
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    server_handle.abort();
    info!("Shutdown complete");
    Ok(())
}

#[derive(Debug)]
struct Config {
    network: LedgerNetwork,
    api_url_override: Option<String>,
    listen_addr: String,
    signer_address: String,
    signer_key_index: u32,
    tiers: TierThresholds,
}

fn load_config() -> Result<Config> {
    let network = LedgerNetwork::parse(
        &std::env::var("LEDGER_NETWORK").unwrap_or_else(|_| "testnet".to_string()),
    );

    let api_url_override = std::env::var("LEDGER_API_URL").ok();

    let listen_addr =
        std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let signer_address = std::env::var("SIGNER_ADDRESS")
        .map_err(|_| anyhow::anyhow!("SIGNER_ADDRESS environment variable is required"))?;

    let signer_key_index = std::env::var("SIGNER_KEY_INDEX")
        .unwrap_or_else(|_| "0".to_string())
        .parse::<u32>()?;

    // Tier cut points are protocol policy; defaults match the deployed
    // protocol parameters
    let high_min = std::env::var("TRUST_TIER_HIGH_MIN")
        .unwrap_or_else(|_| "75".to_string())
        .parse::<u32>()?;
    let medium_min = std::env::var("TRUST_TIER_MEDIUM_MIN")
        .unwrap_or_else(|_| "50".to_string())
        .parse::<u32>()?;
    let tiers = TierThresholds::new(high_min, medium_min)?;

    Ok(Config {
        network,
        api_url_override,
        listen_addr,
        signer_address,
        signer_key_index,
        tiers,
    })
}
