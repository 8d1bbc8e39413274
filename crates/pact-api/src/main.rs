//! # pact-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the Pact escrow ledger.
//! Binds to `PORT` (default 8080); `PACT_CONFIG` names an optional YAML
//! ledger configuration and `AUTH_TOKEN` enables the bearer gate.
//! `LOG_FORMAT=json` switches log output to JSON lines.

use pact_api::state::{AppConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Build configuration from environment.
    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration failed: {e}");
        e
    })?;
    tracing::info!(
        auth = config.auth_token.is_some(),
        genesis_accounts = config.ledger.genesis.len(),
        custody = %config.ledger.custody_account,
        "configuration loaded"
    );
    let port = config.port;

    let state = AppState::try_with_config(config).map_err(|e| {
        tracing::error!("Ledger bootstrap failed: {e}");
        e
    })?;

    let app = pact_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Pact API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
