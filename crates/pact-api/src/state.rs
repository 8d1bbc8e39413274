//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! One [`EscrowLedger`] lives behind an `Arc<parking_lot::Mutex<_>>`. Every
//! handler performs its whole operation (checks, custody movement, event
//! collection) under a single lock acquisition and never holds the guard
//! across an `.await`, so operations on the ledger are strictly serialized.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use pact_ledger::{ConfigError, EscrowLedger, InMemoryBank, LedgerConfig};

/// The ledger type served by the API.
pub type Ledger = EscrowLedger<InMemoryBank>;

/// Environment variable naming the YAML ledger configuration file.
pub const CONFIG_ENV: &str = "PACT_CONFIG";

/// Application configuration.
///
/// Custom `Debug` redacts the auth token.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Policy, custody account and genesis funding.
    pub ledger: LedgerConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("ledger", &self.ledger)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            ledger: LedgerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build configuration from `PORT`, `AUTH_TOKEN` and `PACT_CONFIG`.
    ///
    /// An unparseable `PORT` falls back to 8080. An empty `AUTH_TOKEN`
    /// counts as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let auth_token = std::env::var("AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        let ledger = match std::env::var_os(CONFIG_ENV) {
            Some(path) => LedgerConfig::load(&PathBuf::from(path))?,
            None => LedgerConfig::default(),
        };
        Ok(Self {
            port,
            auth_token,
            ledger,
        })
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The escrow ledger.
    pub ledger: Arc<Mutex<Ledger>>,
    /// Configuration the state was built from.
    pub config: AppConfig,
}

impl AppState {
    /// Build state with a fresh ledger funded from `config.ledger.genesis`.
    pub fn try_with_config(config: AppConfig) -> Result<Self, ConfigError> {
        let ledger = config.ledger.build_ledger()?;
        Ok(Self::from_ledger(ledger, config))
    }

    /// Serve an existing ledger.
    pub fn from_ledger(ledger: Ledger, config: AppConfig) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some("super-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_state_has_empty_ledger() {
        let state = AppState::try_with_config(AppConfig::default()).unwrap();
        let ledger = state.ledger.lock();
        assert_eq!(ledger.order_count(), 0);
        assert!(ledger.verify_custody().is_ok());
    }

    #[test]
    fn clones_share_the_ledger() {
        let state = AppState::try_with_config(AppConfig::default()).unwrap();
        let other = state.clone();
        assert!(Arc::ptr_eq(&state.ledger, &other.ledger));
    }
}
