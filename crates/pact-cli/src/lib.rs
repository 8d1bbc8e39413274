//! # pact-cli — CLI Tool for the Pact Escrow Ledger
//!
//! Provides the `pact` command-line interface. Each invocation loads the
//! ledger from a JSON state file, applies one operation, and writes the
//! file back atomically. A rejected operation leaves the file untouched.
//!
//! ## Subcommands
//!
//! - `pact deploy` — Create a fresh state file from the YAML config.
//! - `pact fund` — Mint value into an account.
//! - `pact create-order`, `confirm-purchase`, `confirm-received`,
//!   `release`, `refund` — The five lifecycle operations.
//! - `pact order`, `pact orders` — Inspect orders.
//! - `pact events` — Print the notification log.
//! - `pact balance`, `pact audit` — Balances and the custody audit.
//! - `pact scenario` — Replay the reference purchase in memory.
//!
//! ```bash
//! pact deploy --config deploy/pact.yaml
//! pact create-order --from 0xf39f...2266 --description "A bag of rice" --amount 1eth
//! pact confirm-purchase --from 0x7099...79c8 --order 1
//! ```

pub mod accounts;
pub mod deploy;
pub mod events;
pub mod orders;
pub mod scenario;
pub mod store;

use std::path::PathBuf;

use anyhow::Result;

use pact_core::Amount;
use pact_ledger::{EventRecord, LedgerConfig};

/// Default location of the ledger state file.
pub const DEFAULT_STATE_FILE: &str = ".pact/ledger.json";

/// Paths shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Ledger state file.
    pub state_file: PathBuf,
    /// Optional YAML ledger configuration.
    pub config: Option<PathBuf>,
}

impl Workspace {
    /// Load the configured ledger config, or the defaults when none is given.
    pub fn ledger_config(&self) -> Result<LedgerConfig> {
        match &self.config {
            Some(path) => Ok(LedgerConfig::load(path)?),
            None => Ok(LedgerConfig::default()),
        }
    }
}

/// Parse an amount argument: wei digits, or ether with an `eth`/`ether` suffix.
pub fn parse_amount(text: &str) -> Result<Amount, String> {
    Amount::parse_units(text).map_err(|e| e.to_string())
}

/// Print notifications emitted by an operation.
pub fn print_events(records: &[EventRecord]) {
    for record in records {
        println!("  event #{} {}", record.sequence, record.event);
    }
}
