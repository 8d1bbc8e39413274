//! # Ledger Configuration
//!
//! YAML deployment configuration shared by the API host and the CLI:
//!
//! ```yaml
//! custody_account: "0x000000000000000000000000000000000000e5c0"
//! policy:
//!   release_authority: seller_only
//!   refund_authority: anyone
//!   cancellation: return_to_seller
//! genesis:
//!   - address: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
//!     balance: "100000000000000000000"
//! ```
//!
//! Every field is optional. The defaults give an unfunded ledger with the
//! default [`EscrowPolicy`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pact_core::{Address, Amount};

use crate::custody::{CustodyError, InMemoryBank};
use crate::ledger::EscrowLedger;
use crate::policy::EscrowPolicy;

/// Well-known custody account used when the configuration names none.
pub const DEFAULT_CUSTODY_ACCOUNT: u64 = 0xE5C0;

/// Errors loading or applying a [`LedgerConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for this schema.
    #[error("failed to parse config {path}: {source}")]
    YamlParse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_yaml::Error,
    },

    /// Inline YAML is not valid for this schema.
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Genesis funding failed.
    #[error("genesis: {0}")]
    Custody(#[from] CustodyError),

    /// An address appears twice in the genesis allocation.
    #[error("duplicate genesis allocation for {0}")]
    DuplicateGenesis(Address),

    /// The genesis allocation funds the custody account directly.
    #[error("genesis may not fund the custody account {0}")]
    CustodyInGenesis(Address),
}

/// One pre-funded account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAllocation {
    /// Account to fund.
    pub address: Address,
    /// Starting balance in wei.
    pub balance: Amount,
}

/// Deployment configuration for one escrow ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Escrow rules.
    #[serde(default)]
    pub policy: EscrowPolicy,
    /// The escrow's own account in the value ledger.
    #[serde(default = "default_custody_account")]
    pub custody_account: Address,
    /// Starting balances.
    #[serde(default)]
    pub genesis: Vec<GenesisAllocation>,
}

fn default_custody_account() -> Address {
    Address::from_low_u64_be(DEFAULT_CUSTODY_ACCOUNT)
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            policy: EscrowPolicy::default(),
            custody_account: default_custody_account(),
            genesis: Vec::new(),
        }
    }
}

impl LedgerConfig {
    /// Parse configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::YamlParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the value ledger described by the genesis allocation.
    pub fn genesis_bank(&self) -> Result<InMemoryBank, ConfigError> {
        let mut seen = BTreeSet::new();
        let mut bank = InMemoryBank::new();
        for alloc in &self.genesis {
            if alloc.address == self.custody_account {
                return Err(ConfigError::CustodyInGenesis(alloc.address.clone()));
            }
            if !seen.insert(&alloc.address) {
                return Err(ConfigError::DuplicateGenesis(alloc.address.clone()));
            }
            bank.mint(&alloc.address, alloc.balance)?;
        }
        Ok(bank)
    }

    /// A fresh ledger funded from genesis.
    pub fn build_ledger(&self) -> Result<EscrowLedger<InMemoryBank>, ConfigError> {
        let bank = self.genesis_bank()?;
        tracing::debug!(
            accounts = self.genesis.len(),
            custody = %self.custody_account,
            "built ledger from genesis"
        );
        Ok(EscrowLedger::new(bank, self.custody_account.clone(), self.policy))
    }
}
