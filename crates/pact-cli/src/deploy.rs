//! # Deploy Subcommand
//!
//! Creates a fresh ledger state file from the YAML configuration
//! (`--config`), or from the defaults when none is given.

use anyhow::{bail, Result};
use clap::Args;

use crate::{store, Workspace};

/// Arguments for `pact deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Overwrite an existing state file.
    #[arg(long)]
    pub force: bool,
}

/// Execute `pact deploy`.
pub fn run_deploy(args: &DeployArgs, ws: &Workspace) -> Result<u8> {
    if ws.state_file.exists() && !args.force {
        bail!(
            "{} already exists (pass --force to replace it)",
            ws.state_file.display()
        );
    }
    let config = ws.ledger_config()?;
    let ledger = config.build_ledger()?;
    store::save(&ws.state_file, &ledger)?;

    tracing::info!(
        state = %ws.state_file.display(),
        accounts = config.genesis.len(),
        "ledger deployed"
    );
    println!("Deploying PurchaseAgreement...");
    println!(
        "OK: PurchaseAgreement deployed to: {}",
        ledger.custody_account()
    );
    println!("  state: {}", ws.state_file.display());
    println!(
        "  policy: release={} refund={} cancellation={}",
        config.policy.release_authority.as_str(),
        config.policy.refund_authority.as_str(),
        config.policy.cancellation.as_str()
    );
    for alloc in &config.genesis {
        println!("  funded {} with {} ETH", alloc.address, alloc.balance.format_ether());
    }
    Ok(0)
}
