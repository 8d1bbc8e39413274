//! # Account Subcommands
//!
//! `fund` mints value into an account, `balance` reads one, and `audit`
//! prints the active policy and reconciles the custody balance against
//! what the orders hold.

use anyhow::{Context, Result};
use clap::Args;

use pact_core::{Address, Amount};

use crate::{parse_amount, store, Workspace};

/// Arguments for `pact fund`.
#[derive(Args, Debug)]
pub struct FundArgs {
    /// Account to credit.
    #[arg(long)]
    pub to: Address,
    /// Amount to mint (wei, or ether with an `eth` suffix).
    #[arg(long, value_parser = parse_amount)]
    pub amount: Amount,
}

/// Arguments for `pact balance`.
#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Account to inspect.
    pub address: Address,
}

/// Execute `pact fund`.
pub fn run_fund(args: &FundArgs, ws: &Workspace) -> Result<u8> {
    let balance = store::update(&ws.state_file, |ledger| {
        ledger.mint(&args.to, args.amount)?;
        Ok(ledger.balance_of(&args.to))
    })?;
    println!(
        "OK: funded {} with {} ETH (balance {} ETH)",
        args.to,
        args.amount.format_ether(),
        balance.format_ether()
    );
    Ok(0)
}

/// Execute `pact balance`.
pub fn run_balance(args: &BalanceArgs, ws: &Workspace) -> Result<u8> {
    let ledger = store::load(&ws.state_file)?;
    let balance = ledger.balance_of(&args.address);
    println!("{}: {} wei ({} ETH)", args.address, balance, balance.format_ether());
    Ok(0)
}

/// Execute `pact audit`. Returns exit code 2 when custody is out of balance.
pub fn run_audit(ws: &Workspace) -> Result<u8> {
    let ledger = store::load(&ws.state_file)?;
    let policy = ledger.policy();
    println!(
        "policy: release={} refund={} cancellation={}",
        policy.release_authority.as_str(),
        policy.refund_authority.as_str(),
        policy.cancellation.as_str()
    );
    match ledger.verify_custody() {
        Ok(report) => {
            println!(
                "OK: custody {} holds {} ETH across {} open order(s)",
                report.custody_account,
                report.custody_balance.format_ether(),
                report.open_orders
            );
            let json = serde_json::to_string_pretty(&report).context("failed to render report")?;
            println!("{json}");
            Ok(0)
        }
        Err(e) => {
            tracing::error!(error = %e, "custody audit failed");
            println!("FAIL: {e}");
            Ok(2)
        }
    }
}
