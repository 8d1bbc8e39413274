//! # Scenario Subcommand
//!
//! Replays the reference purchase against an in-memory ledger: two funded
//! development accounts, a 1 ETH order secured by 2 ETH deposits, then
//! either the happy path or a cancellation. Nothing touches the state file.

use anyhow::{anyhow, Result};
use clap::Args;

use pact_core::{Address, Amount, OrderId};
use pact_ledger::{EscrowError, LedgerConfig};

use crate::print_events;
use crate::store::Ledger;

/// First development signer; acts as the seller.
pub const DEV_SELLER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
/// Second development signer; acts as the buyer.
pub const DEV_BUYER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

const DEV_FUNDING_ETHER: u64 = 10_000;

/// Arguments for `pact scenario`.
#[derive(Args, Debug)]
pub struct ScenarioArgs {
    /// Cancel after locking instead of completing the purchase.
    #[arg(long)]
    pub refund: bool,
}

/// Outcome of a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutcome {
    /// The order that was driven.
    pub order: OrderId,
    /// Seller balance change in wei, signed.
    pub seller_delta: i128,
    /// Buyer balance change in wei, signed.
    pub buyer_delta: i128,
    /// Notifications emitted.
    pub events: usize,
}

/// Execute `pact scenario`.
pub fn run_scenario(args: &ScenarioArgs) -> Result<u8> {
    let outcome = replay(args.refund)?;
    println!(
        "OK: scenario {} completed for order {} ({} events)",
        if args.refund { "refund" } else { "purchase" },
        outcome.order,
        outcome.events
    );
    println!("  seller delta: {} wei", outcome.seller_delta);
    println!("  buyer delta:  {} wei", outcome.buyer_delta);
    Ok(0)
}

/// Drive one order through the lifecycle and audit custody after every step.
pub fn replay(refund: bool) -> Result<ScenarioOutcome> {
    let seller: Address = DEV_SELLER.parse()?;
    let buyer: Address = DEV_BUYER.parse()?;
    let mut ledger = LedgerConfig::default().build_ledger()?;
    let funding = Amount::from_whole_ether(DEV_FUNDING_ETHER)
        .ok_or_else(|| anyhow!("funding overflow"))?;
    ledger.mint(&seller, funding)?;
    ledger.mint(&buyer, funding)?;

    let price = Amount::from_whole_ether(1).ok_or_else(|| anyhow!("price overflow"))?;
    let deposit = Amount::from_whole_ether(2).ok_or_else(|| anyhow!("deposit overflow"))?;

    let id = step(&mut ledger, "createOrder", |l| {
        l.create_order(&seller, "A bag of rice", price, deposit)
    })?;
    step(&mut ledger, "confirmPurchase", |l| {
        l.confirm_purchase(&buyer, id, deposit)
    })?;
    if refund {
        step(&mut ledger, "refundBuyer", |l| l.refund_buyer(&seller, id))?;
    } else {
        step(&mut ledger, "confirmReceived", |l| l.confirm_received(&buyer, id))?;
        step(&mut ledger, "releaseSellerDeposit", |l| {
            l.release_seller_deposit(&seller, id)
        })?;
    }

    let delta = |account: &Address| {
        ledger.balance_of(account).as_wei() as i128 - funding.as_wei() as i128
    };
    Ok(ScenarioOutcome {
        order: id,
        seller_delta: delta(&seller),
        buyer_delta: delta(&buyer),
        events: ledger.events().len(),
    })
}

fn step<T>(
    ledger: &mut Ledger,
    name: &str,
    apply: impl FnOnce(&mut Ledger) -> Result<T, EscrowError>,
) -> Result<T> {
    let before = ledger.last_event_sequence();
    let value = apply(ledger)?;
    let report = ledger.verify_custody()?;
    println!(
        "{name}: custody holds {} ETH",
        report.custody_balance.format_ether()
    );
    print_events(ledger.events_since(before));
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_returns_each_deposit_to_its_owner() {
        let outcome = replay(false).unwrap();
        assert_eq!(outcome.order, OrderId::FIRST);
        assert_eq!(outcome.seller_delta, 0);
        assert_eq!(outcome.buyer_delta, 0);
        assert_eq!(outcome.events, 4);
    }

    #[test]
    fn refund_restores_both_parties() {
        let outcome = replay(true).unwrap();
        assert_eq!(outcome.seller_delta, 0);
        assert_eq!(outcome.buyer_delta, 0);
        assert_eq!(outcome.events, 4);
    }

    #[test]
    fn scenario_command_exits_zero() {
        assert_eq!(run_scenario(&ScenarioArgs { refund: false }).unwrap(), 0);
    }
}
