//! # Order Subcommands
//!
//! The five lifecycle operations plus `order` and `orders` for inspection.
//! Mutations load the state file, apply one ledger operation, print the
//! notifications it emitted, and save. Rejections leave the file as it was.

use anyhow::{anyhow, Result};
use clap::Args;

use pact_core::{Address, Amount, OrderId};
use pact_ledger::{EventRecord, Order, OrderStatus};

use crate::store::{self, Ledger};
use crate::{parse_amount, print_events, Workspace};

/// Arguments for `pact create-order`.
#[derive(Args, Debug)]
pub struct CreateOrderArgs {
    /// Seller account.
    #[arg(long)]
    pub from: Address,
    /// Free-form description of the goods.
    #[arg(long)]
    pub description: String,
    /// Price (wei, or ether with an `eth` suffix).
    #[arg(long, value_parser = parse_amount)]
    pub amount: Amount,
    /// Seller deposit. Defaults to twice the price.
    #[arg(long, value_parser = parse_amount)]
    pub deposit: Option<Amount>,
}

/// Arguments for `pact confirm-purchase`.
#[derive(Args, Debug)]
pub struct ConfirmPurchaseArgs {
    /// Buyer account.
    #[arg(long)]
    pub from: Address,
    /// Order to buy.
    #[arg(long)]
    pub order: OrderId,
    /// Buyer deposit. Defaults to the seller's deposit.
    #[arg(long, value_parser = parse_amount)]
    pub deposit: Option<Amount>,
}

/// Arguments shared by `confirm-received`, `release` and `refund`.
#[derive(Args, Debug)]
pub struct TransitionArgs {
    /// Calling account.
    #[arg(long)]
    pub from: Address,
    /// Target order.
    #[arg(long)]
    pub order: OrderId,
}

/// Arguments for `pact order`.
#[derive(Args, Debug)]
pub struct ShowOrderArgs {
    /// Order id.
    pub id: OrderId,
}

/// Arguments for `pact orders`.
#[derive(Args, Debug)]
pub struct ListOrdersArgs {
    /// Only orders in this status (CREATED, LOCKED, RELEASE, INACTIVE).
    #[arg(long)]
    pub status: Option<OrderStatus>,
    /// Only orders where this account is the seller or buyer.
    #[arg(long)]
    pub party: Option<Address>,
}

/// Execute `pact create-order`.
pub fn run_create_order(args: &CreateOrderArgs, ws: &Workspace) -> Result<u8> {
    let deposit = match args.deposit {
        Some(deposit) => deposit,
        None => Order::required_deposit_for(args.amount)
            .ok_or_else(|| anyhow!("amount {} is too large to secure", args.amount))?,
    };
    let (id, events) = store::update(&ws.state_file, |ledger| {
        let before = ledger.last_event_sequence();
        let id = ledger.create_order(&args.from, args.description.clone(), args.amount, deposit)?;
        Ok((id, ledger.events_since(before).to_vec()))
    })?;
    println!("OK: order {id} created by {}", args.from);
    print_events(&events);
    Ok(0)
}

/// Execute `pact confirm-purchase`.
pub fn run_confirm_purchase(args: &ConfirmPurchaseArgs, ws: &Workspace) -> Result<u8> {
    let events = store::update(&ws.state_file, |ledger| {
        let deposit = match args.deposit {
            Some(deposit) => deposit,
            None => ledger.order(args.order)?.seller_deposit,
        };
        let before = ledger.last_event_sequence();
        ledger.confirm_purchase(&args.from, args.order, deposit)?;
        Ok(ledger.events_since(before).to_vec())
    })?;
    println!("OK: order {} locked by buyer {}", args.order, args.from);
    print_events(&events);
    Ok(0)
}

/// Execute `pact confirm-received`.
pub fn run_confirm_received(args: &TransitionArgs, ws: &Workspace) -> Result<u8> {
    let events = transition(ws, |ledger| ledger.confirm_received(&args.from, args.order))?;
    println!("OK: order {} received by {}", args.order, args.from);
    print_events(&events);
    Ok(0)
}

/// Execute `pact release`.
pub fn run_release(args: &TransitionArgs, ws: &Workspace) -> Result<u8> {
    let events = transition(ws, |ledger| {
        ledger.release_seller_deposit(&args.from, args.order)
    })?;
    println!("OK: seller deposit for order {} released", args.order);
    print_events(&events);
    Ok(0)
}

/// Execute `pact refund`.
pub fn run_refund(args: &TransitionArgs, ws: &Workspace) -> Result<u8> {
    let events = transition(ws, |ledger| ledger.refund_buyer(&args.from, args.order))?;
    println!("OK: order {} cancelled, buyer refunded", args.order);
    print_events(&events);
    Ok(0)
}

/// Execute `pact order <id>`.
pub fn run_show_order(args: &ShowOrderArgs, ws: &Workspace) -> Result<u8> {
    let ledger = store::load(&ws.state_file)?;
    let order = ledger.order(args.id)?;
    println!("{}", serde_json::to_string_pretty(order)?);
    Ok(0)
}

/// Execute `pact orders`.
pub fn run_list_orders(args: &ListOrdersArgs, ws: &Workspace) -> Result<u8> {
    let ledger = store::load(&ws.state_file)?;
    let selected: Vec<&Order> = ledger
        .orders_matching(args.status, args.party.as_ref())
        .collect();

    if selected.is_empty() {
        println!("No orders.");
        return Ok(0);
    }
    println!(
        "{:>4}  {:<9}  {:>10}  {:>10}  DESCRIPTION",
        "ID", "STATUS", "PRICE", "HELD"
    );
    for order in selected {
        println!(
            "{:>4}  {:<9}  {:>10}  {:>10}  {}",
            order.id.get(),
            order.status.as_str(),
            order.amount.format_ether(),
            order.held.format_ether(),
            order.description
        );
    }
    Ok(0)
}

fn transition(
    ws: &Workspace,
    apply: impl FnOnce(&mut Ledger) -> Result<(), pact_ledger::EscrowError>,
) -> Result<Vec<EventRecord>> {
    store::update(&ws.state_file, |ledger| {
        let before = ledger.last_event_sequence();
        apply(ledger)?;
        Ok(ledger.events_since(before).to_vec())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{run_deploy, DeployArgs};
    use pact_ledger::{ErrorKind, EscrowError};

    const SELLER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
    const BUYER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn id(n: u64) -> OrderId {
        OrderId::new(n).unwrap()
    }

    fn deployed() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("pact.yaml");
        std::fs::write(
            &config,
            format!(
                "genesis:\n  - address: \"{SELLER}\"\n    balance: \"100\"\n  - address: \"{BUYER}\"\n    balance: \"100\"\n"
            ),
        )
        .unwrap();
        let ws = Workspace {
            state_file: dir.path().join("ledger.json"),
            config: Some(config),
        };
        run_deploy(&DeployArgs { force: false }, &ws).unwrap();
        (dir, ws)
    }

    fn create(ws: &Workspace) {
        let args = CreateOrderArgs {
            from: addr(SELLER),
            description: "A bag of rice".into(),
            amount: Amount::from_wei(1),
            deposit: None,
        };
        assert_eq!(run_create_order(&args, ws).unwrap(), 0);
    }

    fn lock(ws: &Workspace) {
        let args = ConfirmPurchaseArgs {
            from: addr(BUYER),
            order: id(1),
            deposit: None,
        };
        assert_eq!(run_confirm_purchase(&args, ws).unwrap(), 0);
    }

    fn load(ws: &Workspace) -> Ledger {
        store::load(&ws.state_file).unwrap()
    }

    #[test]
    fn create_order_defaults_deposit_to_twice_price() {
        let (_dir, ws) = deployed();
        create(&ws);
        let ledger = load(&ws);
        let order = ledger.order(id(1)).unwrap();
        assert_eq!(order.seller_deposit, Amount::from_wei(2));
        assert_eq!(ledger.balance_of(&addr(SELLER)), Amount::from_wei(98));
    }

    #[test]
    fn full_purchase_through_state_file() {
        let (_dir, ws) = deployed();
        create(&ws);
        lock(&ws);
        let tx = |from: &str| TransitionArgs {
            from: addr(from),
            order: id(1),
        };
        run_confirm_received(&tx(BUYER), &ws).unwrap();
        run_release(&tx(SELLER), &ws).unwrap();

        let ledger = load(&ws);
        assert_eq!(ledger.order(id(1)).unwrap().status, OrderStatus::Inactive);
        assert_eq!(ledger.balance_of(&addr(SELLER)), Amount::from_wei(100));
        assert_eq!(ledger.balance_of(&addr(BUYER)), Amount::from_wei(100));
        assert_eq!(ledger.events().len(), 4);
        ledger.verify_custody().unwrap();
    }

    #[test]
    fn refund_returns_both_deposits() {
        let (_dir, ws) = deployed();
        create(&ws);
        lock(&ws);
        run_refund(
            &TransitionArgs {
                from: addr(SELLER),
                order: id(1),
            },
            &ws,
        )
        .unwrap();
        let ledger = load(&ws);
        assert_eq!(ledger.balance_of(&addr(SELLER)), Amount::from_wei(100));
        assert_eq!(ledger.balance_of(&addr(BUYER)), Amount::from_wei(100));
    }

    #[test]
    fn rejected_operation_reports_ledger_error() {
        let (_dir, ws) = deployed();
        create(&ws);
        let err = run_release(
            &TransitionArgs {
                from: addr(SELLER),
                order: id(1),
            },
            &ws,
        )
        .unwrap_err();
        let escrow = err.downcast_ref::<EscrowError>().unwrap();
        assert_eq!(escrow.kind(), ErrorKind::InvalidState);
        assert_eq!(load(&ws).order(id(1)).unwrap().status, OrderStatus::Created);
    }

    #[test]
    fn confirm_purchase_on_missing_order_fails() {
        let (_dir, ws) = deployed();
        let args = ConfirmPurchaseArgs {
            from: addr(BUYER),
            order: id(7),
            deposit: None,
        };
        let err = run_confirm_purchase(&args, &ws).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EscrowError>().unwrap().kind(),
            ErrorKind::OrderNotFound
        );
    }

    #[test]
    fn inspection_commands_succeed() {
        let (_dir, ws) = deployed();
        create(&ws);
        assert_eq!(run_show_order(&ShowOrderArgs { id: id(1) }, &ws).unwrap(), 0);
        assert!(run_show_order(&ShowOrderArgs { id: id(2) }, &ws).is_err());
        let list = ListOrdersArgs {
            status: Some(OrderStatus::Created),
            party: Some(addr(SELLER)),
        };
        assert_eq!(run_list_orders(&list, &ws).unwrap(), 0);
    }
}
