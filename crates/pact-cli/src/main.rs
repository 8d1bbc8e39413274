//! # pact CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pact_cli::accounts::{run_audit, run_balance, run_fund, BalanceArgs, FundArgs};
use pact_cli::deploy::{run_deploy, DeployArgs};
use pact_cli::events::{run_events, EventsArgs};
use pact_cli::orders::{
    run_confirm_purchase, run_confirm_received, run_create_order, run_list_orders, run_refund,
    run_release, run_show_order, ConfirmPurchaseArgs, CreateOrderArgs, ListOrdersArgs,
    ShowOrderArgs, TransitionArgs,
};
use pact_cli::scenario::{run_scenario, ScenarioArgs};
use pact_cli::{Workspace, DEFAULT_STATE_FILE};

/// Pact: two-party purchase escrow ledger.
///
/// Seller and buyer each lock a deposit of twice the price; each deposit is
/// paid back to its owner once the buyer confirms receipt, or on cancellation.
#[derive(Parser, Debug)]
#[command(name = "pact", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the ledger configuration (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger state file.
    #[arg(long, global = true, default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a fresh ledger state file.
    Deploy(DeployArgs),

    /// Mint value into an account.
    Fund(FundArgs),

    /// Seller opens an order, locking their deposit.
    CreateOrder(CreateOrderArgs),

    /// Buyer locks a matching deposit.
    ConfirmPurchase(ConfirmPurchaseArgs),

    /// Buyer confirms the goods arrived.
    ConfirmReceived(TransitionArgs),

    /// Seller collects their deposit after receipt.
    Release(TransitionArgs),

    /// Cancel a locked order, refunding the buyer.
    Refund(TransitionArgs),

    /// Show one order.
    Order(ShowOrderArgs),

    /// List orders.
    Orders(ListOrdersArgs),

    /// Print the notification log.
    Events(EventsArgs),

    /// Show an account balance.
    Balance(BalanceArgs),

    /// Reconcile custody against open orders.
    Audit,

    /// Replay the reference purchase in memory.
    Scenario(ScenarioArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let ws = Workspace {
        state_file: cli.state,
        config: cli.config,
    };
    tracing::debug!(state = %ws.state_file.display(), "pact CLI starting");

    let result = match cli.command {
        Commands::Deploy(args) => run_deploy(&args, &ws),
        Commands::Fund(args) => run_fund(&args, &ws),
        Commands::CreateOrder(args) => run_create_order(&args, &ws),
        Commands::ConfirmPurchase(args) => run_confirm_purchase(&args, &ws),
        Commands::ConfirmReceived(args) => run_confirm_received(&args, &ws),
        Commands::Release(args) => run_release(&args, &ws),
        Commands::Refund(args) => run_refund(&args, &ws),
        Commands::Order(args) => run_show_order(&args, &ws),
        Commands::Orders(args) => run_list_orders(&args, &ws),
        Commands::Events(args) => run_events(&args, &ws),
        Commands::Balance(args) => run_balance(&args, &ws),
        Commands::Audit => run_audit(&ws),
        Commands::Scenario(args) => run_scenario(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
