//! # pact-ledger — Two-Party Purchase Escrow
//!
//! A seller posts collateral, a buyer posts matching collateral, and value
//! leaves custody only as both parties move the order through its lifecycle:
//!
//! ```text
//! Created ──confirm_purchase──▶ Locked ──confirm_received──▶ Release ──release_seller_deposit──▶ Inactive
//!                                  │                                                              ▲
//!                                  └──────────────────────── refund_buyer ────────────────────────┘
//! ```
//!
//! - **Orders** ([`order`]): the order record and its status machine.
//! - **Ledger** ([`ledger`]): the owned order map and the five operations.
//! - **Custody** ([`custody`]): the [`ValueLedger`] capability the escrow is
//!   injected with, and the in-memory [`InMemoryBank`] implementation.
//! - **Events** ([`event`]): notifications emitted on each transition.
//! - **Policy** ([`policy`]): who may release, who may cancel, and where the
//!   seller's deposit goes on cancellation.
//! - **Config** ([`config`]): YAML deployment configuration (policy + genesis).
//! - **Snapshots** ([`snapshot`]): serializable ledger state with invariant
//!   checks on restore.
//!
//! ## Atomicity
//!
//! Every operation checks all of its preconditions before touching the value
//! ledger, and multi-leg payouts are applied as a batch that is rolled back on
//! failure. A rejected call leaves orders, balances, and the event log exactly
//! as they were.

pub mod config;
pub mod custody;
pub mod error;
pub mod event;
pub mod ledger;
pub mod order;
pub mod policy;
pub mod snapshot;

// Re-export primary types.
pub use config::{ConfigError, GenesisAllocation, LedgerConfig};
pub use custody::{CustodyError, CustodyReport, InMemoryBank, Transfer, ValueLedger};
pub use error::{ErrorKind, EscrowError};
pub use event::{EscrowEvent, EventLog, EventRecord};
pub use ledger::EscrowLedger;
pub use order::{Operation, Order, OrderStatus};
pub use policy::{Authority, CancellationPolicy, EscrowPolicy};
pub use snapshot::LedgerSnapshot;
