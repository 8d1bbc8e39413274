//! # API Route Modules
//!
//! - `orders` — the order lifecycle: create, confirm purchase, confirm
//!   receipt, release the seller's deposit, refund the buyer, and reads.
//! - `events` — the notification feed, pollable by sequence number.
//! - `accounts` — value-ledger balances and the custody audit.

pub mod accounts;
pub mod events;
pub mod orders;
