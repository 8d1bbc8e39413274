//! # Snapshots
//!
//! A [`LedgerSnapshot`] is the complete serializable state of an
//! [`EscrowLedger`]. The CLI persists one as its state file.
//!
//! Restoring never trusts the input: ids, per-order invariants, the event
//! sequence and the custody audit are all re-checked, and any violation is
//! an [`EscrowError::Snapshot`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pact_core::{Address, OrderId};

use crate::custody::ValueLedger;
use crate::error::EscrowError;
use crate::event::EventLog;
use crate::ledger::EscrowLedger;
use crate::order::Order;
use crate::policy::EscrowPolicy;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot<V> {
    /// Format version; must equal [`SNAPSHOT_VERSION`].
    pub version: u32,
    /// The escrow's account in `bank`.
    pub custody_account: Address,
    /// Escrow rules.
    pub policy: EscrowPolicy,
    /// Next id to assign.
    pub next_id: OrderId,
    /// Orders in id order.
    pub orders: Vec<Order>,
    /// Notification log.
    pub events: EventLog,
    /// Value ledger state.
    pub bank: V,
}

impl<V: ValueLedger + Clone> EscrowLedger<V> {
    /// Capture the full ledger state.
    pub fn snapshot(&self) -> LedgerSnapshot<V> {
        LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            custody_account: self.custody.clone(),
            policy: self.policy,
            next_id: self.next_id,
            orders: self.orders.values().cloned().collect(),
            events: self.events.clone(),
            bank: self.bank.clone(),
        }
    }
}

impl<V: ValueLedger> EscrowLedger<V> {
    /// Rebuild a ledger from a snapshot, re-validating its invariants.
    pub fn from_snapshot(snapshot: LedgerSnapshot<V>) -> Result<Self, EscrowError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(EscrowError::Snapshot(format!(
                "unsupported version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }

        let mut orders = BTreeMap::new();
        for order in snapshot.orders {
            if order.id >= snapshot.next_id {
                return Err(EscrowError::Snapshot(format!(
                    "order {} is not below next id {}",
                    order.id, snapshot.next_id
                )));
            }
            order.check_invariants().map_err(EscrowError::Snapshot)?;
            if order.seller == snapshot.custody_account
                || order.buyer.as_ref() == Some(&snapshot.custody_account)
            {
                return Err(EscrowError::Snapshot(format!(
                    "order {} names the custody account as a party",
                    order.id
                )));
            }
            let id = order.id;
            if orders.insert(id, order).is_some() {
                return Err(EscrowError::Snapshot(format!("duplicate order {id}")));
            }
        }
        snapshot
            .events
            .check_contiguous()
            .map_err(EscrowError::Snapshot)?;
        if let Some(record) = snapshot
            .events
            .records()
            .iter()
            .find(|r| !orders.contains_key(&r.event.order_id()))
        {
            return Err(EscrowError::Snapshot(format!(
                "event {} refers to unknown order {}",
                record.sequence,
                record.event.order_id()
            )));
        }

        let ledger = Self {
            orders,
            next_id: snapshot.next_id,
            custody: snapshot.custody_account,
            policy: snapshot.policy,
            events: snapshot.events,
            bank: snapshot.bank,
        };
        ledger
            .verify_custody()
            .map_err(|e| EscrowError::Snapshot(e.to_string()))?;
        tracing::debug!(
            orders = ledger.order_count(),
            events = ledger.last_event_sequence(),
            "restored ledger from snapshot"
        );
        Ok(ledger)
    }
}
