//! # Notifications
//!
//! The ledger emits one [`EscrowEvent`] per completed transition (two for a
//! refund that also returns the seller's deposit). Events are appended to an
//! [`EventLog`] with a sequence number starting at 1, so a reader can poll
//! with [`EventLog::since`] and never miss or repeat a notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pact_core::{Address, Amount, OrderId};

/// A notification emitted after a successful transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EscrowEvent {
    /// A seller opened an order and locked their deposit.
    OrderCreated {
        /// The new order.
        id: OrderId,
        /// Seller-supplied description.
        description: String,
        /// Nominal price.
        amount: Amount,
        /// Locked seller collateral.
        seller_deposit: Amount,
    },
    /// A buyer locked matching collateral.
    PurchaseConfirmed {
        /// The order.
        id: OrderId,
        /// The confirming caller.
        buyer: Address,
        /// Locked buyer collateral.
        buyer_deposit: Amount,
    },
    /// The buyer's deposit was paid back, on receipt or on cancellation.
    BuyerRefunded {
        /// The order.
        id: OrderId,
        /// Value paid to the buyer.
        buyer_deposit: Amount,
    },
    /// The seller's deposit was paid back.
    SellerDepositReleased {
        /// The order.
        id: OrderId,
        /// Value paid to the seller.
        seller_deposit: Amount,
    },
}

impl EscrowEvent {
    /// The event name, as used in logs and the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OrderCreated { .. } => "OrderCreated",
            Self::PurchaseConfirmed { .. } => "PurchaseConfirmed",
            Self::BuyerRefunded { .. } => "BuyerRefunded",
            Self::SellerDepositReleased { .. } => "SellerDepositReleased",
        }
    }

    /// The order the event concerns.
    pub fn order_id(&self) -> OrderId {
        match self {
            Self::OrderCreated { id, .. }
            | Self::PurchaseConfirmed { id, .. }
            | Self::BuyerRefunded { id, .. }
            | Self::SellerDepositReleased { id, .. } => *id,
        }
    }
}

impl std::fmt::Display for EscrowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrderCreated {
                id,
                description,
                amount,
                seller_deposit,
            } => write!(
                f,
                "OrderCreated({id}, {description:?}, {amount}, {seller_deposit})"
            ),
            Self::PurchaseConfirmed {
                id,
                buyer,
                buyer_deposit,
            } => write!(f, "PurchaseConfirmed({id}, {buyer}, {buyer_deposit})"),
            Self::BuyerRefunded { id, buyer_deposit } => {
                write!(f, "BuyerRefunded({id}, {buyer_deposit})")
            }
            Self::SellerDepositReleased { id, seller_deposit } => {
                write!(f, "SellerDepositReleased({id}, {seller_deposit})")
            }
        }
    }
}

/// An event with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// 1-based, contiguous.
    pub sequence: u64,
    /// When the event was appended.
    pub emitted_at: DateTime<Utc>,
    /// The notification.
    pub event: EscrowEvent,
}

/// Append-only notification log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, assigning the next sequence number.
    pub fn push(&mut self, event: EscrowEvent) -> &EventRecord {
        let sequence = self.last_sequence() + 1;
        self.records.push(EventRecord {
            sequence,
            emitted_at: Utc::now(),
            event,
        });
        &self.records[self.records.len() - 1]
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with a sequence strictly greater than `sequence`.
    pub fn since(&self, sequence: u64) -> &[EventRecord] {
        let start = usize::try_from(sequence)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    /// Sequence of the newest record; 0 when empty.
    pub fn last_sequence(&self) -> u64 {
        self.records.last().map_or(0, |r| r.sequence)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check that sequences run 1, 2, 3, … with no gaps.
    pub fn check_contiguous(&self) -> Result<(), String> {
        for (index, record) in self.records.iter().enumerate() {
            let expected = index as u64 + 1;
            if record.sequence != expected {
                return Err(format!(
                    "event log out of sequence: expected {expected}, found {}",
                    record.sequence
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refunded(id: u64) -> EscrowEvent {
        EscrowEvent::BuyerRefunded {
            id: OrderId::new(id).unwrap(),
            buyer_deposit: Amount::from_wei(2),
        }
    }

    #[test]
    fn order_created_display() {
        let event = EscrowEvent::OrderCreated {
            id: OrderId::FIRST,
            description: "A bag of rice".to_string(),
            amount: Amount::from_wei(1),
            seller_deposit: Amount::from_wei(2),
        };
        assert_eq!(event.to_string(), "OrderCreated(1, \"A bag of rice\", 1, 2)");
        assert_eq!(event.name(), "OrderCreated");
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let json = serde_json::to_value(refunded(3)).unwrap();
        assert_eq!(json["type"], "BuyerRefunded");
        assert_eq!(json["id"], 3);
        assert_eq!(json["buyer_deposit"], "2");
    }

    #[test]
    fn sequences_start_at_one() {
        let mut log = EventLog::new();
        assert_eq!(log.last_sequence(), 0);
        assert_eq!(log.push(refunded(1)).sequence, 1);
        assert_eq!(log.push(refunded(2)).sequence, 2);
        assert_eq!(log.len(), 2);
        assert!(log.check_contiguous().is_ok());
    }

    #[test]
    fn since_returns_newer_records() {
        let mut log = EventLog::new();
        for id in 1..=3 {
            log.push(refunded(id));
        }
        assert_eq!(log.since(0).len(), 3);
        assert_eq!(log.since(2).len(), 1);
        assert_eq!(log.since(2)[0].sequence, 3);
        assert!(log.since(3).is_empty());
        assert!(log.since(u64::MAX).is_empty());
    }

    #[test]
    fn gap_is_detected() {
        let mut log = EventLog::new();
        log.push(refunded(1));
        log.push(refunded(2));
        let mut json = serde_json::to_value(&log).unwrap();
        json[1]["sequence"] = serde_json::json!(5);
        let broken: EventLog = serde_json::from_value(json).unwrap();
        assert!(broken.check_contiguous().is_err());
    }

    #[test]
    fn order_id_accessor() {
        assert_eq!(refunded(4).order_id().get(), 4);
    }
}
