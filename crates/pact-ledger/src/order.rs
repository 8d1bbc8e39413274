//! # Orders
//!
//! The order record and its lifecycle status.
//!
//! ## Status machine
//!
//! `Created → Locked → Release → Inactive`, with the cancellation bypass
//! `Locked → Inactive`. `Inactive` is terminal. There are no cycles, so a
//! status never revisits an earlier one.
//!
//! ## Custody accounting
//!
//! `held` is the value still in custody for the order:
//!
//! | Status   | `held`                                   |
//! |----------|------------------------------------------|
//! | Created  | `seller_deposit`                         |
//! | Locked   | `seller_deposit + buyer_deposit`         |
//! | Release  | `seller_deposit`                         |
//! | Inactive | `0`, or `seller_deposit` when retained   |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pact_core::{Address, Amount, OrderId};

/// Deposits are this multiple of the nominal price, for both parties.
pub const DEPOSIT_MULTIPLIER: u128 = 2;

// ── Status ──────────────────────────────────────────────────────────────

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Seller has posted collateral; awaiting a buyer.
    Created,
    /// Buyer has posted matching collateral; goods in transit.
    Locked,
    /// Buyer confirmed receipt; seller's deposit awaits release.
    Release,
    /// Settled or cancelled. Terminal.
    Inactive,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [OrderStatus; 4] = [
        Self::Created,
        Self::Locked,
        Self::Release,
        Self::Inactive,
    ];

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Inactive)
    }

    /// Statuses reachable in one step.
    pub fn valid_transitions(&self) -> &'static [OrderStatus] {
        match self {
            Self::Created => &[Self::Locked],
            Self::Locked => &[Self::Release, Self::Inactive],
            Self::Release => &[Self::Inactive],
            Self::Inactive => &[],
        }
    }

    /// Whether `to` is reachable in one step.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Stable numeric code (`Created = 0` … `Inactive = 3`).
    pub fn code(&self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Locked => 1,
            Self::Release => 2,
            Self::Inactive => 3,
        }
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Locked => "LOCKED",
            Self::Release => "RELEASE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| format!("unknown order status \"{s}\""))
    }
}

// ── Operations ──────────────────────────────────────────────────────────

/// The five mutating operations, used for error context and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Seller opens an order.
    CreateOrder,
    /// Buyer locks matching collateral.
    ConfirmPurchase,
    /// Buyer attests receipt of the goods.
    ConfirmReceived,
    /// Seller collects their deposit after receipt.
    ReleaseSellerDeposit,
    /// Cancellation before receipt.
    RefundBuyer,
}

impl Operation {
    /// The status an order must be in for this operation, if any.
    pub fn required_status(&self) -> Option<OrderStatus> {
        match self {
            Self::CreateOrder => None,
            Self::ConfirmPurchase => Some(OrderStatus::Created),
            Self::ConfirmReceived | Self::RefundBuyer => Some(OrderStatus::Locked),
            Self::ReleaseSellerDeposit => Some(OrderStatus::Release),
        }
    }

    /// The status a successful call leaves the order in.
    pub fn target_status(&self) -> OrderStatus {
        match self {
            Self::CreateOrder => OrderStatus::Created,
            Self::ConfirmPurchase => OrderStatus::Locked,
            Self::ConfirmReceived => OrderStatus::Release,
            Self::ReleaseSellerDeposit | Self::RefundBuyer => OrderStatus::Inactive,
        }
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateOrder => "create_order",
            Self::ConfirmPurchase => "confirm_purchase",
            Self::ConfirmReceived => "confirm_received",
            Self::ReleaseSellerDeposit => "release_seller_deposit",
            Self::RefundBuyer => "refund_buyer",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Order ───────────────────────────────────────────────────────────────

/// One escrow transaction between a seller and a buyer.
///
/// Orders are owned by the [`EscrowLedger`](crate::EscrowLedger) and handed
/// out by shared reference, so nothing outside the ledger can mutate one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Sequential identifier, assigned at creation.
    pub id: OrderId,
    /// Seller-supplied description of the goods. Opaque.
    pub description: String,
    /// Nominal price; the basis for both deposits.
    pub amount: Amount,
    /// Creating caller.
    pub seller: Address,
    /// Collateral the seller locked at creation.
    pub seller_deposit: Amount,
    /// Confirming caller, once the purchase is confirmed.
    pub buyer: Option<Address>,
    /// Collateral the buyer locked; zero until confirmed.
    pub buyer_deposit: Amount,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Value still in custody for this order.
    pub held: Amount,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order last changed.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Deposit each party must lock for a given price.
    ///
    /// Returns `None` if the doubled price overflows.
    pub fn required_deposit_for(amount: Amount) -> Option<Amount> {
        amount.checked_mul(DEPOSIT_MULTIPLIER)
    }

    /// Whether `address` is the seller or the buyer of this order.
    pub fn is_party(&self, address: &Address) -> bool {
        &self.seller == address || self.buyer.as_ref() == Some(address)
    }

    /// Whether the order is in its terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `to` and stamp `updated_at`.
    ///
    /// Callers check the edge with [`OrderStatus::can_transition_to`]
    /// before moving any value.
    pub(crate) fn advance(&mut self, to: OrderStatus) {
        debug_assert!(
            self.status.can_transition_to(to),
            "order {}: {} -> {} is not a lifecycle edge",
            self.id,
            self.status,
            to
        );
        self.status = to;
        self.updated_at = Utc::now();
    }

    /// Check the structural invariants that hold for every reachable order.
    ///
    /// Used when restoring a snapshot; a ledger only ever produces orders
    /// that pass.
    pub fn check_invariants(&self) -> Result<(), String> {
        let required = Self::required_deposit_for(self.amount)
            .ok_or_else(|| format!("order {}: deposit for amount {} overflows", self.id, self.amount))?;
        if self.amount.is_zero() {
            return Err(format!("order {}: amount is zero", self.id));
        }
        if self.seller_deposit != required {
            return Err(format!(
                "order {}: seller deposit {} is not {} x amount",
                self.id, self.seller_deposit, DEPOSIT_MULTIPLIER
            ));
        }

        let both = self
            .seller_deposit
            .checked_add(self.buyer_deposit)
            .ok_or_else(|| format!("order {}: deposits overflow", self.id))?;
        let held_ok = match self.status {
            OrderStatus::Created => {
                self.buyer.is_none()
                    && self.buyer_deposit.is_zero()
                    && self.held == self.seller_deposit
            }
            OrderStatus::Locked => self.has_buyer_deposit(required) && self.held == both,
            OrderStatus::Release => {
                self.has_buyer_deposit(required) && self.held == self.seller_deposit
            }
            OrderStatus::Inactive => {
                self.has_buyer_deposit(required)
                    && (self.held.is_zero() || self.held == self.seller_deposit)
            }
        };
        if !held_ok {
            return Err(format!(
                "order {}: buyer/custody fields inconsistent with status {}",
                self.id, self.status
            ));
        }
        if self.updated_at < self.created_at {
            return Err(format!("order {}: updated before it was created", self.id));
        }
        Ok(())
    }

    fn has_buyer_deposit(&self, required: Amount) -> bool {
        self.buyer.is_some() && self.buyer_deposit == required
    }
}
