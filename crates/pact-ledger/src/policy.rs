//! # Escrow Policy
//!
//! Three knobs the bare lifecycle leaves open: who may release the seller's
//! deposit, who may cancel a locked order, and where the seller's deposit
//! goes when an order is cancelled.

use serde::{Deserialize, Serialize};

/// Who may invoke a policy-gated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    /// Any caller.
    Anyone,
    /// Only the order's seller.
    SellerOnly,
}

impl Authority {
    /// Whether `is_seller` satisfies this authority.
    pub fn permits(&self, is_seller: bool) -> bool {
        match self {
            Self::Anyone => true,
            Self::SellerOnly => is_seller,
        }
    }

    /// The configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anyone => "anyone",
            Self::SellerOnly => "seller_only",
        }
    }
}

/// Fate of the seller's deposit when `refund_buyer` cancels an order.
///
/// The default returns it, so a default cancellation emits two
/// notifications: `BuyerRefunded` then `SellerDepositReleased`. Under
/// `RetainInCustody` only `BuyerRefunded` is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicy {
    /// Pay it back to the seller in the same call.
    #[default]
    ReturnToSeller,
    /// Leave it in custody; the order stays `Inactive` with `held` equal to
    /// the seller deposit.
    RetainInCustody,
}

impl CancellationPolicy {
    /// The configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReturnToSeller => "return_to_seller",
            Self::RetainInCustody => "retain_in_custody",
        }
    }
}

/// Escrow rules fixed for the lifetime of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowPolicy {
    /// Who may call `release_seller_deposit`.
    #[serde(default = "default_release_authority")]
    pub release_authority: Authority,
    /// Who may call `refund_buyer`.
    #[serde(default = "default_refund_authority")]
    pub refund_authority: Authority,
    /// Seller deposit handling on cancellation.
    #[serde(default)]
    pub cancellation: CancellationPolicy,
}

fn default_release_authority() -> Authority {
    Authority::SellerOnly
}

fn default_refund_authority() -> Authority {
    Authority::Anyone
}

impl Default for EscrowPolicy {
    fn default() -> Self {
        Self {
            release_authority: default_release_authority(),
            refund_authority: default_refund_authority(),
            cancellation: CancellationPolicy::default(),
        }
    }
}
