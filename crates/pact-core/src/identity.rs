//! # Identity Newtypes
//!
//! [`Address`] identifies a caller (seller, buyer, or the escrow's own
//! custody account) and [`OrderId`] identifies one escrow order. Both
//! validate at construction, so a value of either type is always well formed.
//!
//! ## Address format
//!
//! `0x` followed by 40 hexadecimal characters (20 bytes). Input is accepted
//! in any case and normalized to lowercase, so two spellings of the same
//! address compare equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte caller address rendered as lowercase `0x`-prefixed hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Number of hex characters after the `0x` prefix.
    pub const HEX_LEN: usize = 40;

    /// Parse an address, validating and normalizing it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAddress`] if the string is not
    /// `0x` followed by exactly 40 hex characters.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = value.as_ref().trim();
        let hex = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| ValidationError::InvalidAddress(raw.to_string()))?;
        if hex.len() != Self::HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    /// Build an address whose low 8 bytes hold `n` (big-endian), the rest zero.
    ///
    /// Handy for deterministic well-known accounts such as the custody
    /// account or development signers.
    pub fn from_low_u64_be(n: u64) -> Self {
        Self(format!("0x{n:040x}"))
    }

    /// Access the normalized address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Sequential order identifier. Assigned from 1 upward; never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct OrderId(u64);

impl OrderId {
    /// The first identifier a ledger assigns.
    pub const FIRST: OrderId = OrderId(1);

    /// Wrap a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroOrderId`] for `0`.
    pub fn new(value: u64) -> Result<Self, ValidationError> {
        if value == 0 {
            return Err(ValidationError::ZeroOrderId);
        }
        Ok(Self(value))
    }

    /// The raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The identifier that follows this one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Overflow`] at `u64::MAX`.
    pub fn next(&self) -> Result<Self, ValidationError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(ValidationError::Overflow("order id allocation"))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<u64>().map_err(|e| ValidationError::InvalidAmount {
            value: s.to_string(),
            reason: format!("order id must be a positive integer: {e}"),
        })?;
        Self::new(value)
    }
}

impl TryFrom<u64> for OrderId {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OrderId> for u64 {
    fn from(value: OrderId) -> Self {
        value.0
    }
}
