//! # Value Amounts
//!
//! [`Amount`] is a non-negative quantity of the settlement unit, counted in
//! its smallest denomination (wei). Arithmetic is checked everywhere: an
//! overflow or underflow is a `None`, never a wrap.
//!
//! Amounts serialize as decimal strings so that values above 2^53 survive
//! JSON consumers that read numbers as doubles. Deserialization also accepts
//! a bare JSON integer for convenience.
//!
//! Human input may be given in ether with an `eth`/`ether` suffix
//! (`"1.5eth"`, `"2 ether"`), see [`Amount::parse_units`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Number of wei in one ether.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

const ETHER_DECIMALS: usize = 18;

/// A quantity of value in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Amount(u128);

impl Amount {
    /// Zero value.
    pub const ZERO: Amount = Amount(0);

    /// Construct from a raw wei count.
    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    /// Construct from a whole number of ether.
    ///
    /// Returns `None` if the result does not fit in `u128`.
    pub fn from_whole_ether(ether: u64) -> Option<Self> {
        u128::from(ether).checked_mul(WEI_PER_ETHER).map(Self)
    }

    /// The raw wei count.
    pub const fn as_wei(&self) -> u128 {
        self.0
    }

    /// Whether this amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Checked subtraction; `None` if `rhs` exceeds `self`.
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Checked multiplication by a scalar.
    pub fn checked_mul(self, factor: u128) -> Option<Amount> {
        self.0.checked_mul(factor).map(Self)
    }

    /// Parse a decimal ether value such as `"1"`, `"0.25"` or `"1.000000000000000001"`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAmount`] for malformed text or more
    /// than 18 fractional digits, and [`ValidationError::Overflow`] if the
    /// value does not fit.
    pub fn from_ether(text: &str) -> Result<Self, ValidationError> {
        let s = text.trim();
        let invalid = |reason: &str| ValidationError::InvalidAmount {
            value: text.to_string(),
            reason: reason.to_string(),
        };

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty value"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("expected a non-negative decimal number"));
        }
        if frac.len() > ETHER_DECIMALS {
            return Err(invalid("more than 18 fractional digits"));
        }

        let whole_wei = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u128>()
                .map_err(|_| ValidationError::Overflow("ether parsing"))?
                .checked_mul(WEI_PER_ETHER)
                .ok_or(ValidationError::Overflow("ether parsing"))?
        };
        let frac_wei = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<width$}", width = ETHER_DECIMALS);
            padded
                .parse::<u128>()
                .map_err(|_| invalid("bad fractional part"))?
        };

        whole_wei
            .checked_add(frac_wei)
            .map(Self)
            .ok_or(ValidationError::Overflow("ether parsing"))
    }

    /// Parse user input: plain digits are wei, a trailing `eth` or `ether`
    /// switches to ether units.
    ///
    /// # Errors
    ///
    /// See [`Amount::from_ether`] and [`Amount::from_str`].
    pub fn parse_units(text: &str) -> Result<Self, ValidationError> {
        let s = text.trim();
        let lower = s.to_ascii_lowercase();
        for suffix in ["ether", "eth"] {
            if let Some(value) = lower.strip_suffix(suffix) {
                return Self::from_ether(value.trim_end()).map_err(|e| match e {
                    ValidationError::InvalidAmount { reason, .. } => {
                        ValidationError::InvalidAmount {
                            value: text.to_string(),
                            reason,
                        }
                    }
                    other => other,
                });
            }
        }
        s.parse()
    }

    /// Render as a decimal ether string without trailing fractional zeros.
    pub fn format_ether(&self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let frac = self.0 % WEI_PER_ETHER;
        if frac == 0 {
            return whole.to_string();
        }
        let digits = format!("{frac:0>width$}", width = ETHER_DECIMALS);
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    /// Parse a wei integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidAmount {
                value: s.to_string(),
                reason: "expected a non-negative integer number of wei".to_string(),
            });
        }
        trimmed
            .parse::<u128>()
            .map(Self)
            .map_err(|_| ValidationError::Overflow("amount parsing"))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Int(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Int(n) => Ok(Self(u128::from(n))),
        }
    }
}
