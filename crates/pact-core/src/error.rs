//! # Validation Errors
//!
//! Every domain primitive enforces its format at construction time.
//! These errors carry the rejected input so that operators can diagnose
//! a malformed request or state file without guesswork.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address is not `0x` followed by 40 hexadecimal characters.
    #[error("invalid address: \"{0}\" (expected 0x followed by 40 hex characters)")]
    InvalidAddress(String),

    /// Amount text could not be parsed.
    #[error("invalid amount: \"{value}\" ({reason})")]
    InvalidAmount {
        /// The text that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Order identifiers start at 1.
    #[error("invalid order id: 0 is never assigned")]
    ZeroOrderId,

    /// Checked arithmetic on an amount or counter overflowed.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
}
