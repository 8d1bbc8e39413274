//! # Escrow Errors
//!
//! Every rejected operation returns an [`EscrowError`] and leaves the
//! ledger exactly as it was. Each variant carries enough context (order id,
//! operation, current status, expected and actual values) to diagnose the
//! rejection without reading logs.

use thiserror::Error;

use pact_core::{Address, Amount, OrderId, ValidationError};

use crate::custody::CustodyError;
use crate::order::{Operation, OrderStatus};

/// Errors returned by escrow ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// The nominal price is unusable.
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount {
        /// The rejected price.
        amount: Amount,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The attached value is not twice the nominal price.
    #[error("{operation}: deposit must be {expected} wei, got {actual}")]
    DepositMismatch {
        /// The operation that required the deposit.
        operation: Operation,
        /// `2 × amount`.
        expected: Amount,
        /// What the caller attached.
        actual: Amount,
    },

    /// No order with this id has been created.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// The order is not in the status the operation requires.
    #[error("cannot {operation} order {order_id} in status {status}")]
    InvalidState {
        /// The order.
        order_id: OrderId,
        /// The attempted operation.
        operation: Operation,
        /// The status the order is actually in.
        status: OrderStatus,
    },

    /// The caller is not permitted to perform the operation.
    #[error("{caller} is not permitted to {operation} order {order_id}")]
    Unauthorized {
        /// The order.
        order_id: OrderId,
        /// The attempted operation.
        operation: Operation,
        /// Who attempted it.
        caller: Address,
    },

    /// The value ledger refused a deposit or payout.
    #[error("custody: {0}")]
    Custody(#[from] CustodyError),

    /// A domain primitive failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A snapshot failed structural validation on restore.
    #[error("invalid snapshot: {0}")]
    Snapshot(String),
}

/// Fieldless discriminant of [`EscrowError`], for mapping onto transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// [`EscrowError::InvalidAmount`].
    InvalidAmount,
    /// [`EscrowError::DepositMismatch`].
    DepositMismatch,
    /// [`EscrowError::OrderNotFound`].
    OrderNotFound,
    /// [`EscrowError::InvalidState`].
    InvalidState,
    /// [`EscrowError::Unauthorized`].
    Unauthorized,
    /// [`EscrowError::Custody`].
    Custody,
    /// [`EscrowError::Validation`].
    Validation,
    /// [`EscrowError::Snapshot`].
    Snapshot,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::DepositMismatch => "DEPOSIT_MISMATCH",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::InvalidState => "INVALID_STATE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Custody => "CUSTODY",
            Self::Validation => "VALIDATION",
            Self::Snapshot => "INVALID_SNAPSHOT",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl EscrowError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            Self::DepositMismatch { .. } => ErrorKind::DepositMismatch,
            Self::OrderNotFound(_) => ErrorKind::OrderNotFound,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Custody(_) => ErrorKind::Custody,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Snapshot(_) => ErrorKind::Snapshot,
        }
    }
}
