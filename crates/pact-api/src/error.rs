//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Escrow rejections keep their ledger error code (`INVALID_STATE`,
//! `DEPOSIT_MISMATCH`, ...) and map onto HTTP statuses by kind. Internal
//! error details are never returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use pact_ledger::{CustodyError, ErrorKind, EscrowError};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "ORDER_NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// The ledger rejected an operation.
    #[error(transparent)]
    Escrow(EscrowError),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body, path, query or header could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Escrow(err) => {
                let kind = err.kind();
                let status = match kind {
                    ErrorKind::OrderNotFound => StatusCode::NOT_FOUND,
                    ErrorKind::InvalidState | ErrorKind::Custody => StatusCode::CONFLICT,
                    ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
                    ErrorKind::InvalidAmount
                    | ErrorKind::DepositMismatch
                    | ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorKind::Snapshot => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, kind.code())
            }
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Structured context for escrow rejections.
    fn details(&self) -> Option<serde_json::Value> {
        let Self::Escrow(err) = self else {
            return None;
        };
        match err {
            EscrowError::DepositMismatch {
                operation,
                expected,
                actual,
            } => Some(serde_json::json!({
                "operation": operation,
                "expected": expected,
                "actual": actual,
            })),
            EscrowError::InvalidState {
                order_id,
                operation,
                status,
            } => Some(serde_json::json!({
                "order_id": order_id,
                "operation": operation,
                "status": status,
            })),
            EscrowError::Unauthorized {
                order_id,
                operation,
                caller,
            } => Some(serde_json::json!({
                "order_id": order_id,
                "operation": operation,
                "caller": caller,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let internal = status == StatusCode::INTERNAL_SERVER_ERROR;
        let message = if internal {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        if internal {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convert pact-core validation errors to API errors.
impl From<pact_core::ValidationError> for AppError {
    fn from(err: pact_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Convert ledger errors to API errors.
impl From<EscrowError> for AppError {
    fn from(err: EscrowError) -> Self {
        match err {
            EscrowError::Snapshot(_) => Self::Internal(err.to_string()),
            other => Self::Escrow(other),
        }
    }
}

/// A failed custody audit on a live ledger is an internal fault.
impl From<CustodyError> for AppError {
    fn from(err: CustodyError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pact_core::{Address, Amount, OrderId};
    use pact_ledger::{Operation, OrderStatus};

    fn escrow(err: EscrowError) -> AppError {
        AppError::from(err)
    }

    #[test]
    fn not_found_status_code() {
        let (status, code) = escrow(EscrowError::OrderNotFound(OrderId::FIRST)).status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "ORDER_NOT_FOUND");
    }

    #[test]
    fn invalid_state_is_conflict() {
        let err = escrow(EscrowError::InvalidState {
            order_id: OrderId::FIRST,
            operation: Operation::ConfirmReceived,
            status: OrderStatus::Inactive,
        });
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "INVALID_STATE");
    }

    #[test]
    fn unauthorized_caller_is_forbidden() {
        let err = escrow(EscrowError::Unauthorized {
            order_id: OrderId::FIRST,
            operation: Operation::ReleaseSellerDeposit,
            caller: Address::from_low_u64_be(1),
        });
        assert_eq!(err.status_and_code().0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn deposit_errors_are_unprocessable() {
        let mismatch = escrow(EscrowError::DepositMismatch {
            operation: Operation::CreateOrder,
            expected: Amount::from_wei(2),
            actual: Amount::from_wei(1),
        });
        assert_eq!(mismatch.status_and_code(), (StatusCode::UNPROCESSABLE_ENTITY, "DEPOSIT_MISMATCH"));
        let zero = escrow(EscrowError::InvalidAmount {
            amount: Amount::ZERO,
            reason: "zero",
        });
        assert_eq!(zero.status_and_code().0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn custody_rejection_is_conflict() {
        let err = escrow(EscrowError::Custody(CustodyError::InsufficientFunds {
            account: Address::from_low_u64_be(1),
            required: Amount::from_wei(2),
            available: Amount::ZERO,
        }));
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "CUSTODY"));
    }

    #[test]
    fn snapshot_error_becomes_internal() {
        let err = escrow(EscrowError::Snapshot("bad".into()));
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn bad_request_status_code() {
        let err = AppError::BadRequest("malformed JSON".to_string());
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "BAD_REQUEST"));
    }

    #[test]
    fn unauthorized_status_code() {
        let err = AppError::Unauthorized("no token".to_string());
        assert_eq!(err.status_and_code(), (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"));
    }

    #[test]
    fn validation_error_from_pact_core() {
        let core_err = pact_core::ValidationError::InvalidAddress("0x12".to_string());
        match AppError::from(core_err) {
            AppError::Validation(msg) => assert!(msg.contains("0x12"), "got: {msg}"),
            other => panic!("expected Validation, got: {other:?}"),
        }
    }

    // ── into_response tests ──────────────────────────────────────

    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn into_response_invalid_state_carries_details() {
        let (status, body) = response_parts(escrow(EscrowError::InvalidState {
            order_id: OrderId::FIRST,
            operation: Operation::ConfirmPurchase,
            status: OrderStatus::Locked,
        }))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error.code, "INVALID_STATE");
        let details = body.error.details.unwrap();
        assert_eq!(details["status"], "LOCKED");
        assert_eq!(details["operation"], "confirm_purchase");
        assert_eq!(details["order_id"], 1);
    }

    #[tokio::test]
    async fn into_response_not_found_has_no_details() {
        let (status, body) =
            response_parts(escrow(EscrowError::OrderNotFound(OrderId::FIRST))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.error.message.contains("order 1"));
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("custody drifted".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(body.error.details.is_none());
    }
}
