//! # Authentication & Caller Identity
//!
//! Two separate concerns:
//!
//! - **Bearer gate.** When `AUTH_TOKEN` is configured, every `/v1/*` and
//!   `/openapi.json` request must carry `Authorization: Bearer <token>`.
//!   The token gates access to the host; it says nothing about who is
//!   calling.
//! - **Caller address.** Escrow operations act on behalf of an address
//!   (seller, buyer, or anyone else). Mutating routes read it from the
//!   `X-Caller-Address` header through the [`Caller`] extractor.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, HeaderName, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;

use pact_core::Address;

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// Header carrying the caller's address on mutating routes.
pub const CALLER_HEADER: HeaderName = HeaderName::from_static("x-caller-address");

// ── Caller ──────────────────────────────────────────────────────────────────

/// The address a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Address);

/// Reads and validates the `X-Caller-Address` header.
///
/// A missing or malformed header is a 400.
#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(&CALLER_HEADER)
            .ok_or_else(|| AppError::BadRequest("missing X-Caller-Address header".into()))?
            .to_str()
            .map_err(|_| AppError::BadRequest("X-Caller-Address is not valid text".into()))?;
        Address::new(raw)
            .map(Caller)
            .map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of bearer tokens.
///
/// When lengths differ, performs a dummy comparison so the mismatch takes
/// the same path as a same-length one.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Reject requests without the configured bearer token.
///
/// When `AuthConfig.token` is `None`, all requests pass.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(provided) if constant_time_token_eq(provided, &expected) => {
                next.run(request).await
            }
            Some(_) => {
                tracing::warn!("authentication failed: invalid bearer token");
                unauthorized_response("invalid bearer token")
            }
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                unauthorized_response("authorization header must use Bearer scheme")
            }
        },
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            unauthorized_response("missing authorization header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
