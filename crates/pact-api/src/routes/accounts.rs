//! # Accounts & Custody
//!
//! Read-only views of the value ledger: an account's balance, the
//! custody audit (escrow balance against the sum of what orders hold), and
//! the escrow policy the ledger was deployed with.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use pact_core::{Address, Amount};
use pact_ledger::{CustodyReport, EscrowPolicy};

use crate::error::AppError;
use crate::state::AppState;

/// Balance of one account.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(value_type = String)]
    pub address: Address,
    /// Balance in wei.
    #[schema(value_type = String)]
    pub balance: Amount,
    /// Balance in ether, for display.
    pub balance_ether: String,
}

/// Custody audit result.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustodyResponse {
    #[schema(value_type = String)]
    pub custody_account: Address,
    #[schema(value_type = String)]
    pub custody_balance: Amount,
    /// Sum of `held` across all orders.
    #[schema(value_type = String)]
    pub total_held: Amount,
    /// Orders not yet `INACTIVE`.
    pub open_orders: usize,
}

impl From<CustodyReport> for CustodyResponse {
    fn from(report: CustodyReport) -> Self {
        Self {
            custody_account: report.custody_account,
            custody_balance: report.custody_balance,
            total_held: report.total_held,
            open_orders: report.open_orders,
        }
    }
}

/// Active escrow rules.
#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyResponse {
    /// Who may release the seller's deposit: `seller_only` or `anyone`.
    pub release_authority: String,
    /// Who may cancel a locked order: `seller_only` or `anyone`.
    pub refund_authority: String,
    /// `return_to_seller` or `retain_in_custody`.
    pub cancellation: String,
}

impl From<&EscrowPolicy> for PolicyResponse {
    fn from(policy: &EscrowPolicy) -> Self {
        Self {
            release_authority: policy.release_authority.as_str().to_string(),
            refund_authority: policy.refund_authority.as_str().to_string(),
            cancellation: policy.cancellation.as_str().to_string(),
        }
    }
}

/// Build the accounts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/accounts/:address", get(get_balance))
        .route("/v1/custody", get(custody_audit))
        .route("/v1/policy", get(get_policy))
}

/// GET /v1/accounts/{address} — Value-ledger balance.
#[utoipa::path(
    get,
    path = "/v1/accounts/{address}",
    params(("address" = String, Path, description = "0x-prefixed 20-byte address")),
    responses(
        (status = 200, description = "Account balance", body = BalanceResponse),
        (status = 422, description = "Malformed address", body = crate::error::ErrorBody),
    ),
    tag = "accounts"
)]
async fn get_balance(
    State(state): State<AppState>,
    address: Result<Path<String>, PathRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    let Path(raw) = address.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let address = Address::new(raw)?;
    let balance = state.ledger.lock().balance_of(&address);
    Ok(Json(BalanceResponse {
        address,
        balance,
        balance_ether: balance.format_ether(),
    }))
}

/// GET /v1/custody — Check that custody covers every open obligation.
#[utoipa::path(
    get,
    path = "/v1/custody",
    responses(
        (status = 200, description = "Custody balance matches held value", body = CustodyResponse),
        (status = 500, description = "Custody audit failed", body = crate::error::ErrorBody),
    ),
    tag = "accounts"
)]
async fn custody_audit(State(state): State<AppState>) -> Result<Json<CustodyResponse>, AppError> {
    let report = state.ledger.lock().verify_custody()?;
    Ok(Json(CustodyResponse::from(report)))
}

/// GET /v1/policy — Escrow rules fixed at deployment.
#[utoipa::path(
    get,
    path = "/v1/policy",
    responses(
        (status = 200, description = "Active policy", body = PolicyResponse),
    ),
    tag = "accounts"
)]
async fn get_policy(State(state): State<AppState>) -> Json<PolicyResponse> {
    let ledger = state.ledger.lock();
    Json(PolicyResponse::from(ledger.policy()))
}
