//! # Order Lifecycle API
//!
//! | Method & path                                   | Ledger operation          |
//! |-------------------------------------------------|---------------------------|
//! | `POST /v1/orders`                               | `create_order`            |
//! | `GET  /v1/orders`                               | list (`?status=`, `?party=`) |
//! | `GET  /v1/orders/{id}`                          | `get_order`               |
//! | `POST /v1/orders/{id}/confirm-purchase`         | `confirm_purchase`        |
//! | `POST /v1/orders/{id}/confirm-received`         | `confirm_received`        |
//! | `POST /v1/orders/{id}/release-seller-deposit`   | `release_seller_deposit`  |
//! | `POST /v1/orders/{id}/refund-buyer`             | `refund_buyer`            |
//!
//! Mutating routes act for the address in `X-Caller-Address`. Transition
//! responses carry the updated order and the notifications that call
//! emitted.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use pact_core::{Address, Amount, OrderId};
use pact_ledger::{EscrowError, Order, OrderStatus};

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_order_id, extract_query, extract_validated_json, Validate};
use crate::routes::events::EventView;
use crate::state::{AppState, Ledger};

/// Longest accepted order description, in bytes.
pub const MAX_DESCRIPTION_BYTES: usize = 4096;

// ── DTOs ────────────────────────────────────────────────────────────────────

/// An order as returned by the API. Amounts are decimal wei strings.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderView {
    pub id: u64,
    pub description: String,
    #[schema(value_type = String, example = "1000000000000000000")]
    pub amount: Amount,
    #[schema(value_type = String, example = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8")]
    pub seller: Address,
    #[schema(value_type = String)]
    pub seller_deposit: Amount,
    #[schema(value_type = Option<String>)]
    pub buyer: Option<Address>,
    #[schema(value_type = String)]
    pub buyer_deposit: Amount,
    /// `CREATED`, `LOCKED`, `RELEASE` or `INACTIVE`.
    #[schema(value_type = String, example = "CREATED")]
    pub status: OrderStatus,
    /// Numeric status: 0 = Created, 1 = Locked, 2 = Release, 3 = Inactive.
    pub status_code: u8,
    /// Value still in custody for this order.
    #[schema(value_type = String)]
    pub held: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.get(),
            description: order.description.clone(),
            amount: order.amount,
            seller: order.seller.clone(),
            seller_deposit: order.seller_deposit,
            buyer: order.buyer.clone(),
            buyer_deposit: order.buyer_deposit,
            status: order.status,
            status_code: order.status.code(),
            held: order.held,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Create order request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub description: String,
    /// Nominal price in wei.
    #[schema(value_type = String, example = "1")]
    pub amount: Amount,
    /// Attached collateral in wei; must be twice `amount`.
    #[schema(value_type = String, example = "2")]
    pub deposit: Amount,
}

impl Validate for CreateOrderRequest {
    fn validate(&self) -> Result<(), String> {
        if self.description.len() > MAX_DESCRIPTION_BYTES {
            return Err(format!(
                "description must be at most {MAX_DESCRIPTION_BYTES} bytes"
            ));
        }
        Ok(())
    }
}

/// Confirm purchase request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmPurchaseRequest {
    /// Attached collateral in wei; must equal the seller's deposit.
    #[schema(value_type = String, example = "2")]
    pub deposit: Amount,
}

/// Response to `POST /v1/orders`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order_id: u64,
    pub order: OrderView,
    pub events: Vec<EventView>,
}

/// Response to a lifecycle transition.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    pub order: OrderView,
    /// Notifications emitted by this call, in order.
    pub events: Vec<EventView>,
}

/// Order listing filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListOrdersQuery {
    /// Only orders in this status (case-insensitive, e.g. `locked`).
    pub status: Option<String>,
    /// Only orders where this address is seller or buyer.
    pub party: Option<String>,
}

/// Order listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub count: usize,
    pub orders: Vec<OrderView>,
}

// ── Router ──────────────────────────────────────────────────────────────────

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(create_order).get(list_orders))
        .route("/v1/orders/:id", get(get_order))
        .route("/v1/orders/:id/confirm-purchase", post(confirm_purchase))
        .route("/v1/orders/:id/confirm-received", post(confirm_received))
        .route(
            "/v1/orders/:id/release-seller-deposit",
            post(release_seller_deposit),
        )
        .route("/v1/orders/:id/refund-buyer", post(refund_buyer))
}

/// Run one ledger operation under the lock and collect what it emitted.
fn apply_transition(
    state: &AppState,
    id: OrderId,
    operation: impl FnOnce(&mut Ledger) -> Result<(), EscrowError>,
) -> Result<TransitionResponse, AppError> {
    let mut ledger = state.ledger.lock();
    let before = ledger.last_event_sequence();
    operation(&mut ledger)?;
    Ok(TransitionResponse {
        order: OrderView::from(ledger.order(id)?),
        events: ledger
            .events_since(before)
            .iter()
            .map(EventView::from)
            .collect(),
    })
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// POST /v1/orders — Open an order, locking the seller's deposit.
#[utoipa::path(
    post,
    path = "/v1/orders",
    request_body = CreateOrderRequest,
    params(("X-Caller-Address" = String, Header, description = "Seller address")),
    responses(
        (status = 201, description = "Order created", body = CreateOrderResponse),
        (status = 400, description = "Malformed body or caller header", body = crate::error::ErrorBody),
        (status = 409, description = "Seller cannot fund the deposit", body = crate::error::ErrorBody),
        (status = 422, description = "Zero amount or deposit is not twice the amount", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
async fn create_order(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let mut ledger = state.ledger.lock();
    let before = ledger.last_event_sequence();
    let id = ledger.create_order(&caller, req.description, req.amount, req.deposit)?;
    let response = CreateOrderResponse {
        order_id: id.get(),
        order: OrderView::from(ledger.order(id)?),
        events: ledger
            .events_since(before)
            .iter()
            .map(EventView::from)
            .collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /v1/orders — List orders in id order.
#[utoipa::path(
    get,
    path = "/v1/orders",
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "Orders", body = ListOrdersResponse),
        (status = 400, description = "Unknown status or malformed party", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
async fn list_orders(
    State(state): State<AppState>,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<ListOrdersResponse>, AppError> {
    let query = extract_query(query)?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;
    let party = query
        .party
        .as_deref()
        .map(Address::new)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let ledger = state.ledger.lock();
    let orders: Vec<OrderView> = ledger
        .orders_matching(status, party.as_ref())
        .map(OrderView::from)
        .collect();
    Ok(Json(ListOrdersResponse {
        count: orders.len(),
        orders,
    }))
}

/// GET /v1/orders/{id} — Fetch one order.
#[utoipa::path(
    get,
    path = "/v1/orders/{id}",
    params(("id" = u64, Path, description = "Order id")),
    responses(
        (status = 200, description = "The order", body = OrderView),
        (status = 404, description = "No such order", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
async fn get_order(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<OrderView>, AppError> {
    let id = extract_order_id(id)?;
    let ledger = state.ledger.lock();
    Ok(Json(OrderView::from(ledger.order(id)?)))
}

/// POST /v1/orders/{id}/confirm-purchase — Lock the buyer's deposit.
#[utoipa::path(
    post,
    path = "/v1/orders/{id}/confirm-purchase",
    request_body = ConfirmPurchaseRequest,
    params(
        ("id" = u64, Path, description = "Order id"),
        ("X-Caller-Address" = String, Header, description = "Buyer address"),
    ),
    responses(
        (status = 200, description = "Order locked", body = TransitionResponse),
        (status = 404, description = "No such order", body = crate::error::ErrorBody),
        (status = 409, description = "Order not in CREATED, or buyer cannot fund the deposit", body = crate::error::ErrorBody),
        (status = 422, description = "Deposit is not twice the amount", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
async fn confirm_purchase(
    State(state): State<AppState>,
    Caller(caller): Caller,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<ConfirmPurchaseRequest>, JsonRejection>,
) -> Result<Json<TransitionResponse>, AppError> {
    let id = extract_order_id(id)?;
    let req = extract_json(body)?;
    apply_transition(&state, id, |ledger| {
        ledger.confirm_purchase(&caller, id, req.deposit)
    })
    .map(Json)
}

/// POST /v1/orders/{id}/confirm-received — Buyer attests receipt.
#[utoipa::path(
    post,
    path = "/v1/orders/{id}/confirm-received",
    params(
        ("id" = u64, Path, description = "Order id"),
        ("X-Caller-Address" = String, Header, description = "Buyer address"),
    ),
    responses(
        (status = 200, description = "Buyer deposit returned", body = TransitionResponse),
        (status = 403, description = "Caller is not the buyer", body = crate::error::ErrorBody),
        (status = 404, description = "No such order", body = crate::error::ErrorBody),
        (status = 409, description = "Order not in LOCKED", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
async fn confirm_received(
    State(state): State<AppState>,
    Caller(caller): Caller,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<TransitionResponse>, AppError> {
    let id = extract_order_id(id)?;
    apply_transition(&state, id, |ledger| ledger.confirm_received(&caller, id)).map(Json)
}

/// POST /v1/orders/{id}/release-seller-deposit — Complete the order.
#[utoipa::path(
    post,
    path = "/v1/orders/{id}/release-seller-deposit",
    params(
        ("id" = u64, Path, description = "Order id"),
        ("X-Caller-Address" = String, Header, description = "Caller address"),
    ),
    responses(
        (status = 200, description = "Seller deposit returned", body = TransitionResponse),
        (status = 403, description = "Release policy does not permit the caller", body = crate::error::ErrorBody),
        (status = 404, description = "No such order", body = crate::error::ErrorBody),
        (status = 409, description = "Order not in RELEASE", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
async fn release_seller_deposit(
    State(state): State<AppState>,
    Caller(caller): Caller,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<TransitionResponse>, AppError> {
    let id = extract_order_id(id)?;
    apply_transition(&state, id, |ledger| {
        ledger.release_seller_deposit(&caller, id)
    })
    .map(Json)
}

/// POST /v1/orders/{id}/refund-buyer — Cancel a locked order.
#[utoipa::path(
    post,
    path = "/v1/orders/{id}/refund-buyer",
    params(
        ("id" = u64, Path, description = "Order id"),
        ("X-Caller-Address" = String, Header, description = "Caller address"),
    ),
    responses(
        (status = 200, description = "Order cancelled", body = TransitionResponse),
        (status = 403, description = "Refund policy does not permit the caller", body = crate::error::ErrorBody),
        (status = 404, description = "No such order", body = crate::error::ErrorBody),
        (status = 409, description = "Order not in LOCKED", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
async fn refund_buyer(
    State(state): State<AppState>,
    Caller(caller): Caller,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<TransitionResponse>, AppError> {
    let id = extract_order_id(id)?;
    apply_transition(&state, id, |ledger| ledger.refund_buyer(&caller, id)).map(Json)
}
