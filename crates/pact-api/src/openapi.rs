//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pact Escrow API",
        version = "0.1.0",
        description = "Two-party purchase escrow: sellers and buyers each lock twice the price, and deposits are returned as the order moves through CREATED, LOCKED, RELEASE and INACTIVE.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Orders
        crate::routes::orders::create_order,
        crate::routes::orders::list_orders,
        crate::routes::orders::get_order,
        crate::routes::orders::confirm_purchase,
        crate::routes::orders::confirm_received,
        crate::routes::orders::release_seller_deposit,
        crate::routes::orders::refund_buyer,
        // Events
        crate::routes::events::list_events,
        // Accounts
        crate::routes::accounts::get_balance,
        crate::routes::accounts::custody_audit,
        crate::routes::accounts::get_policy,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Order DTOs
        crate::routes::orders::OrderView,
        crate::routes::orders::CreateOrderRequest,
        crate::routes::orders::ConfirmPurchaseRequest,
        crate::routes::orders::CreateOrderResponse,
        crate::routes::orders::TransitionResponse,
        crate::routes::orders::ListOrdersResponse,
        // Event DTOs
        crate::routes::events::EventView,
        crate::routes::events::EventsResponse,
        // Account DTOs
        crate::routes::accounts::BalanceResponse,
        crate::routes::accounts::CustodyResponse,
        crate::routes::accounts::PolicyResponse,
    )),
    tags(
        (name = "orders", description = "Order lifecycle"),
        (name = "events", description = "Notification feed"),
        (name = "accounts", description = "Balances, custody audit and policy"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/v1/orders",
            "/v1/orders/{id}",
            "/v1/orders/{id}/confirm-purchase",
            "/v1/orders/{id}/confirm-received",
            "/v1/orders/{id}/release-seller-deposit",
            "/v1/orders/{id}/refund-buyer",
            "/v1/events",
            "/v1/accounts/{address}",
            "/v1/custody",
            "/v1/policy",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
