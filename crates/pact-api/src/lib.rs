//! # pact-api — HTTP Host for the Pact Escrow Ledger
//!
//! Serves one [`EscrowLedger`](pact_ledger::EscrowLedger) over HTTP.
//! Every request that touches the ledger takes the same lock, so the five
//! operations are serialized exactly as they would be in-process.
//!
//! ## API Surface
//!
//! | Prefix                 | Module                 | Domain              |
//! |------------------------|------------------------|---------------------|
//! | `/v1/orders/*`         | [`routes::orders`]     | Order lifecycle     |
//! | `/v1/events`           | [`routes::events`]     | Notification feed   |
//! | `/v1/accounts/*`       | [`routes::accounts`]   | Balances            |
//! | `/v1/custody`          | [`routes::accounts`]   | Custody audit       |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Generated via utoipa derive macros and served at `/openapi.json`.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::orders::router())
        .merge(routes::events::router())
        .merge(routes::accounts::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
