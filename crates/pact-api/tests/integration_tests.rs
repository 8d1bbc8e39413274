//! # Integration Tests for pact-api
//!
//! Drives the full router with `tower::ServiceExt::oneshot`: health probes,
//! the complete order lifecycle over HTTP, error mapping for each rejection
//! kind, the notification feed, balances, custody audit, the active policy,
//! the bearer gate, and OpenAPI generation.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pact_api::state::{AppConfig, AppState};
use pact_core::{Address, Amount};
use pact_ledger::{Authority, CancellationPolicy, EscrowPolicy, GenesisAllocation, LedgerConfig};

const SELLER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
const BUYER: &str = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc";
const STRANGER: &str = "0x90f79bf6eb2c4f870365e785982e1f101e93b906";

fn funded_config(policy: EscrowPolicy, auth_token: Option<&str>) -> AppConfig {
    let genesis = [SELLER, BUYER, STRANGER]
        .into_iter()
        .map(|a| GenesisAllocation {
            address: Address::new(a).unwrap(),
            balance: Amount::from_wei(100),
        })
        .collect();
    AppConfig {
        port: 8080,
        auth_token: auth_token.map(str::to_string),
        ledger: LedgerConfig {
            policy,
            genesis,
            ..LedgerConfig::default()
        },
    }
}

/// Helper: build the test app with auth disabled and three funded accounts.
fn test_app() -> axum::Router {
    test_app_with_policy(EscrowPolicy::default())
}

fn test_app_with_policy(policy: EscrowPolicy) -> axum::Router {
    let state = AppState::try_with_config(funded_config(policy, None)).unwrap();
    pact_api::app(state)
}

/// Helper: build the test app with auth enabled.
fn test_app_with_auth(token: &str) -> axum::Router {
    let state =
        AppState::try_with_config(funded_config(EscrowPolicy::default(), Some(token))).unwrap();
    pact_api::app(state)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post(uri: &str, caller: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("X-Caller-Address", caller);
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn create_rice_order(app: &axum::Router) -> Value {
    let (status, body) = send(
        app,
        post(
            "/v1/orders",
            SELLER,
            Some(json!({"description": "A bag of rice", "amount": "1", "deposit": "2"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn balance(app: &axum::Router, address: &str) -> String {
    let (status, body) = send(app, get(&format!("/v1/accounts/{address}"))).await;
    assert_eq!(status, StatusCode::OK);
    body["balance"].as_str().unwrap().to_string()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = test_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let response = test_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ready");
}

// -- Lifecycle ----------------------------------------------------------------

#[tokio::test]
async fn test_happy_path_over_http() {
    let app = test_app();

    let created = create_rice_order(&app).await;
    assert_eq!(created["order_id"], 1);
    assert_eq!(created["order"]["status"], "CREATED");
    assert_eq!(created["order"]["status_code"], 0);
    assert_eq!(created["order"]["seller_deposit"], "2");
    assert_eq!(created["order"]["buyer"], Value::Null);
    assert_eq!(
        created["events"][0]["summary"],
        "OrderCreated(1, \"A bag of rice\", 1, 2)"
    );
    assert_eq!(balance(&app, SELLER).await, "98");

    let (status, body) = send(
        &app,
        post("/v1/orders/1/confirm-purchase", BUYER, Some(json!({"deposit": "2"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["order"]["status"], "LOCKED");
    assert_eq!(body["order"]["buyer"], BUYER);
    assert_eq!(body["events"][0]["event"]["type"], "PurchaseConfirmed");
    assert_eq!(body["events"][0]["event"]["buyer"], BUYER);

    let (status, body) = send(&app, post("/v1/orders/1/confirm-received", BUYER, None)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["order"]["status"], "RELEASE");
    assert_eq!(body["events"][0]["summary"], "BuyerRefunded(1, 2)");
    assert_eq!(balance(&app, BUYER).await, "100");

    let (status, body) = send(
        &app,
        post("/v1/orders/1/release-seller-deposit", SELLER, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["order"]["status"], "INACTIVE");
    assert_eq!(body["order"]["held"], "0");
    assert_eq!(body["events"][0]["summary"], "SellerDepositReleased(1, 2)");
    assert_eq!(balance(&app, SELLER).await, "100");

    let (status, body) = send(&app, get("/v1/custody")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["custody_balance"], "0");
    assert_eq!(body["open_orders"], 0);
}

#[tokio::test]
async fn test_refund_path_emits_both_events() {
    let app = test_app();
    create_rice_order(&app).await;
    send(
        &app,
        post("/v1/orders/1/confirm-purchase", BUYER, Some(json!({"deposit": "2"}))),
    )
    .await;

    let (status, body) = send(&app, post("/v1/orders/1/refund-buyer", STRANGER, None)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["order"]["status"], "INACTIVE");
    let names: Vec<&str> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["BuyerRefunded", "SellerDepositReleased"]);

    let (status, body) = send(&app, post("/v1/orders/1/confirm-received", BUYER, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");
    assert_eq!(body["error"]["details"]["status"], "INACTIVE");
}

// -- Rejections ---------------------------------------------------------------

#[tokio::test]
async fn test_zero_amount_is_unprocessable() {
    let app = test_app();
    let (status, body) = send(
        &app,
        post(
            "/v1/orders",
            SELLER,
            Some(json!({"description": "x", "amount": "0", "deposit": "0"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_AMOUNT");
}

#[tokio::test]
async fn test_deposit_mismatch_is_unprocessable() {
    let app = test_app();
    let (status, body) = send(
        &app,
        post(
            "/v1/orders",
            SELLER,
            Some(json!({"description": "x", "amount": "5", "deposit": "5"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "DEPOSIT_MISMATCH");
    assert_eq!(body["error"]["details"]["expected"], "10");
    assert_eq!(body["error"]["details"]["actual"], "5");
}

#[tokio::test]
async fn test_unfunded_seller_is_conflict() {
    let app = test_app();
    let (status, body) = send(
        &app,
        post(
            "/v1/orders",
            SELLER,
            Some(json!({"description": "x", "amount": "60", "deposit": "120"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CUSTODY");
    assert_eq!(balance(&app, SELLER).await, "100");
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = test_app();
    let (status, body) = send(&app, get("/v1/orders/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ORDER_NOT_FOUND");

    let (status, _) = send(
        &app,
        post("/v1/orders/42/confirm-purchase", BUYER, Some(json!({"deposit": "2"}))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_buyer_cannot_confirm_receipt() {
    let app = test_app();
    create_rice_order(&app).await;
    send(
        &app,
        post("/v1/orders/1/confirm-purchase", BUYER, Some(json!({"deposit": "2"}))),
    )
    .await;

    let (status, body) = send(&app, post("/v1/orders/1/confirm-received", SELLER, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["details"]["caller"], SELLER);
}

#[tokio::test]
async fn test_release_policy_applies() {
    let app = test_app_with_policy(EscrowPolicy {
        release_authority: Authority::Anyone,
        ..EscrowPolicy::default()
    });
    create_rice_order(&app).await;
    send(
        &app,
        post("/v1/orders/1/confirm-purchase", BUYER, Some(json!({"deposit": "2"}))),
    )
    .await;
    send(&app, post("/v1/orders/1/confirm-received", BUYER, None)).await;

    let (status, _) = send(
        &app,
        post("/v1/orders/1/release-seller-deposit", STRANGER, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_caller_header_is_bad_request() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/orders/1/confirm-received")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/orders")
        .header("X-Caller-Address", SELLER)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_oversized_description_is_unprocessable() {
    let app = test_app();
    let description = "x".repeat(pact_api::routes::orders::MAX_DESCRIPTION_BYTES + 1);
    let (status, body) = send(
        &app,
        post(
            "/v1/orders",
            SELLER,
            Some(json!({"description": description, "amount": "1", "deposit": "2"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_order_id_zero_is_unprocessable() {
    let app = test_app();
    let (status, _) = send(&app, get("/v1/orders/0")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = send(&app, get("/v1/orders/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -- Reads --------------------------------------------------------------------

#[tokio::test]
async fn test_list_orders_filters() {
    let app = test_app();
    create_rice_order(&app).await;
    create_rice_order(&app).await;
    send(
        &app,
        post("/v1/orders/2/confirm-purchase", BUYER, Some(json!({"deposit": "2"}))),
    )
    .await;

    let (_, all) = send(&app, get("/v1/orders")).await;
    assert_eq!(all["count"], 2);

    let (_, locked) = send(&app, get("/v1/orders?status=locked")).await;
    assert_eq!(locked["count"], 1);
    assert_eq!(locked["orders"][0]["id"], 2);

    let (_, mine) = send(&app, get(&format!("/v1/orders?party={BUYER}"))).await;
    assert_eq!(mine["count"], 1);

    let (_, seller_open) = send(
        &app,
        get(&format!("/v1/orders?status=created&party={SELLER}")),
    )
    .await;
    assert_eq!(seller_open["count"], 1);
    assert_eq!(seller_open["orders"][0]["id"], 1);

    let (_, buyer_open) = send(
        &app,
        get(&format!("/v1/orders?status=created&party={BUYER}")),
    )
    .await;
    assert_eq!(buyer_open["count"], 0);

    let (status, _) = send(&app, get("/v1/orders?status=shipped")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_policy_reports_defaults() {
    let app = test_app();
    let (status, body) = send(&app, get("/v1/policy")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["release_authority"], "seller_only");
    assert_eq!(body["refund_authority"], "anyone");
    assert_eq!(body["cancellation"], "return_to_seller");
}

#[tokio::test]
async fn test_policy_reports_configured_rules() {
    let app = test_app_with_policy(EscrowPolicy {
        refund_authority: Authority::SellerOnly,
        cancellation: CancellationPolicy::RetainInCustody,
        ..EscrowPolicy::default()
    });
    let (status, body) = send(&app, get("/v1/policy")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refund_authority"], "seller_only");
    assert_eq!(body["cancellation"], "retain_in_custody");
}

#[tokio::test]
async fn test_events_since() {
    let app = test_app();
    create_rice_order(&app).await;
    send(
        &app,
        post("/v1/orders/1/confirm-purchase", BUYER, Some(json!({"deposit": "2"}))),
    )
    .await;

    let (status, body) = send(&app, get("/v1/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_sequence"], 2);
    assert_eq!(body["events"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, get("/v1/events?since=1")).await;
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["sequence"], 2);
    assert_eq!(events[0]["name"], "PurchaseConfirmed");
}

#[tokio::test]
async fn test_balance_rejects_malformed_address() {
    let app = test_app();
    let (status, body) = send(&app, get("/v1/accounts/0x1234")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_balance_reports_ether() {
    let app = test_app();
    let (_, body) = send(&app, get(&format!("/v1/accounts/{SELLER}"))).await;
    assert_eq!(body["balance"], "100");
    assert_eq!(body["balance_ether"], "0.0000000000000001");
}

// -- Auth ---------------------------------------------------------------------

#[tokio::test]
async fn test_auth_required_when_configured() {
    let app = test_app_with_auth("s3cret");
    let (status, _) = send(&app, get("/v1/orders")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/v1/orders")
        .header("Authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_bypasses_auth() {
    let app = test_app_with_auth("s3cret");
    let response = app.oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_document_served() {
    let app = test_app();
    let (status, body) = send(&app, get("/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Pact Escrow API");
    assert!(body["paths"]["/v1/orders/{id}/refund-buyer"].is_object());
}
