//! End-to-end tests for the HTTP surface, running against an in-memory
//! database with no network listener.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tindera_core::ShippingFeeTable;
use tindera_db::{Database, DbConfig};
use tindera_server::state::AppState;

async fn test_app() -> Router {
    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database should open");
    tindera_server::app(AppState::new(db, ShippingFeeTable::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn seed_stock(app: &Router, name: &str, price_cents: i64, quantity: i64) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/stock",
        Some(json!({
            "name": name,
            "category": "grocery",
            "unitPriceCents": price_cents,
            "quantity": quantity,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

fn order_body(product_id: &str, quantity: i64, fulfillment: &str) -> Value {
    json!({
        "customerName": "Maria Santos",
        "contact": "0917-555-0101",
        "address": "12 Mabini St",
        "place": "Lamingan",
        "fulfillment": fulfillment,
        "lines": [{ "productId": product_id, "quantity": quantity }],
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_order_resolves_shipping_fee_by_place() {
    let app = test_app().await;
    let product_id = seed_stock(&app, "Rice 5kg", 25_000, 10).await;

    let (status, order) = send(
        &app,
        "POST",
        "/api/orders",
        Some(order_body(&product_id, 2, "delivery")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["subtotalCents"], 50_000);
    assert_eq!(order["shippingFeeCents"], 7000);
    assert_eq!(order["totalCents"], 57_000);
}

#[tokio::test]
async fn insufficient_stock_returns_409_with_shortfall() {
    let app = test_app().await;
    let product_id = seed_stock(&app, "Soap", 2500, 1).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(order_body(&product_id, 3, "pickup")),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(body["details"]["productId"], product_id.as_str());
    assert_eq!(body["details"]["requested"], 3);
    assert_eq!(body["details"]["available"], 1);
}

#[tokio::test]
async fn settle_flow_over_http() {
    let app = test_app().await;
    let product_id = seed_stock(&app, "Canned Tuna", 5000, 10).await;

    let (_, order) = send(
        &app,
        "POST",
        "/api/orders",
        Some(order_body(&product_id, 2, "pickup")),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    // Wrong name at the counter.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/orders/{order_id}/verify"),
        Some(json!({ "customerName": "Juan Cruz" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // Right name settles.
    let (status, sale) = send(
        &app,
        "POST",
        &format!("/api/orders/{order_id}/settle"),
        Some(json!({ "customerName": "maria santos", "cashierId": "cashier-ana" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sale["sourceOrderId"], order_id);

    // Settling again is a conflict, not a 404: the caller should not retry.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/orders/{order_id}/settle"),
        Some(json!({ "customerName": "maria santos", "cashierId": "cashier-ana" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // Payment opened as paid.
    let sale_id = sale["id"].as_str().unwrap();
    let (status, payment) = send(&app, "GET", &format!("/api/payments/sale/{sale_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "paid");
}

#[tokio::test]
async fn delivery_flow_over_http() {
    let app = test_app().await;
    let product_id = seed_stock(&app, "Rice 5kg", 25_000, 10).await;

    let (_, order) = send(
        &app,
        "POST",
        "/api/orders",
        Some(order_body(&product_id, 2, "delivery")),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    let (status, delivery) = send(
        &app,
        "POST",
        &format!("/api/orders/{order_id}/dispatch"),
        Some(json!({ "staffId": "dispatcher-ben", "rider": "rider-jo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivery["status"], "pending");
    assert_eq!(delivery["paymentLabel"], "cash_on_delivery");
    let delivery_id = delivery["id"].as_str().unwrap();

    // COD starts unpaid.
    let (_, payment) = send(
        &app,
        "GET",
        &format!("/api/payments/delivery/{delivery_id}"),
        None,
    )
    .await;
    assert_eq!(payment["status"], "unpaid");

    // First attempt fails.
    let (status, record) = send(
        &app,
        "POST",
        &format!("/api/deliveries/{delivery_id}/not-delivered"),
        Some(json!({ "reason": "customer not home", "staffId": "rider-jo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["reason"], "customer not home");

    let (_, returns) = send(&app, "GET", "/api/returns", None).await;
    assert_eq!(returns.as_array().unwrap().len(), 1);

    // Filterable listing.
    let (_, failed) = send(&app, "GET", "/api/deliveries?status=not_delivered", None).await;
    assert_eq!(failed.as_array().unwrap().len(), 1);

    // Re-delivery succeeds and supersedes the return record.
    let (status, sale) = send(
        &app,
        "POST",
        &format!("/api/deliveries/{delivery_id}/delivered"),
        Some(json!({ "staffId": "rider-jo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sale["sourceDeliveryId"], delivery_id);
    assert_eq!(sale["totalCents"], 57_000);

    let (_, returns) = send(&app, "GET", "/api/returns", None).await;
    assert!(returns.as_array().unwrap().is_empty());

    let (_, delivered) = send(&app, "GET", "/api/deliveries?status=delivered", None).await;
    assert_eq!(delivered.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cancel_restores_stock_over_http() {
    let app = test_app().await;
    let product_id = seed_stock(&app, "Soap", 2500, 5).await;

    let (_, order) = send(
        &app,
        "POST",
        "/api/orders",
        Some(order_body(&product_id, 5, "pickup")),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/orders/{order_id}/cancel"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, item) = send(&app, "GET", &format!("/api/stock/{product_id}"), None).await;
    assert_eq!(item["quantity"], 5);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/orders/{order_id}/cancel"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn stock_adjustment_cannot_go_negative() {
    let app = test_app().await;
    let product_id = seed_stock(&app, "Eggs", 900, 3).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/stock/{product_id}/adjust"),
        Some(json!({ "delta": -2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 1);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/stock/{product_id}/adjust"),
        Some(json!({ "delta": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn walk_up_sale_over_http() {
    let app = test_app().await;
    let product_id = seed_stock(&app, "Instant Noodles", 1500, 20).await;

    let (status, sale) = send(
        &app,
        "POST",
        "/api/sales/walk-up",
        Some(json!({
            "customerName": "Walk-in",
            "contact": "",
            "cashierId": "cashier-ana",
            "lines": [{ "productId": product_id, "quantity": 4 }],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(sale["totalCents"], 6000);
    assert_eq!(sale["fulfillment"], "pickup");

    let (_, sales) = send(&app, "GET", "/api/sales", None).await;
    assert_eq!(sales.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_product_is_a_bad_request() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(order_body("9b2d7c1e-0000-0000-0000-000000000000", 1, "pickup")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNKNOWN_PRODUCT");
}
