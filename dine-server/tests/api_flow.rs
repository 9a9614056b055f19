//! HTTP flow tests: router driven through `oneshot` against a temp-dir database

use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use dine_server::api::build_router;
use dine_server::catalog::{CatalogEntry, MemoryCatalog};
use dine_server::db::Storage;
use dine_server::{Config, ServerState};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

struct Caller {
    id: i64,
    role: &'static str,
}

const CUSTOMER: Caller = Caller { id: 10, role: "customer" };
const OTHER_CUSTOMER: Caller = Caller { id: 11, role: "customer" };
const CASHIER: Caller = Caller { id: 20, role: "cashier" };
const STAFF: Caller = Caller { id: 30, role: "staff" };

struct TestApp {
    router: Router,
    state: ServerState,
    _dir: TempDir,
}

fn app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let config = Config::with_overrides(dir.path().to_string_lossy(), 0);
    let storage = Storage::open(config.database_path()).unwrap();
    let entry = |id, name: &str, cents| CatalogEntry {
        id,
        name: name.to_string(),
        price: Decimal::new(cents, 2),
        available: true,
    };
    let catalog = MemoryCatalog::with_entries([
        entry(1, "Nasi Goreng", 1000),
        entry(2, "Es Teh", 500),
    ]);
    let state = ServerState::new(config, storage, Arc::new(catalog));
    TestApp {
        router: build_router(state.clone()),
        state,
        _dir: dir,
    }
}

async fn call(
    app: &TestApp,
    method: &str,
    uri: &str,
    caller: Option<&Caller>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder
            .header("x-user-id", caller.id.to_string())
            .header("x-user-name", "Tester")
            .header("x-user-role", caller.role);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

fn dine_in() -> Value {
    json!({
        "order_type": "dine_in",
        "table_id": 4,
        "items": [
            { "menu_item_id": 1, "quantity": 2 },
            { "menu_item_id": 2, "quantity": 1 }
        ]
    })
}

async fn create_order(app: &TestApp, caller: &Caller) -> i64 {
    let (status, order) = call(app, "POST", "/api/orders", Some(caller), Some(dine_in())).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    order["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = app();
    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = call(&app, "GET", "/health/detailed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"]["status"], "ok");
    assert_eq!(body["checks"]["kitchen"]["client_count"], 0);
}

#[tokio::test]
async fn test_identity_headers_required() {
    let app = app();
    let (status, body) = call(&app, "POST", "/api/orders", None, Some(dine_in())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let bad_role = Caller { id: 1, role: "wizard" };
    let (status, _) = call(&app, "GET", "/api/orders", Some(&bad_role), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_read_order() {
    let app = app();
    let (status, order) = call(&app, "POST", "/api/orders", Some(&CUSTOMER), Some(dine_in())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");
    assert_eq!(dec(&order["subtotal"]), Decimal::new(2500, 2));
    assert_eq!(dec(&order["tax"]), Decimal::new(250, 2));
    assert_eq!(dec(&order["total"]), Decimal::new(2750, 2));

    let id = order["id"].as_i64().unwrap();
    let (status, fetched) = call(&app, "GET", &format!("/api/orders/{id}"), Some(&CUSTOMER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id);

    let (status, _) = call(&app, "GET", &format!("/api/orders/{id}"), Some(&OTHER_CUSTOMER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, list) = call(&app, "GET", "/api/orders?status=pending", Some(&STAFF), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, list) = call(&app, "GET", "/api/orders", Some(&OTHER_CUSTOMER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = app();
    let takeaway_without_phone = json!({
        "order_type": "takeaway",
        "items": [{ "menu_item_id": 1, "quantity": 1 }]
    });
    let (status, body) = call(&app, "POST", "/api/orders", Some(&CUSTOMER), Some(takeaway_without_phone)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("phone"));

    let unknown_item = json!({
        "order_type": "dine_in",
        "table_id": 1,
        "items": [{ "menu_item_id": 99, "quantity": 1 }]
    });
    let (status, body) = call(&app, "POST", "/api/orders", Some(&CUSTOMER), Some(unknown_item)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 6001);
    assert_eq!(body["details"]["menu_item_id"], 99);
}

#[tokio::test]
async fn test_status_endpoint() {
    let app = app();
    let id = create_order(&app, &CUSTOMER).await;
    let uri = format!("/api/orders/{id}/status");

    let (status, body) = call(&app, "PATCH", &uri, Some(&STAFF), Some(json!({ "status": "ready" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4009);

    let (status, _) = call(&app, "PATCH", &uri, Some(&STAFF), Some(json!({ "status": "eaten" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "PATCH", "/api/orders/999/status", Some(&STAFF), Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Customers may only cancel
    let (status, _) = call(&app, "PATCH", &uri, Some(&CUSTOMER), Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, order) = call(&app, "PATCH", &uri, Some(&STAFF), Some(json!({ "status": "Confirmed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "confirmed");

    let (status, kitchen) = call(&app, "GET", "/api/kitchen/orders", Some(&STAFF), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kitchen["orders"][0]["id"], id);
}

#[tokio::test]
async fn test_digital_payment_via_webhook() {
    let app = app();
    let id = create_order(&app, &CUSTOMER).await;

    let (status, qris) = call(&app, "POST", "/api/payments/qris", Some(&CUSTOMER), Some(json!({ "order_id": id }))).await;
    assert_eq!(status, StatusCode::CREATED, "{qris}");
    assert_eq!(dec(&qris["amount"]), Decimal::new(2750, 2));
    let tx = qris["transaction_id"].as_str().unwrap().to_string();

    // Wrong amount is rejected, webhook needs no identity headers
    let (status, body) = call(
        &app,
        "POST",
        "/api/payments/webhook",
        None,
        Some(json!({ "transaction_id": tx, "external_id": "EXT", "amount": "1.00", "status": "success" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5007);

    let (status, result) = call(
        &app,
        "POST",
        "/api/payments/webhook",
        None,
        Some(json!({ "transaction_id": tx, "external_id": "EXT", "amount": "27.50", "status": "SUCCESS" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{result}");
    assert_eq!(result["order_advanced"], true);
    assert_eq!(result["payment"]["status"], "completed");
    assert_eq!(result["order"]["status"], "confirmed");

    let (status, payment) = call(&app, "GET", &format!("/api/payments/transaction/{tx}"), Some(&CUSTOMER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["external_id"], "EXT");
}

#[tokio::test]
async fn test_partial_success_is_reported() {
    let app = app();
    let id = create_order(&app, &CUSTOMER).await;
    let (_, qris) = call(&app, "POST", "/api/payments/qris", Some(&CUSTOMER), Some(json!({ "order_id": id }))).await;
    let tx = qris["transaction_id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        "PATCH",
        &format!("/api/orders/{id}/status"),
        Some(&CUSTOMER),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        "POST",
        "/api/payments/verify",
        Some(&STAFF),
        Some(json!({ "transaction_id": tx, "amount": "27.50", "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(body["code"], 5009);
    assert_eq!(body["details"]["order_id"], id);
    assert_eq!(body["details"]["payment_status"], "completed");
    assert_eq!(body["details"]["order_advanced"], false);
}

#[tokio::test]
async fn test_cash_refund_and_reconciliation() {
    let app = app();
    let id = create_order(&app, &CUSTOMER).await;
    let cash = json!({ "order_id": id, "amount_tendered": "30.00" });

    let (status, _) = call(&app, "POST", "/api/payments/cash", Some(&CUSTOMER), Some(cash.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        "POST",
        "/api/payments/cash",
        Some(&CASHIER),
        Some(json!({ "order_id": id, "amount_tendered": "20.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5002);

    let (status, receipt) = call(&app, "POST", "/api/payments/cash", Some(&CASHIER), Some(cash.clone())).await;
    assert_eq!(status, StatusCode::OK, "{receipt}");
    assert_eq!(dec(&receipt["change_given"]), Decimal::new(250, 2));
    assert_eq!(receipt["order"]["status"], "confirmed");
    let payment_id = receipt["payment"]["id"].as_i64().unwrap();

    let (status, body) = call(&app, "POST", "/api/payments/cash", Some(&CASHIER), Some(cash)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4008);

    let refund_uri = format!("/api/payments/{payment_id}/refund");
    let (status, body) = call(&app, "POST", &refund_uri, Some(&STAFF), Some(json!({ "amount": "30.00", "reason": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
    assert_eq!(body["details"]["refundable"], "27.50");

    let (status, refund) = call(&app, "POST", &refund_uri, Some(&STAFF), Some(json!({ "amount": "10.00", "reason": "cold soup" }))).await;
    assert_eq!(status, StatusCode::OK, "{refund}");
    assert_eq!(dec(&refund["amount"]), Decimal::new(-1000, 2));

    let (status, summary) = call(&app, "GET", &format!("/api/payments/order/{id}"), Some(&CUSTOMER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&summary["net_collected"]), Decimal::new(1750, 2));

    let (status, record) = call(
        &app,
        "POST",
        "/api/payments/reconciliations",
        Some(&CASHIER),
        Some(json!({
            "cashier_id": CASHIER.id,
            "actual_cash_counted": "27.50",
            "expected_cash_amount": "27.50",
            "shift_start": 0,
            "shift_end": i64::MAX
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{record}");
    assert_eq!(record["payment_count"], 1);
    assert_eq!(dec(&record["difference"]), Decimal::ZERO);

    let (status, list) = call(&app, "GET", "/api/payments/reconciliations", Some(&CASHIER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_soft_delete_requires_staff() {
    let app = app();
    let id = create_order(&app, &CUSTOMER).await;
    let uri = format!("/api/orders/{id}");

    let (status, _) = call(&app, "DELETE", &uri, Some(&CUSTOMER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "DELETE", &uri, Some(&STAFF), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "GET", &uri, Some(&STAFF), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manual_kitchen_broadcast() {
    let app = app();
    let id = create_order(&app, &CUSTOMER).await;

    let (status, _) = call(&app, "POST", "/api/kitchen/broadcast", Some(&CUSTOMER), Some(json!({ "order_id": id }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_id, mut rx) = app.state.kitchen.subscribe().unwrap();
    let token = tokio_util::sync::CancellationToken::new();
    let dispatcher = tokio::spawn(app.state.kitchen.clone().run(token.clone()));
    rx.recv().await.unwrap(); // initial snapshot

    let (status, body) = call(
        &app,
        "POST",
        "/api/kitchen/broadcast",
        Some(&STAFF),
        Some(json!({ "order_id": id, "update_type": "new_order" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["update_type"], "new_order");
    assert_eq!(body["queued"], true);
    assert_eq!(body["client_count"], 1);

    let message = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.order_id(), Some(id));

    token.cancel();
    dispatcher.await.unwrap();
}
