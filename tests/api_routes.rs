//! Router tests for requests that are answered before any query runs.
//!
//! The pool is lazy and points nowhere, so a test that accidentally reached
//! the database would fail with a storage error instead of its expected status.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use opensase_shop::api::{self, AppState};
use opensase_shop::events::EventPublisher;

fn app() -> Router {
    api::router(AppState { db: common::lazy_pool(), events: EventPublisher::disabled() })
}

fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("X-User-Id", user);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(req: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_cart_requires_user_header() {
    let (status, body) = send(request(Method::GET, "/api/v1/cart", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "unauthorized");
}

#[tokio::test]
async fn test_malformed_user_header_is_rejected() {
    let (status, body) = send(request(Method::GET, "/api/v1/orders", Some("not-a-uuid"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Unauthorized: malformed X-User-Id header");
}

#[tokio::test]
async fn test_catalog_writes_require_user() {
    let body = json!({"category_id": Uuid::new_v4(), "name": "Lamp", "price": "12.50"});
    let (status, _) = send(request(Method::POST, "/api/v1/products", None, Some(body))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(request(Method::DELETE, &format!("/api/v1/categories/{}", Uuid::new_v4()), None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_item_rejects_bad_quantities() {
    let user = Uuid::new_v4().to_string();
    let product_id = Uuid::new_v4();
    for body in [
        json!({"product_id": product_id, "quantity": 0}),
        json!({"product_id": product_id, "quantity": -3}),
        json!({"product_id": product_id}),
        json!({"product_id": product_id, "quantity": 3_000_000_000_i64}),
    ] {
        let (status, response) = send(request(Method::POST, "/api/v1/cart/add-item", Some(&user), Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"]["kind"], "invalid_quantity");
    }
}

#[tokio::test]
async fn test_malformed_path_id_is_a_json_validation_error() {
    let user = Uuid::new_v4().to_string();
    for (method, uri, caller) in [
        (Method::GET, "/api/v1/products/not-a-uuid", None),
        (Method::GET, "/api/v1/categories/42/descendants", None),
        (Method::GET, "/api/v1/orders/not-a-uuid", Some(user.as_str())),
        (Method::POST, "/api/v1/addresses/not-a-uuid/set-default", Some(user.as_str())),
    ] {
        let (status, body) = send(request(method, uri, caller, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["kind"], "validation", "{uri}");
    }
}

#[tokio::test]
async fn test_invalid_parent_filter() {
    let (status, body) = send(request(Method::GET, "/api/v1/categories?parent=kitchen", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation");
}

#[tokio::test]
async fn test_checkout_requires_shipping_address() {
    let user = Uuid::new_v4().to_string();
    let (status, body) = send(request(Method::POST, "/api/v1/orders", Some(&user), Some(json!({})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation");
}

#[tokio::test]
async fn test_address_fields_are_validated() {
    let user = Uuid::new_v4().to_string();
    let body = json!({
        "address_type": "office",
        "street_address": "1 Marina Road",
        "city": "",
        "state": "Lagos",
        "country": "NG",
        "postal_code": "101001",
    });
    let (status, response) = send(request(Method::POST, "/api/v1/addresses", Some(&user), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"]["kind"], "validation");

    let body = json!({
        "address_type": "castle",
        "street_address": "1 Marina Road",
        "city": "Lagos",
        "state": "Lagos",
        "country": "NG",
        "postal_code": "101001",
    });
    let (status, _) = send(request(Method::POST, "/api/v1/addresses", Some(&user), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_order_status_is_rejected() {
    let user = Uuid::new_v4().to_string();
    let uri = format!("/api/v1/orders/{}/status", Uuid::new_v4());
    let (status, body) = send(request(Method::PATCH, &uri, Some(&user), Some(json!({"status": "lost"})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation");
}

#[tokio::test]
async fn test_register_validates_email() {
    let body = json!({"username": "ada", "email": "not-an-email"});
    let (status, body) = send(request(Method::POST, "/api/v1/users/register", None, Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation");
}
