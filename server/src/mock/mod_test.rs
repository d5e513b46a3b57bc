use super::*;
use axum::body::Body;
use axum::http::{Request, header};
use serde_json::Value;
use tower::ServiceExt;

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({"email": email, "password": store::SEED_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn login_then_me_returns_seeded_user() {
    let app = router();
    let token = login(&app, store::SEED_CLIENT_EMAIL).await;
    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], store::SEED_CLIENT_EMAIL);
    assert_eq!(body["data"]["role"], "client");
}

#[tokio::test]
async fn missing_token_yields_401_envelope() {
    let app = router();
    let (status, body) = send(&app, "GET", "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn expired_sessions_are_rejected() {
    let app = router();
    let token = login(&app, store::SEED_CLIENT_EMAIL).await;
    let (status, _) = send(&app, "POST", "/api/test/expire-sessions", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_listing_requires_admin() {
    let app = router();
    let client = login(&app, store::SEED_CLIENT_EMAIL).await;
    let (status, _) = send(&app, "GET", "/api/users", Some(&client), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = login(&app, store::SEED_ADMIN_EMAIL).await;
    let (status, body) = send(&app, "GET", "/api/users?role=artisan", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn catalogue_is_public_and_filterable() {
    let app = router();
    let (status, body) = send(&app, "GET", "/api/products?sort=price_desc&per_page=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["items"][0]["price_cents"], 4500);
}

#[tokio::test]
async fn clearing_cart_twice_returns_204_both_times() {
    let app = router();
    let token = login(&app, store::SEED_CLIENT_EMAIL).await;
    for _ in 0..2 {
        let (status, _) = send(&app, "DELETE", "/api/cart", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn malformed_body_gets_failure_envelope() {
    let app = router();
    let (status, body) = send(&app, "POST", "/api/auth/login", None, Some(serde_json::json!({"email": 3}))).await;
    assert!(status.is_client_error());
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn checkout_and_transition_over_http() {
    let app = router();
    let client = login(&app, store::SEED_CLIENT_EMAIL).await;
    let artisan = login(&app, store::SEED_ARTISAN_EMAIL).await;
    let (_, products) = send(&app, "GET", "/api/products", None, None).await;
    let product_id = products["data"]["items"][0]["id"].as_str().unwrap().to_owned();

    let (status, _) = send(
        &app,
        "POST",
        "/api/cart/items",
        Some(&client),
        Some(serde_json::json!({"product_id": product_id, "quantity": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, order) = send(
        &app,
        "POST",
        "/api/orders/checkout",
        Some(&client),
        Some(serde_json::json!({"shipping_address": "1 Main St", "payment_method": "card"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "card without intent: {order}");

    let (status, order) = send(
        &app,
        "POST",
        "/api/orders/checkout",
        Some(&client),
        Some(serde_json::json!({"shipping_address": "1 Main St", "payment_method": "cash_on_delivery"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = order["data"]["id"].as_str().unwrap().to_owned();

    let uri = format!("/api/orders/{order_id}/status");
    let (status, body) = send(&app, "PUT", &uri, Some(&artisan), Some(serde_json::json!({"status": "delivered"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cannot change order status from pending to delivered");

    let (status, body) = send(&app, "PUT", &uri, Some(&artisan), Some(serde_json::json!({"status": "accepted"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "accepted");
}
