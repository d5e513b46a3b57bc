//! End-to-end storefront flows against the server's in-memory mock backend.
//!
//! Each test serves a freshly seeded mock on an ephemeral port and drives the
//! real `App` (router, guards, session store, API client) over HTTP.

use std::sync::{Arc, Mutex};

use axum::extract::Request;
use axum::middleware::{self, Next};
use client::app::{Action, App, FORBIDDEN_PATH};
use client::router::RedirectReason;
use client::state::session::SessionStore;
use models::{CheckoutRequest, OrderQuery, OrderStatus, PaymentMethod, Product, ProductQuery};
use uuid::Uuid;

const PASSWORD: &str = "password123";

type Hits = Arc<Mutex<Vec<String>>>;

struct Mock {
    base_url: String,
    hits: Hits,
}

impl Mock {
    fn app(&self) -> App {
        App::with_session(&self.base_url, SessionStore::in_memory())
    }

    fn hit(&self, path: &str) -> bool {
        self.hits.lock().unwrap().iter().any(|p| p == path)
    }
}

async fn spawn_mock() -> Mock {
    let hits: Hits = Arc::default();
    let log = hits.clone();
    let router = axum::Router::new()
        .nest("/mock", server::mock::router())
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(req.uri().path().to_owned());
                next.run(req).await
            }
        }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    Mock { base_url: format!("http://{addr}/mock"), hits }
}

async fn login(app: &App, email: &str) {
    app.dispatch(Action::Login { email: email.to_owned(), password: PASSWORD.to_owned(), redirect: None })
        .await
        .unwrap();
}

async fn product(app: &App, name: &str) -> Product {
    let products = app.services().api.products().list(&ProductQuery::default()).await.unwrap();
    products.items.into_iter().find(|p| p.name == name).unwrap()
}

/// Client places one pending order for a single mug; returns its id.
async fn place_order(app: &App) -> Uuid {
    let mug = product(app, "Stoneware Mug").await;
    app.dispatch(Action::AddToCart { product_id: mug.id, quantity: 1 }).await.unwrap();
    app.dispatch(Action::Checkout(CheckoutRequest {
        shipping_address: "1 Kiln Lane".to_owned(),
        payment_method: PaymentMethod::CashOnDelivery,
        payment_intent_id: None,
    }))
    .await
    .unwrap();
    let orders = app.services().api.orders().list(&OrderQuery::default()).await.unwrap();
    orders.items[0].id
}

#[tokio::test]
async fn protected_route_round_trips_through_login() {
    let mock = spawn_mock().await;
    let app = mock.app();

    let nav = app.open("/orders?status=pending").await.unwrap();
    assert_eq!(nav.route_path, "/login");
    assert_eq!(nav.path, "/login?redirect=%2Forders%3Fstatus%3Dpending");
    assert!(!mock.hit("/mock/api/orders"));

    let redirect = nav.query.iter().find(|(k, _)| k == "redirect").map(|(_, v)| v.clone());
    let nav = app
        .dispatch(Action::Login { email: "test@example.com".to_owned(), password: PASSWORD.to_owned(), redirect })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(nav.path, "/orders?status=pending");
    assert_eq!(nav.error, None);
}

#[tokio::test]
async fn wrong_role_is_sent_home_without_loading() {
    let mock = spawn_mock().await;
    let app = mock.app();
    login(&app, "test@example.com").await;

    let nav = app.open("/admin").await.unwrap();
    assert_eq!(nav.route_path, "/");
    let last = app.router().redirects().pop().unwrap();
    assert_eq!(last.reason, RedirectReason::Forbidden);
    assert!(!mock.hit("/mock/api/users"));
    assert!(!mock.hit("/mock/api/issues"));
}

#[tokio::test]
async fn signed_in_shopper_sees_own_profile() {
    let mock = spawn_mock().await;
    let app = mock.app();
    login(&app, "test@example.com").await;

    let nav = app.open("/profile").await.unwrap();
    assert_eq!(nav.route_path, "/profile");
    let text = app.render_text();
    assert!(text.contains("Welcome back, Test Client."));
    assert!(text.contains("Email: test@example.com"));
    assert!(text.contains("Test Client (client)"));
    assert!(text.contains("[Log out]"));
}

#[tokio::test]
async fn expired_session_redirects_to_login_exactly_once() {
    let mock = spawn_mock().await;
    let app = mock.app();
    login(&app, "test@example.com").await;
    app.open("/cart").await.unwrap();

    reqwest::Client::new()
        .post(format!("{}/api/test/expire-sessions", mock.base_url))
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    let nav = app.open("/orders").await.unwrap();
    assert_eq!(nav.path, "/login?redirect=%2Forders");
    assert!(app.services().session.current().is_none());

    let err = app.dispatch(Action::ClearCart).await.unwrap_err();
    assert!(err.is_unauthorized());

    let expired = app.router().redirects().iter().filter(|r| r.reason == RedirectReason::SessionExpired).count();
    assert_eq!(expired, 1);
    assert_eq!(app.router().current().unwrap().route_path, "/login");
}

#[tokio::test]
async fn clearing_an_empty_cart_succeeds() {
    let mock = spawn_mock().await;
    let app = mock.app();
    login(&app, "test@example.com").await;
    let scarf = product(&app, "Wool Scarf").await;
    app.dispatch(Action::AddToCart { product_id: scarf.id, quantity: 2 }).await.unwrap();

    app.dispatch(Action::ClearCart).await.unwrap();
    app.dispatch(Action::ClearCart).await.unwrap();
    assert!(app.services().api.cart().get().await.unwrap().is_empty());
}

#[tokio::test]
async fn checkout_turns_cart_into_one_order() {
    let mock = spawn_mock().await;
    let app = mock.app();
    login(&app, "test@example.com").await;
    let mug = product(&app, "Stoneware Mug").await;
    let bowl = product(&app, "Serving Bowl").await;
    let scarf = product(&app, "Wool Scarf").await;
    for (p, qty) in [(&mug, 2), (&bowl, 1), (&scarf, 1)] {
        app.dispatch(Action::AddToCart { product_id: p.id, quantity: qty }).await.unwrap();
    }

    let nav = app
        .dispatch(Action::Checkout(CheckoutRequest {
            shipping_address: "1 Kiln Lane".to_owned(),
            payment_method: PaymentMethod::CashOnDelivery,
            payment_intent_id: None,
        }))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(nav.route_path, "/orders");

    let orders = app.services().api.orders().list(&OrderQuery::default()).await.unwrap();
    assert_eq!(orders.total, 1);
    let order = &orders.items[0];
    assert_eq!(order.items.len(), 3);
    assert_eq!(order.status, OrderStatus::Pending);
    // 2 x 18.00 + 45.00 at 20% off + 32.00 at 10% off
    assert_eq!(order.total_cents, 3600 + 3600 + 2880);
    assert!(app.services().api.cart().get().await.unwrap().is_empty());
    assert_eq!(product(&app, "Stoneware Mug").await.stock, mug.stock - 2);
}

#[tokio::test]
async fn card_checkout_requires_payment_intent() {
    let mock = spawn_mock().await;
    let app = mock.app();
    login(&app, "test@example.com").await;
    let mug = product(&app, "Stoneware Mug").await;
    app.dispatch(Action::AddToCart { product_id: mug.id, quantity: 1 }).await.unwrap();

    let err = app
        .dispatch(Action::Checkout(CheckoutRequest {
            shipping_address: "1 Kiln Lane".to_owned(),
            payment_method: PaymentMethod::Card,
            payment_intent_id: None,
        }))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(!app.services().api.cart().get().await.unwrap().is_empty());
}

#[tokio::test]
async fn order_status_changes_follow_role_rules() {
    let mock = spawn_mock().await;
    let shopper = mock.app();
    login(&shopper, "test@example.com").await;
    let order_id = place_order(&shopper).await;

    let err = shopper
        .dispatch(Action::UpdateOrderStatus { order_id, status: OrderStatus::Accepted })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(shopper.router().current().unwrap().route_path, FORBIDDEN_PATH);

    let artisan = mock.app();
    login(&artisan, "artisan@example.com").await;
    let err = artisan
        .dispatch(Action::UpdateOrderStatus { order_id, status: OrderStatus::Delivered })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    artisan
        .dispatch(Action::UpdateOrderStatus { order_id, status: OrderStatus::Accepted })
        .await
        .unwrap();

    let admin = mock.app();
    login(&admin, "admin@example.com").await;
    admin
        .dispatch(Action::UpdateOrderStatus { order_id, status: OrderStatus::Pending })
        .await
        .unwrap();
    let order = admin.services().api.orders().get(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn artisan_dashboard_lists_own_products() {
    let mock = spawn_mock().await;
    let app = mock.app();
    login(&app, "artisan@example.com").await;

    let nav = app.open("/artisan").await.unwrap();
    assert_eq!(nav.error, None);
    let text = app.render_text();
    assert!(text.contains("Your products (3)"));
    assert!(text.contains("Serving Bowl"));
}

#[tokio::test]
async fn logout_returns_to_login() {
    let mock = spawn_mock().await;
    let app = mock.app();
    login(&app, "test@example.com").await;

    let nav = app.dispatch(Action::Logout).await.unwrap().unwrap();
    assert_eq!(nav.route_path, "/login");
    assert!(app.services().session.current().is_none());
    assert!(mock.hit("/mock/api/auth/logout"));
}
