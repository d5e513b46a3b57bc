use super::*;
use axum::http::StatusCode;

fn user(role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        name: "Someone".into(),
        email: "someone@example.com".into(),
        role,
        phone: None,
        address: None,
        created_at: None,
    }
}

fn order_with(owner: Uuid, artisan: Uuid, status: OrderStatus) -> Order {
    Order {
        id: Uuid::new_v4(),
        user_id: owner,
        customer_name: None,
        status,
        total_cents: 1000,
        shipping_address: "1 Main St".into(),
        payment_method: PaymentMethod::CashOnDelivery,
        payment_intent_id: None,
        items: vec![OrderItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: None,
            artisan_id: artisan,
            quantity: 1,
            unit_price_cents: 1000,
            line_total_cents: 1000,
        }],
        created_at: None,
        updated_at: None,
    }
}

fn checkout_req(method: PaymentMethod, intent: Option<&str>) -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: "1 Main St".into(),
        payment_method: method,
        payment_intent_id: intent.map(str::to_owned),
    }
}

#[test]
fn card_checkout_requires_payment_intent() {
    assert!(matches!(
        validate_checkout(&checkout_req(PaymentMethod::Card, None)),
        Err(OrderError::MissingPaymentIntent)
    ));
    assert!(validate_checkout(&checkout_req(PaymentMethod::Card, Some("  "))).is_err());
    assert!(validate_checkout(&checkout_req(PaymentMethod::Card, Some("pi_123"))).is_ok());
    assert!(validate_checkout(&checkout_req(PaymentMethod::CashOnDelivery, None)).is_ok());
}

#[test]
fn checkout_requires_shipping_address() {
    let mut req = checkout_req(PaymentMethod::CashOnDelivery, None);
    req.shipping_address = "   ".into();
    assert!(matches!(validate_checkout(&req), Err(OrderError::MissingAddress)));
}

#[test]
fn visibility_covers_owner_involved_artisan_and_admin() {
    let client = user(Role::Client);
    let artisan = user(Role::Artisan);
    let order = order_with(client.id, artisan.id, OrderStatus::Pending);

    assert!(can_view(&client, &order));
    assert!(can_view(&artisan, &order));
    assert!(can_view(&user(Role::Admin), &order));
    assert!(!can_view(&user(Role::Client), &order));
    assert!(!can_view(&user(Role::Artisan), &order));
}

#[test]
fn involved_artisan_follows_transition_table() {
    let artisan = user(Role::Artisan);
    let order = order_with(Uuid::new_v4(), artisan.id, OrderStatus::Pending);
    assert!(authorize_status_change(&artisan, &order, OrderStatus::Accepted).is_ok());

    let err = authorize_status_change(&artisan, &order, OrderStatus::Delivered).unwrap_err();
    assert_eq!(err.to_string(), "cannot change order status from pending to delivered");
    assert_eq!(ApiError::from(err).status(), StatusCode::BAD_REQUEST);
}

#[test]
fn admin_bypasses_transition_table() {
    let admin = user(Role::Admin);
    let order = order_with(Uuid::new_v4(), Uuid::new_v4(), OrderStatus::Delivered);
    assert!(authorize_status_change(&admin, &order, OrderStatus::Pending).is_ok());
}

#[test]
fn customers_and_uninvolved_artisans_are_forbidden() {
    let client = user(Role::Client);
    let order = order_with(client.id, Uuid::new_v4(), OrderStatus::Pending);
    let err = authorize_status_change(&client, &order, OrderStatus::Accepted).unwrap_err();
    assert_eq!(ApiError::from(err).status(), StatusCode::FORBIDDEN);

    let outsider = user(Role::Artisan);
    assert!(matches!(
        authorize_status_change(&outsider, &order, OrderStatus::Accepted),
        Err(OrderError::Forbidden)
    ));
}

#[test]
fn stock_moves_only_across_refused() {
    assert_eq!(stock_move(OrderStatus::Pending, OrderStatus::Refused), Some(StockMove::Restock));
    assert_eq!(stock_move(OrderStatus::Shipped, OrderStatus::Refused), Some(StockMove::Restock));
    assert_eq!(stock_move(OrderStatus::Refused, OrderStatus::Accepted), Some(StockMove::Reserve));
    assert_eq!(stock_move(OrderStatus::Refused, OrderStatus::Refused), None);
    assert_eq!(stock_move(OrderStatus::Pending, OrderStatus::Accepted), None);
}

#[test]
fn checkout_errors_map_to_http_statuses() {
    assert_eq!(ApiError::from(OrderError::EmptyCart).status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(OrderError::InsufficientStock(Uuid::nil())).status(), StatusCode::CONFLICT);
    assert_eq!(ApiError::from(OrderError::MissingPaymentIntent).status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// LIVE DATABASE
// =============================================================================

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;
    use crate::services::cart;
    use crate::state::test_helpers::{integration_pool, seed_product, seed_user};

    async fn load_user(pool: &PgPool, id: Uuid) -> User {
        crate::services::users::get_user(pool, id).await.expect("user")
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn checkout_writes_one_order_and_n_items() {
        let pool = integration_pool().await;
        let client_id = seed_user(&pool, Role::Client).await;
        let artisan_id = seed_user(&pool, Role::Artisan).await;
        let a = seed_product(&pool, artisan_id, 1000, 10, 5).await;
        let b = seed_product(&pool, artisan_id, 250, 0, 5).await;
        cart::add_item(&pool, client_id, a, 2).await.unwrap();
        cart::add_item(&pool, client_id, b, 3).await.unwrap();

        let order = checkout(&pool, client_id, &checkout_req(PaymentMethod::CashOnDelivery, None)).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total_cents, 2 * 900 + 3 * 250);
        assert!(cart::get_cart(&pool, client_id).await.unwrap().is_empty());
        let stock: i32 = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(a)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stock, 3);
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn insufficient_stock_rolls_back_everything() {
        let pool = integration_pool().await;
        let client_id = seed_user(&pool, Role::Client).await;
        let artisan_id = seed_user(&pool, Role::Artisan).await;
        let plenty = seed_product(&pool, artisan_id, 100, 0, 10).await;
        let scarce = seed_product(&pool, artisan_id, 100, 0, 1).await;
        cart::add_item(&pool, client_id, plenty, 1).await.unwrap();
        cart::add_item(&pool, client_id, scarce, 2).await.unwrap();

        let err = checkout(&pool, client_id, &checkout_req(PaymentMethod::CashOnDelivery, None)).await.unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock(id) if id == scarce));

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(client_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(orders, 0);
        assert_eq!(cart::get_cart(&pool, client_id).await.unwrap().items.len(), 2);
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn empty_cart_checkout_is_rejected() {
        let pool = integration_pool().await;
        let client_id = seed_user(&pool, Role::Client).await;
        let err = checkout(&pool, client_id, &checkout_req(PaymentMethod::CashOnDelivery, None)).await.unwrap_err();
        assert!(matches!(err, OrderError::EmptyCart));
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn artisan_walks_order_through_lifecycle() {
        let pool = integration_pool().await;
        let client_id = seed_user(&pool, Role::Client).await;
        let artisan_id = seed_user(&pool, Role::Artisan).await;
        let product = seed_product(&pool, artisan_id, 500, 0, 4).await;
        cart::add_item(&pool, client_id, product, 1).await.unwrap();
        let order = checkout(&pool, client_id, &checkout_req(PaymentMethod::CashOnDelivery, None)).await.unwrap();

        let artisan = load_user(&pool, artisan_id).await;
        for next in [OrderStatus::Accepted, OrderStatus::Shipped, OrderStatus::Delivered] {
            let updated = update_status(&pool, &artisan, order.id, next).await.unwrap();
            assert_eq!(updated.status, next);
        }
        let err = update_status(&pool, &artisan, order.id, OrderStatus::Pending).await.unwrap_err();
        assert_eq!(err.to_string(), "cannot change order status from delivered to pending");

        let client = load_user(&pool, client_id).await;
        let listed = list_orders(&pool, &client, &OrderQuery::default()).await.unwrap();
        assert_eq!(listed.total, 1);
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn admin_refuse_accept_cycles_keep_stock_balanced() {
        let pool = integration_pool().await;
        let client_id = seed_user(&pool, Role::Client).await;
        let artisan_id = seed_user(&pool, Role::Artisan).await;
        let admin_id = seed_user(&pool, Role::Admin).await;
        let product = seed_product(&pool, artisan_id, 500, 0, 25).await;
        cart::add_item(&pool, client_id, product, 5).await.unwrap();
        let order = checkout(&pool, client_id, &checkout_req(PaymentMethod::CashOnDelivery, None)).await.unwrap();

        let admin = load_user(&pool, admin_id).await;
        for (next, after) in [
            (OrderStatus::Refused, 25),
            (OrderStatus::Accepted, 20),
            (OrderStatus::Refused, 25),
            (OrderStatus::Pending, 20),
            (OrderStatus::Refused, 25),
        ] {
            update_status(&pool, &admin, order.id, next).await.unwrap();
            let stock: i32 = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                .bind(product)
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(stock, after, "after moving to {next}");
        }
    }
}
