use super::*;
use crate::components::view::render_text;
use models::{PaymentMethod, User};
use uuid::Uuid;

fn product(price: i64, discount: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        artisan_id: Uuid::new_v4(),
        artisan_name: Some("Ana".to_owned()),
        category_id: None,
        category_name: Some("Pottery".to_owned()),
        name: "Mug".to_owned(),
        description: None,
        price_cents: price,
        discount_percent: discount,
        discounted_price_cents: models::money::discounted_unit_price(price, discount),
        stock: 3,
        image_url: None,
        is_active: true,
        created_at: None,
    }
}

fn order(status: OrderStatus) -> Order {
    Order {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        customer_name: Some("Test Client".to_owned()),
        status,
        total_cents: 3600,
        shipping_address: "1 Main St".to_owned(),
        payment_method: PaymentMethod::CashOnDelivery,
        payment_intent_id: None,
        items: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

fn session(role: Role) -> Session {
    Session {
        token: "t".to_owned(),
        user: User {
            id: Uuid::new_v4(),
            name: "Sam".to_owned(),
            email: "sam@example.com".to_owned(),
            role,
            phone: None,
            address: None,
            created_at: None,
        },
    }
}

#[test]
fn price_label_shows_discount_when_present() {
    assert_eq!(price_label(&product(1800, 0)), "$18.00");
    assert_eq!(price_label(&product(4500, 20)), "$36.00 (was $45.00, -20%)");
}

#[test]
fn nav_links_follow_role() {
    let anon: Vec<_> = nav_links(None).into_iter().map(|(href, _)| href).collect();
    assert_eq!(anon, vec!["/", "/login", "/register"]);

    let admin: Vec<_> = nav_links(Some(&session(Role::Admin))).into_iter().map(|(href, _)| href).collect();
    assert!(admin.contains(&"/admin"));
    assert!(!admin.contains(&"/artisan"));

    let client: Vec<_> = nav_links(Some(&session(Role::Client))).into_iter().map(|(href, _)| href).collect();
    assert!(!client.contains(&"/admin"));
}

#[test]
fn navbar_offers_logout_only_with_session() {
    assert!(navbar(None).actions().is_empty());
    assert_eq!(navbar(Some(&session(Role::Client))).actions(), vec!["logout".to_owned()]);
}

#[test]
fn status_actions_follow_transition_table_for_artisans() {
    assert_eq!(status_actions(&order(OrderStatus::Pending), Role::Artisan), vec![OrderStatus::Accepted, OrderStatus::Refused]);
    assert!(status_actions(&order(OrderStatus::Delivered), Role::Artisan).is_empty());
    assert!(status_actions(&order(OrderStatus::Pending), Role::Client).is_empty());
    assert_eq!(status_actions(&order(OrderStatus::Pending), Role::Admin).len(), 4);
}

#[test]
fn order_table_encodes_status_actions() {
    let o = order(OrderStatus::Accepted);
    let view = order_table(std::slice::from_ref(&o), Role::Artisan);
    assert_eq!(view.actions(), vec![format!("order-status:{}:shipped", o.id)]);
}

#[test]
fn pagination_links_keep_other_params() {
    let paged = Paged { items: vec![(); 0], total: 45, page: 2, per_page: 20 };
    let params = vec![("search".to_owned(), "mug".to_owned()), ("page".to_owned(), "2".to_owned())];
    let out = render_text(&pagination("/", &params, &paged));
    assert!(out.contains("Page 2 of 3 (45 total)"));
    assert!(out.contains("Previous </?search=mug&page=1>"));
    assert!(out.contains("Next </?search=mug&page=3>"));
}
