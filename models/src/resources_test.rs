use super::*;
use serde_json::json;

fn item(quantity: i32, line_total_cents: i64) -> CartItem {
    CartItem {
        product_id: Uuid::new_v4(),
        name: "Bowl".into(),
        quantity,
        price_cents: line_total_cents,
        discount_percent: 0,
        discounted_price_cents: line_total_cents,
        line_total_cents,
        stock: 10,
        image_url: None,
    }
}

#[test]
fn cart_from_items_sums_totals_and_quantities() {
    let cart = Cart::from_items(vec![item(2, 1000), item(3, 450)]);
    assert_eq!(cart.total_cents, 1450);
    assert_eq!(cart.item_count, 5);
    assert!(!cart.is_empty());
    assert!(Cart::default().is_empty());
}

#[test]
fn add_cart_item_defaults_quantity_to_one() {
    let id = Uuid::new_v4();
    let req: AddCartItemRequest = serde_json::from_value(json!({"product_id": id})).unwrap();
    assert_eq!(req.quantity, 1);
    assert_eq!(req.product_id, id);
}

#[test]
fn user_tolerates_missing_optional_fields() {
    let id = Uuid::new_v4();
    let user: User = serde_json::from_value(json!({
        "id": id, "name": "Test", "email": "test@example.com", "role": "client"
    }))
    .unwrap();
    assert_eq!(user.role, Role::Client);
    assert!(user.phone.is_none());
}

#[test]
fn register_request_omits_absent_role() {
    let req = RegisterRequest { name: "A".into(), email: "a@b.c".into(), password: "secret1".into(), role: None };
    let value = serde_json::to_value(&req).unwrap();
    assert!(value.get("role").is_none());
}

#[test]
fn product_sort_uses_snake_case() {
    assert_eq!(serde_json::to_value(ProductSort::PriceDesc).unwrap(), json!("price_desc"));
    assert_eq!(ProductSort::default(), ProductSort::Newest);
}

#[test]
fn order_deserializes_without_items() {
    let value = json!({
        "id": Uuid::nil(),
        "user_id": Uuid::nil(),
        "status": "pending",
        "total_cents": 1200,
        "shipping_address": "1 Main St",
        "payment_method": "cash_on_delivery"
    });
    let order: Order = serde_json::from_value(value).unwrap();
    assert!(order.items.is_empty());
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
}

#[test]
fn page_query_is_extracted_from_listing_filters() {
    let q = ProductQuery { page: Some(2), per_page: Some(5), ..ProductQuery::default() };
    assert_eq!(q.page_query().offset(), 5);
}
