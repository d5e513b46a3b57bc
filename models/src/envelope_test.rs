use super::*;
use serde_json::json;

#[test]
fn ok_envelope_serializes_without_error_fields() {
    let env = ApiEnvelope::ok(json!({"id": 1}));
    let value = serde_json::to_value(&env).unwrap();
    assert_eq!(value, json!({"success": true, "data": {"id": 1}}));
}

#[test]
fn failure_envelope_carries_error_text() {
    let env = ApiEnvelope::failure("Product not found");
    let value = serde_json::to_value(&env).unwrap();
    assert_eq!(value, json!({"success": false, "error": "Product not found"}));
    assert_eq!(env.failure_text(), Some("Product not found"));
}

#[test]
fn failure_text_falls_back_to_message() {
    let env: ApiEnvelope<serde_json::Value> =
        serde_json::from_str(r#"{"success":false,"message":"Cart is empty"}"#).unwrap();
    assert_eq!(env.failure_text(), Some("Cart is empty"));
}

#[test]
fn envelope_without_data_deserializes() {
    let env: ApiEnvelope<Vec<u32>> = serde_json::from_str(r#"{"success":true}"#).unwrap();
    assert!(env.success);
    assert!(env.data.is_none());
}

#[test]
fn page_query_defaults_and_clamps() {
    assert_eq!(PageQuery::default().normalize(), (1, DEFAULT_PER_PAGE));
    let q = PageQuery { page: Some(0), per_page: Some(1000) };
    assert_eq!(q.normalize(), (1, MAX_PER_PAGE));
    let q = PageQuery { page: Some(3), per_page: Some(10) };
    assert_eq!(q.offset(), 20);
}

#[test]
fn total_pages_rounds_up() {
    let paged: Paged<u8> = Paged { items: vec![], total: 41, page: 1, per_page: 20 };
    assert_eq!(paged.total_pages(), 3);
    let empty: Paged<u8> = Paged { items: vec![], total: 0, page: 1, per_page: 20 };
    assert_eq!(empty.total_pages(), 0);
}
