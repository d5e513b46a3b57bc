use super::*;

#[test]
fn status_codes_follow_variant() {
    assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::unauthorized().status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ApiError::forbidden().status(), StatusCode::FORBIDDEN);
    assert_eq!(ApiError::not_found("Order").status(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::Conflict("dup".into()).status(), StatusCode::CONFLICT);
    assert_eq!(ApiError::Internal("boom".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn internal_message_hides_cause() {
    let err = ApiError::Internal("connection refused on 10.0.0.3".into());
    assert_eq!(err.public_message(), INTERNAL_MESSAGE);
}

#[test]
fn not_found_formats_resource_name() {
    assert_eq!(ApiError::not_found("Product").public_message(), "Product not found");
}

#[tokio::test]
async fn into_response_writes_failure_envelope() {
    let response = ApiError::bad_request("quantity must be at least 1").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, serde_json::json!({"success": false, "error": "quantity must be at least 1"}));
}
