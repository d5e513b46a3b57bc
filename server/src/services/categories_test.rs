use super::*;
use axum::http::StatusCode;

#[test]
fn clean_trims_name_and_drops_blank_description() {
    let req = CategoryRequest { name: "  Pottery ".into(), description: Some("   ".into()) };
    assert_eq!(clean(&req).unwrap(), ("Pottery".to_owned(), None));
}

#[test]
fn clean_rejects_blank_name() {
    let req = CategoryRequest { name: " ".into(), description: None };
    assert!(matches!(clean(&req), Err(CategoryError::NameRequired)));
}

#[test]
fn category_errors_map_to_http_statuses() {
    assert_eq!(ApiError::from(CategoryError::Duplicate).status(), StatusCode::CONFLICT);
    assert_eq!(ApiError::from(CategoryError::NotFound(Uuid::nil())).status(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::from(CategoryError::NameRequired).status(), StatusCode::BAD_REQUEST);
}
