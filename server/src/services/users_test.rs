use super::*;
use axum::http::StatusCode;

#[test]
fn user_errors_map_to_http_statuses() {
    assert_eq!(ApiError::from(UserError::NotFound(Uuid::nil())).status(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::from(UserError::SelfDeletion).status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(UserError::HasOrders).status(), StatusCode::CONFLICT);
}

#[test]
fn user_filters_bind_role_and_search() {
    let query = UserQuery { role: Some(Role::Artisan), search: Some(" ada ".into()), ..UserQuery::default() };
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM users u");
    push_user_filters(&mut builder, &query);
    let sql = builder.sql();
    assert!(sql.contains("u.role = $1"), "{sql}");
    assert!(sql.contains("u.name ILIKE $2 OR u.email ILIKE $3"), "{sql}");
}

#[test]
fn user_filters_skip_blank_search() {
    let query = UserQuery { search: Some("   ".into()), ..UserQuery::default() };
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM users u");
    push_user_filters(&mut builder, &query);
    assert_eq!(builder.sql(), "SELECT COUNT(*) FROM users u WHERE TRUE");
}

#[tokio::test]
async fn self_deletion_is_rejected_before_touching_the_database() {
    let state = crate::state::test_helpers::test_app_state();
    let id = Uuid::new_v4();
    let err = delete_user(&state.pool, id, id).await.unwrap_err();
    assert!(matches!(err, UserError::SelfDeletion));
}
