use super::*;
use uuid::Uuid;

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

#[test]
fn require_role_accepts_listed_roles() {
    assert!(require_role(&user(Role::Admin), &[Role::Admin]).is_ok());
    assert!(require_role(&user(Role::Artisan), &[Role::Artisan, Role::Admin]).is_ok());
}

#[test]
fn require_role_rejects_others_with_403() {
    let err = require_role(&user(Role::Client), &[Role::Artisan, Role::Admin]).unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn maybe_auth_without_header_is_anonymous() {
    let state = crate::state::test_helpers::test_app_state();
    let (mut parts, ()) = axum::http::Request::new(()).into_parts();
    let MaybeAuthUser(user) = MaybeAuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn auth_user_without_header_is_401() {
    let state = crate::state::test_helpers::test_app_state();
    let (mut parts, ()) = axum::http::Request::new(()).into_parts();
    let err = AuthUser::from_request_parts(&mut parts, &state).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_bearer_scheme_is_ignored() {
    let state = crate::state::test_helpers::test_app_state();
    let request = axum::http::Request::builder()
        .header(axum::http::header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(())
        .unwrap();
    let (mut parts, ()) = request.into_parts();
    let err = AuthUser::from_request_parts(&mut parts, &state).await.unwrap_err();
    assert_eq!(err.public_message(), "Authentication required");
}
