use super::*;
use axum::http::StatusCode;

fn request(name: &str, email: &str, password: &str, role: Option<Role>) -> RegisterRequest {
    RegisterRequest { name: name.into(), email: email.into(), password: password.into(), role }
}

// =============================================================================
// validate_registration
// =============================================================================

#[test]
fn registration_defaults_to_client_and_normalizes_email() {
    let account = validate_registration(&request(" Ada ", " ADA@Example.com ", "secret1", None)).unwrap();
    assert_eq!(account, NewAccount { name: "Ada".into(), email: "ada@example.com".into(), role: Role::Client });
}

#[test]
fn registration_allows_artisan_role() {
    let account = validate_registration(&request("Bo", "bo@example.com", "secret1", Some(Role::Artisan))).unwrap();
    assert_eq!(account.role, Role::Artisan);
}

#[test]
fn registration_rejects_admin_role() {
    let err = validate_registration(&request("Eve", "eve@example.com", "secret1", Some(Role::Admin))).unwrap_err();
    assert!(matches!(err, AuthError::AdminSelfRegistration));
}

#[test]
fn registration_rejects_missing_fields() {
    let err = validate_registration(&request("  ", "a@b.co", "secret1", None)).unwrap_err();
    assert!(matches!(err, AuthError::MissingFields));
}

#[test]
fn registration_rejects_short_password() {
    let err = validate_registration(&request("Al", "al@example.com", "12345", None)).unwrap_err();
    assert!(matches!(err, AuthError::WeakPassword));
}

#[test]
fn registration_rejects_malformed_email() {
    for email in ["no-at-sign", "@example.com", "a@nodot", "a@.com"] {
        let err = validate_registration(&request("Al", email, "secret1", None)).unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail), "expected invalid email for {email:?}");
    }
}

// =============================================================================
// passwords
// =============================================================================

#[test]
fn hash_then_verify_accepts_only_the_original_password() {
    let hash = hash_password("password123").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("password123", &hash).unwrap());
    assert!(!verify_password("password124", &hash).unwrap());
}

#[test]
fn verify_rejects_malformed_hash() {
    assert!(matches!(verify_password("x", "not-a-hash"), Err(AuthError::Hash(_))));
}

// =============================================================================
// error mapping
// =============================================================================

#[test]
fn auth_errors_map_to_http_statuses() {
    assert_eq!(ApiError::from(AuthError::EmailTaken).status(), StatusCode::CONFLICT);
    assert_eq!(ApiError::from(AuthError::InvalidCredentials).status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ApiError::from(AuthError::WeakPassword).status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(AuthError::Hash("x".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn invalid_credentials_message_is_generic() {
    assert_eq!(ApiError::from(AuthError::InvalidCredentials).public_message(), "Invalid email or password");
}
