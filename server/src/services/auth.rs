//! Account service: registration, login, password changes.

use std::time::Duration;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use models::{AuthPayload, ChangePasswordRequest, LoginRequest, RegisterRequest, Role, User};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::session::{self, USER_COLUMNS, UserRow};
use crate::db::is_unique_violation;
use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("name, email and password are required")]
    MissingFields,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("admin accounts cannot be self-registered")]
    AdminSelfRegistration,
    #[error("email already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("current password is incorrect")]
    WrongPassword,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingFields
            | AuthError::InvalidEmail
            | AuthError::WeakPassword
            | AuthError::AdminSelfRegistration
            | AuthError::WrongPassword => Self::BadRequest(err.to_string()),
            AuthError::EmailTaken => Self::Conflict(err.to_string()),
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::Hash(_) | AuthError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

// =============================================================================
// PASSWORDS
// =============================================================================

/// Hash a plaintext password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Hash(e.to_string())),
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Validated registration fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub role: Role,
}

pub fn validate_registration(req: &RegisterRequest) -> Result<NewAccount, AuthError> {
    let name = req.name.trim();
    let email = normalize_email(&req.email);
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AuthError::MissingFields);
    }
    if !looks_like_email(&email) {
        return Err(AuthError::InvalidEmail);
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    let role = req.role.unwrap_or(Role::Client);
    if role.is_admin() {
        return Err(AuthError::AdminSelfRegistration);
    }
    Ok(NewAccount { name: name.to_owned(), email, role })
}

// =============================================================================
// FLOWS
// =============================================================================

/// Register an account and open its first session.
pub async fn register(pool: &PgPool, req: &RegisterRequest, ttl: Duration) -> Result<AuthPayload, AuthError> {
    let account = validate_registration(req)?;
    let password_hash = hash_password(&req.password)?;

    let sql = format!(
        "INSERT INTO users AS u (name, email, password_hash, role)
         VALUES ($1, $2, $3, $4)
         RETURNING {USER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&password_hash)
        .bind(account.role.as_str())
        .fetch_one(pool)
        .await
        .map_err(|e| if is_unique_violation(&e) { AuthError::EmailTaken } else { AuthError::Database(e) })?;

    let user = User::from(row);
    let token = session::create_session(pool, user.id, ttl).await?;
    info!(user_id = %user.id, role = %user.role, "account registered");
    Ok(AuthPayload { token, user })
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Check credentials and open a session.
pub async fn login(pool: &PgPool, req: &LoginRequest, ttl: Duration) -> Result<AuthPayload, AuthError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    let sql = format!("SELECT {USER_COLUMNS}, u.password_hash FROM users u WHERE u.email = $1");
    let row = sqlx::query_as::<_, CredentialRow>(&sql)
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&req.password, &row.password_hash)? {
        return Err(AuthError::InvalidCredentials);
    }

    let user = User::from(row.user);
    let token = session::create_session(pool, user.id, ttl).await?;
    info!(user_id = %user.id, "login succeeded");
    Ok(AuthPayload { token, user })
}

/// Change a password after verifying the current one. Other sessions are revoked.
pub async fn change_password(
    pool: &PgPool,
    user_id: Uuid,
    current_token: &str,
    req: &ChangePasswordRequest,
) -> Result<(), AuthError> {
    if req.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if !verify_password(&req.current_password, &stored)? {
        return Err(AuthError::WrongPassword);
    }

    let new_hash = hash_password(&req.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(new_hash)
        .bind(user_id)
        .execute(pool)
        .await?;
    let revoked = session::delete_user_sessions(pool, user_id, Some(current_token)).await?;
    info!(%user_id, revoked, "password changed");
    Ok(())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
