//! Session token management.
//!
//! ARCHITECTURE
//! ============
//! Login and registration mint a random bearer token. Only its SHA-256
//! digest is stored, so a leaked `sessions` table cannot be replayed.
//! Validation joins the digest to `users` and ignores expired rows.

use std::fmt::Write;
use std::time::Duration;

use models::{Role, User};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Digest under which a token is stored.
#[must_use]
pub(crate) fn token_digest(token: &str) -> String {
    bytes_to_hex(&Sha256::digest(token.as_bytes()))
}

/// `users` columns shared by every query that returns a [`User`].
pub(crate) const USER_COLUMNS: &str = "u.id, u.name, u.email, u.role, u.phone, u.address, iso8601(u.created_at) AS created_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            // The CHECK constraint keeps `role` within the enum.
            role: Role::parse(&row.role).unwrap_or(Role::Client),
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

/// Create a session for the given user, returning the token.
pub async fn create_session(pool: &PgPool, user_id: Uuid, ttl: Duration) -> Result<String, sqlx::Error> {
    let token = generate_token();
    let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, now() + $3::bigint * interval '1 second')")
        .bind(token_digest(&token))
        .bind(user_id)
        .bind(ttl_secs)
        .execute(pool)
        .await?;
    Ok(token)
}

/// Validate a session token and return the associated user.
pub async fn validate_session(pool: &PgPool, token: &str) -> Result<Option<User>, sqlx::Error> {
    let sql = format!(
        "SELECT {USER_COLUMNS}
         FROM sessions s
         JOIN users u ON u.id = s.user_id
         WHERE s.token_hash = $1 AND s.expires_at > now()"
    );
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(token_digest(token))
        .fetch_optional(pool)
        .await?;

    Ok(row.map(User::from))
}

/// Delete a session by token.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(token_digest(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete every session of a user except `keep` (if given).
pub async fn delete_user_sessions(pool: &PgPool, user_id: Uuid, keep: Option<&str>) -> Result<u64, sqlx::Error> {
    let keep_digest = keep.map(token_digest);
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND ($2::text IS NULL OR token_hash <> $2)")
        .bind(user_id)
        .bind(keep_digest)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Remove expired sessions. Returns how many rows were deleted.
pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
