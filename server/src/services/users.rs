//! User administration and profile service.

use models::{ArtisanSummary, Paged, Role, UpdateProfileRequest, User, UserQuery};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::session::{USER_COLUMNS, UserRow};
use crate::db::is_foreign_key_violation;
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error("administrators cannot delete their own account")]
    SelfDeletion,
    #[error("administrators cannot change their own role")]
    SelfDemotion,
    #[error("user has orders and cannot be deleted")]
    HasOrders,
    #[error("name cannot be empty")]
    EmptyName,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => Self::not_found("User"),
            UserError::SelfDeletion | UserError::SelfDemotion | UserError::EmptyName => {
                Self::BadRequest(err.to_string())
            }
            UserError::HasOrders => Self::Conflict(err.to_string()),
            UserError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

fn push_user_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &UserQuery) {
    builder.push(" WHERE TRUE");
    if let Some(role) = query.role {
        builder.push(" AND u.role = ").push_bind(role.as_str());
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        builder
            .push(" AND (u.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// List users with role/search filters, newest first.
pub async fn list_users(pool: &PgPool, query: &UserQuery) -> Result<Paged<User>, UserError> {
    let page_query = query.page_query();
    let (page, per_page) = page_query.normalize();

    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM users u");
    push_user_filters(&mut count, query);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users u"));
    push_user_filters(&mut select, query);
    select
        .push(" ORDER BY u.created_at DESC, u.id LIMIT ")
        .push_bind(i64::from(per_page))
        .push(" OFFSET ")
        .push_bind(page_query.offset());
    let rows = select.build_query_as::<UserRow>().fetch_all(pool).await?;

    Ok(Paged { items: rows.into_iter().map(User::from).collect(), total, page, per_page })
}

pub async fn get_user(pool: &PgPool, user_id: Uuid) -> Result<User, UserError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .map(User::from)
        .ok_or(UserError::NotFound(user_id))
}

/// Apply a partial profile update. Empty phone/address strings clear the field.
pub async fn update_profile(pool: &PgPool, user_id: Uuid, req: &UpdateProfileRequest) -> Result<User, UserError> {
    let name = req.name.as_deref().map(str::trim);
    if name.is_some_and(str::is_empty) {
        return Err(UserError::EmptyName);
    }
    let sql = format!(
        "UPDATE users AS u SET
             name = COALESCE($2, u.name),
             phone = CASE WHEN $3::text IS NULL THEN u.phone ELSE NULLIF($3, '') END,
             address = CASE WHEN $4::text IS NULL THEN u.address ELSE NULLIF($4, '') END
         WHERE u.id = $1
         RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(user_id)
        .bind(name)
        .bind(req.phone.as_deref().map(str::trim))
        .bind(req.address.as_deref().map(str::trim))
        .fetch_optional(pool)
        .await?
        .map(User::from)
        .ok_or(UserError::NotFound(user_id))
}

pub async fn update_role(pool: &PgPool, actor_id: Uuid, user_id: Uuid, role: Role) -> Result<User, UserError> {
    if actor_id == user_id {
        return Err(UserError::SelfDemotion);
    }
    let sql = format!("UPDATE users AS u SET role = $2 WHERE u.id = $1 RETURNING {USER_COLUMNS}");
    let user = sqlx::query_as::<_, UserRow>(&sql)
        .bind(user_id)
        .bind(role.as_str())
        .fetch_optional(pool)
        .await?
        .map(User::from)
        .ok_or(UserError::NotFound(user_id))?;
    info!(%actor_id, %user_id, %role, "user role changed");
    Ok(user)
}

pub async fn delete_user(pool: &PgPool, actor_id: Uuid, user_id: Uuid) -> Result<(), UserError> {
    if actor_id == user_id {
        return Err(UserError::SelfDeletion);
    }
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| if is_foreign_key_violation(&e) { UserError::HasOrders } else { UserError::Database(e) })?;
    if result.rows_affected() == 0 {
        return Err(UserError::NotFound(user_id));
    }
    info!(%actor_id, %user_id, "user deleted");
    Ok(())
}

/// Public list of artisans for catalogue filters.
pub async fn list_artisans(pool: &PgPool) -> Result<Vec<ArtisanSummary>, UserError> {
    let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM users WHERE role = 'artisan' ORDER BY name, id")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(id, name)| ArtisanSummary { id, name }).collect())
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
