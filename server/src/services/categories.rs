//! Category service.

use models::{Category, CategoryRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("category not found: {0}")]
    NotFound(Uuid),
    #[error("category name is required")]
    NameRequired,
    #[error("a category with this name already exists")]
    Duplicate,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<CategoryError> for ApiError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(_) => Self::not_found("Category"),
            CategoryError::NameRequired => Self::BadRequest(err.to_string()),
            CategoryError::Duplicate => Self::Conflict(err.to_string()),
            CategoryError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

fn map_write_error(err: sqlx::Error) -> CategoryError {
    if is_unique_violation(&err) { CategoryError::Duplicate } else { CategoryError::Database(err) }
}

fn clean(req: &CategoryRequest) -> Result<(String, Option<String>), CategoryError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(CategoryError::NameRequired);
    }
    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_owned);
    Ok((name.to_owned(), description))
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, CategoryError> {
    let rows = sqlx::query_as::<_, (Uuid, String, Option<String>)>(
        "SELECT id, name, description FROM categories ORDER BY name, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, name, description)| Category { id, name, description })
        .collect())
}

pub async fn get_category(pool: &PgPool, id: Uuid) -> Result<Category, CategoryError> {
    sqlx::query_as::<_, (Uuid, String, Option<String>)>("SELECT id, name, description FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(|(id, name, description)| Category { id, name, description })
        .ok_or(CategoryError::NotFound(id))
}

pub async fn create_category(pool: &PgPool, req: &CategoryRequest) -> Result<Category, CategoryError> {
    let (name, description) = clean(req)?;
    let id: Uuid = sqlx::query_scalar("INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING id")
        .bind(&name)
        .bind(&description)
        .fetch_one(pool)
        .await
        .map_err(map_write_error)?;
    Ok(Category { id, name, description })
}

pub async fn update_category(pool: &PgPool, id: Uuid, req: &CategoryRequest) -> Result<Category, CategoryError> {
    let (name, description) = clean(req)?;
    let result = sqlx::query("UPDATE categories SET name = $2, description = $3 WHERE id = $1")
        .bind(id)
        .bind(&name)
        .bind(&description)
        .execute(pool)
        .await
        .map_err(map_write_error)?;
    if result.rows_affected() == 0 {
        return Err(CategoryError::NotFound(id));
    }
    Ok(Category { id, name, description })
}

/// Delete a category. Products keep existing with no category.
pub async fn delete_category(pool: &PgPool, id: Uuid) -> Result<(), CategoryError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CategoryError::NotFound(id));
    }
    Ok(())
}

#[cfg(test)]
#[path = "categories_test.rs"]
mod tests;
