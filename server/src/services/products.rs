//! Product catalogue service.
//!
//! Listing is public. Inactive (soft-deleted) products are only listed when
//! the caller asks for them with `include_inactive` and is an admin, or is
//! the artisan owning them; owners only ever see their own inactive rows.

use models::money::discounted_unit_price;
use models::{CreateProductRequest, Paged, Product, ProductQuery, ProductSort, Role, UpdateProductRequest, User};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::db::is_foreign_key_violation;
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("product not found: {0}")]
    NotFound(Uuid),
    #[error("{0}")]
    Invalid(&'static str),
    #[error("category does not exist")]
    UnknownCategory,
    #[error("only the owning artisan or an administrator may modify this product")]
    NotOwner,
    #[error("only artisans and administrators may create products")]
    RoleNotAllowed,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => Self::not_found("Product"),
            ProductError::Invalid(_) | ProductError::UnknownCategory => Self::BadRequest(err.to_string()),
            ProductError::NotOwner | ProductError::RoleNotAllowed => Self::Forbidden(err.to_string()),
            ProductError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

const PRODUCT_COLUMNS: &str = "p.id, p.artisan_id, a.name AS artisan_name, p.category_id, c.name AS category_name, \
     p.name, p.description, p.price_cents, p.discount_percent, p.stock, p.image_url, p.is_active, \
     iso8601(p.created_at) AS created_at";

const PRODUCT_FROM: &str = " FROM products p JOIN users a ON a.id = p.artisan_id LEFT JOIN categories c ON c.id = p.category_id";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    artisan_id: Uuid,
    artisan_name: Option<String>,
    category_id: Option<Uuid>,
    category_name: Option<String>,
    name: String,
    description: Option<String>,
    price_cents: i64,
    discount_percent: i32,
    stock: i32,
    image_url: Option<String>,
    is_active: bool,
    created_at: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            artisan_id: row.artisan_id,
            artisan_name: row.artisan_name,
            category_id: row.category_id,
            category_name: row.category_name,
            discounted_price_cents: discounted_unit_price(row.price_cents, row.discount_percent),
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            discount_percent: row.discount_percent,
            stock: row.stock,
            image_url: row.image_url,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// Which inactive products a listing may include.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InactiveScope {
    None,
    Owner(Uuid),
    All,
}

pub(crate) fn inactive_scope(query: &ProductQuery, viewer: Option<&User>) -> InactiveScope {
    if !query.include_inactive.unwrap_or(false) {
        return InactiveScope::None;
    }
    match viewer {
        Some(user) if user.role == Role::Admin => InactiveScope::All,
        Some(user) if user.role == Role::Artisan => InactiveScope::Owner(user.id),
        _ => InactiveScope::None,
    }
}

pub(crate) fn order_clause(sort: ProductSort) -> &'static str {
    match sort {
        ProductSort::Newest => " ORDER BY p.created_at DESC, p.id",
        ProductSort::PriceAsc => " ORDER BY p.price_cents ASC, p.id",
        ProductSort::PriceDesc => " ORDER BY p.price_cents DESC, p.id",
        ProductSort::Name => " ORDER BY lower(p.name) ASC, p.id",
    }
}

fn push_product_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery, scope: InactiveScope) {
    builder.push(" WHERE TRUE");
    match scope {
        InactiveScope::None => {
            builder.push(" AND p.is_active");
        }
        InactiveScope::Owner(owner) => {
            builder.push(" AND (p.is_active OR p.artisan_id = ").push_bind(owner).push(")");
        }
        InactiveScope::All => {}
    }
    if let Some(category_id) = query.category_id {
        builder.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(artisan_id) = query.artisan_id {
        builder.push(" AND p.artisan_id = ").push_bind(artisan_id);
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        builder
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min) = query.min_price {
        builder.push(" AND p.price_cents >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        builder.push(" AND p.price_cents <= ").push_bind(max);
    }
}

pub async fn list_products(
    pool: &PgPool,
    query: &ProductQuery,
    viewer: Option<&User>,
) -> Result<Paged<Product>, ProductError> {
    let scope = inactive_scope(query, viewer);
    let page_query = query.page_query();
    let (page, per_page) = page_query.normalize();

    let mut count = QueryBuilder::new(format!("SELECT COUNT(*){PRODUCT_FROM}"));
    push_product_filters(&mut count, query, scope);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS}{PRODUCT_FROM}"));
    push_product_filters(&mut select, query, scope);
    select
        .push(order_clause(query.sort.unwrap_or_default()))
        .push(" LIMIT ")
        .push_bind(i64::from(per_page))
        .push(" OFFSET ")
        .push_bind(page_query.offset());
    let rows = select.build_query_as::<ProductRow>().fetch_all(pool).await?;

    Ok(Paged { items: rows.into_iter().map(Product::from).collect(), total, page, per_page })
}

/// Fetch one product. Inactive products are visible only to admins and their owner.
pub async fn get_product(pool: &PgPool, id: Uuid, viewer: Option<&User>) -> Result<Product, ProductError> {
    let product = fetch_product(pool, id).await?;
    if product.is_active || viewer.is_some_and(|u| may_modify(u, product.artisan_id)) {
        Ok(product)
    } else {
        Err(ProductError::NotFound(id))
    }
}

async fn fetch_product(pool: &PgPool, id: Uuid) -> Result<Product, ProductError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS}{PRODUCT_FROM} WHERE p.id = $1");
    sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(Product::from)
        .ok_or(ProductError::NotFound(id))
}

pub(crate) fn may_modify(user: &User, owner_id: Uuid) -> bool {
    user.role == Role::Admin || (user.role == Role::Artisan && user.id == owner_id)
}

pub(crate) fn validate_fields(
    name: Option<&str>,
    price_cents: Option<i64>,
    discount_percent: Option<i32>,
    stock: Option<i32>,
) -> Result<(), ProductError> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(ProductError::Invalid("product name is required"));
    }
    if price_cents.is_some_and(|p| p < 0) {
        return Err(ProductError::Invalid("price must not be negative"));
    }
    if discount_percent.is_some_and(|d| !(0..=100).contains(&d)) {
        return Err(ProductError::Invalid("discount must be between 0 and 100"));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(ProductError::Invalid("stock must not be negative"));
    }
    Ok(())
}

fn map_write_error(err: sqlx::Error) -> ProductError {
    if is_foreign_key_violation(&err) { ProductError::UnknownCategory } else { ProductError::Database(err) }
}

/// Create a product owned by `actor`.
pub async fn create_product(pool: &PgPool, actor: &User, req: &CreateProductRequest) -> Result<Product, ProductError> {
    if !matches!(actor.role, Role::Artisan | Role::Admin) {
        return Err(ProductError::RoleNotAllowed);
    }
    validate_fields(Some(&req.name), Some(req.price_cents), Some(req.discount_percent), Some(req.stock))?;

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO products (artisan_id, category_id, name, description, price_cents, discount_percent, stock, image_url)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id",
    )
    .bind(actor.id)
    .bind(req.category_id)
    .bind(req.name.trim())
    .bind(req.description.as_deref())
    .bind(req.price_cents)
    .bind(req.discount_percent)
    .bind(req.stock)
    .bind(req.image_url.as_deref())
    .fetch_one(pool)
    .await
    .map_err(map_write_error)?;

    info!(product_id = %id, artisan_id = %actor.id, "product created");
    fetch_product(pool, id).await
}

pub async fn update_product(
    pool: &PgPool,
    actor: &User,
    id: Uuid,
    req: &UpdateProductRequest,
) -> Result<Product, ProductError> {
    validate_fields(req.name.as_deref(), req.price_cents, req.discount_percent, req.stock)?;
    let current = fetch_product(pool, id).await?;
    if !may_modify(actor, current.artisan_id) {
        return Err(ProductError::NotOwner);
    }

    sqlx::query(
        "UPDATE products SET
             name = COALESCE($2, name),
             description = COALESCE($3, description),
             price_cents = COALESCE($4, price_cents),
             discount_percent = COALESCE($5, discount_percent),
             stock = COALESCE($6, stock),
             category_id = COALESCE($7, category_id),
             image_url = COALESCE($8, image_url),
             is_active = COALESCE($9, is_active),
             updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.description.as_deref())
    .bind(req.price_cents)
    .bind(req.discount_percent)
    .bind(req.stock)
    .bind(req.category_id)
    .bind(req.image_url.as_deref())
    .bind(req.is_active)
    .execute(pool)
    .await
    .map_err(map_write_error)?;

    fetch_product(pool, id).await
}

/// Soft delete: the row stays so past order items keep their reference.
pub async fn delete_product(pool: &PgPool, actor: &User, id: Uuid) -> Result<(), ProductError> {
    let current = fetch_product(pool, id).await?;
    if !may_modify(actor, current.artisan_id) {
        return Err(ProductError::NotOwner);
    }
    sqlx::query("UPDATE products SET is_active = FALSE, updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM cart_items WHERE product_id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    info!(product_id = %id, actor_id = %actor.id, "product deactivated");
    Ok(())
}

#[cfg(test)]
#[path = "products_test.rs"]
mod tests;
