//! Shopping cart service.
//!
//! Cart rows are `(user_id, product_id, quantity)`; prices are always read
//! from the live product so the cart view reflects current discounts.
//! Prices are frozen only at checkout.

use models::money::{discounted_unit_price, line_total};
use models::{Cart, CartItem};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("product not found: {0}")]
    ProductNotFound(Uuid),
    #[error("item not in cart: {0}")]
    ItemNotFound(Uuid),
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("quantity must not be negative")]
    NegativeQuantity,
    #[error("quantity must not exceed {MAX_LINE_QUANTITY}")]
    QuantityTooLarge,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ProductNotFound(_) => Self::not_found("Product"),
            CartError::ItemNotFound(_) => Self::not_found("Cart item"),
            CartError::InvalidQuantity | CartError::NegativeQuantity | CartError::QuantityTooLarge => {
                Self::BadRequest(err.to_string())
            }
            CartError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 10_000;

/// Validate a positive quantity for one add or set.
pub(crate) fn check_quantity(quantity: i32) -> Result<(), CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity);
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(CartError::QuantityTooLarge);
    }
    Ok(())
}

/// Combined quantity when adding to an existing line.
pub(crate) fn add_quantities(current: i32, added: i32) -> Result<i32, CartError> {
    current
        .checked_add(added)
        .filter(|total| *total <= MAX_LINE_QUANTITY)
        .ok_or(CartError::QuantityTooLarge)
}

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    product_id: Uuid,
    name: String,
    quantity: i32,
    price_cents: i64,
    discount_percent: i32,
    stock: i32,
    image_url: Option<String>,
}

impl From<CartRow> for CartItem {
    fn from(row: CartRow) -> Self {
        let unit = discounted_unit_price(row.price_cents, row.discount_percent);
        Self {
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            price_cents: row.price_cents,
            discount_percent: row.discount_percent,
            discounted_price_cents: unit,
            line_total_cents: line_total(unit, row.quantity),
            stock: row.stock,
            image_url: row.image_url,
        }
    }
}

pub async fn get_cart(pool: &PgPool, user_id: Uuid) -> Result<Cart, CartError> {
    let rows = sqlx::query_as::<_, CartRow>(
        "SELECT ci.product_id, p.name, ci.quantity, p.price_cents, p.discount_percent, p.stock, p.image_url
         FROM cart_items ci
         JOIN products p ON p.id = ci.product_id
         WHERE ci.user_id = $1
         ORDER BY ci.added_at, ci.product_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(Cart::from_items(rows.into_iter().map(CartItem::from).collect()))
}

/// Add a product; an existing line has the quantity added to it.
pub async fn add_item(pool: &PgPool, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Cart, CartError> {
    check_quantity(quantity)?;
    let active: Option<bool> = sqlx::query_scalar("SELECT is_active FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    if active != Some(true) {
        return Err(CartError::ProductNotFound(product_id));
    }

    // Both operands are at most MAX_LINE_QUANTITY, so the guard itself cannot overflow.
    let result = sqlx::query(
        "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
         WHERE cart_items.quantity <= $4 - EXCLUDED.quantity",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(MAX_LINE_QUANTITY)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(CartError::QuantityTooLarge);
    }
    get_cart(pool, user_id).await
}

/// Set a line's quantity. Zero removes the line.
pub async fn set_quantity(pool: &PgPool, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Cart, CartError> {
    if quantity < 0 {
        return Err(CartError::NegativeQuantity);
    }
    if quantity == 0 {
        return remove_item(pool, user_id, product_id).await;
    }
    check_quantity(quantity)?;
    let result = sqlx::query("UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CartError::ItemNotFound(product_id));
    }
    get_cart(pool, user_id).await
}

pub async fn remove_item(pool: &PgPool, user_id: Uuid, product_id: Uuid) -> Result<Cart, CartError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CartError::ItemNotFound(product_id));
    }
    get_cart(pool, user_id).await
}

/// Empty the cart. Clearing an empty cart succeeds.
pub async fn clear_cart(pool: &PgPool, user_id: Uuid) -> Result<(), CartError> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "cart_test.rs"]
mod tests;
