//! Checkout and order lifecycle.
//!
//! ARCHITECTURE
//! ============
//! Checkout is one transaction: the caller's cart rows and their products
//! are locked `FOR UPDATE`, priced with `models::money::plan_checkout`,
//! written as one `orders` row plus one `order_items` row per line, stock is
//! decremented and the cart emptied. Any error drops the transaction, which
//! rolls everything back.
//!
//! Status changes go through `models::check_transition` and are applied with
//! a compare-and-set on the previous status, so two racing updates cannot
//! both succeed from the same starting state.

use std::collections::HashMap;

use models::money::{CartLine, plan_checkout};
use models::{
    CheckoutRequest, Order, OrderItem, OrderQuery, OrderStatus, Paged, PaymentMethod, Role, TransitionError, User,
    check_transition,
};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order not found: {0}")]
    NotFound(Uuid),
    #[error("cart is empty")]
    EmptyCart,
    #[error("shipping address is required")]
    MissingAddress,
    #[error("payment_intent_id is required for card payments")]
    MissingPaymentIntent,
    #[error("insufficient stock for product {0}")]
    InsufficientStock(Uuid),
    #[error("product {0} is no longer available")]
    ProductUnavailable(Uuid),
    #[error("you do not have permission to change this order")]
    Forbidden,
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("order status was changed by another request")]
    StatusRace,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => Self::not_found("Order"),
            OrderError::EmptyCart
            | OrderError::MissingAddress
            | OrderError::MissingPaymentIntent
            | OrderError::Transition(_) => Self::BadRequest(err.to_string()),
            OrderError::InsufficientStock(_) | OrderError::ProductUnavailable(_) | OrderError::StatusRace => {
                Self::Conflict(err.to_string())
            }
            OrderError::Forbidden => Self::Forbidden(err.to_string()),
            OrderError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

// =============================================================================
// ROWS
// =============================================================================

const ORDER_COLUMNS: &str = "o.id, o.user_id, u.name AS customer_name, o.status, o.total_cents, o.shipping_address, \
     o.payment_method, o.payment_intent_id, iso8601(o.created_at) AS created_at, iso8601(o.updated_at) AS updated_at";

const ORDER_FROM: &str = " FROM orders o JOIN users u ON u.id = o.user_id";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    customer_name: Option<String>,
    status: String,
    total_cents: i64,
    shipping_address: String,
    payment_method: String,
    payment_intent_id: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            customer_name: self.customer_name,
            // CHECK constraints keep both columns within their enums.
            status: OrderStatus::parse(&self.status).unwrap_or(OrderStatus::Pending),
            total_cents: self.total_cents,
            shipping_address: self.shipping_address,
            payment_method: PaymentMethod::parse(&self.payment_method).unwrap_or(PaymentMethod::CashOnDelivery),
            payment_intent_id: self.payment_intent_id,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: Uuid,
    id: Uuid,
    product_id: Uuid,
    product_name: Option<String>,
    artisan_id: Uuid,
    quantity: i32,
    unit_price_cents: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            artisan_id: row.artisan_id,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            line_total_cents: models::money::line_total(row.unit_price_cents, row.quantity),
        }
    }
}

/// Attach items to a batch of order rows, preserving row order.
async fn with_items(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<Order>, sqlx::Error> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let items = sqlx::query_as::<_, OrderItemRow>(
        "SELECT oi.order_id, oi.id, oi.product_id, p.name AS product_name, oi.artisan_id, oi.quantity, oi.unit_price_cents
         FROM order_items oi
         JOIN products p ON p.id = oi.product_id
         WHERE oi.order_id = ANY($1)
         ORDER BY oi.order_id, p.name, oi.id",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(OrderItem::from(item));
    }
    Ok(rows
        .into_iter()
        .map(|row| {
            let own = by_order.remove(&row.id).unwrap_or_default();
            row.into_order(own)
        })
        .collect())
}

async fn load_order(conn: &mut PgConnection, id: Uuid) -> Result<Order, OrderError> {
    let sql = format!("SELECT {ORDER_COLUMNS}{ORDER_FROM} WHERE o.id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(OrderError::NotFound(id))?;
    let mut orders = with_items(conn, vec![row]).await?;
    orders.pop().ok_or(OrderError::NotFound(id))
}

// =============================================================================
// CHECKOUT
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct LockedLine {
    product_id: Uuid,
    artisan_id: Uuid,
    quantity: i32,
    price_cents: i64,
    discount_percent: i32,
    stock: i32,
    is_active: bool,
}

/// Request-level checks that need no database access.
pub(crate) fn validate_checkout(req: &CheckoutRequest) -> Result<(), OrderError> {
    if req.shipping_address.trim().is_empty() {
        return Err(OrderError::MissingAddress);
    }
    let has_intent = req.payment_intent_id.as_deref().is_some_and(|id| !id.trim().is_empty());
    if req.payment_method.requires_intent() && !has_intent {
        return Err(OrderError::MissingPaymentIntent);
    }
    Ok(())
}

/// Place an order from the caller's cart.
pub async fn checkout(pool: &PgPool, user_id: Uuid, req: &CheckoutRequest) -> Result<Order, OrderError> {
    let mut tx = pool.begin().await?;
    let order = checkout_in_tx(&mut tx, user_id, req).await?;
    tx.commit().await?;
    info!(order_id = %order.id, %user_id, total_cents = order.total_cents, items = order.items.len(), "order placed");
    Ok(order)
}

/// Checkout steps on a connection that already has a transaction open.
pub async fn checkout_in_tx(conn: &mut PgConnection, user_id: Uuid, req: &CheckoutRequest) -> Result<Order, OrderError> {
    validate_checkout(req)?;

    let locked = sqlx::query_as::<_, LockedLine>(
        "SELECT ci.product_id, p.artisan_id, ci.quantity, p.price_cents, p.discount_percent, p.stock, p.is_active
         FROM cart_items ci
         JOIN products p ON p.id = ci.product_id
         WHERE ci.user_id = $1
         ORDER BY ci.product_id
         FOR UPDATE",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    if locked.is_empty() {
        return Err(OrderError::EmptyCart);
    }
    for line in &locked {
        if !line.is_active {
            return Err(OrderError::ProductUnavailable(line.product_id));
        }
        if line.stock < line.quantity {
            return Err(OrderError::InsufficientStock(line.product_id));
        }
    }

    let lines: Vec<CartLine> = locked
        .iter()
        .map(|l| CartLine {
            product_id: l.product_id,
            artisan_id: l.artisan_id,
            quantity: l.quantity,
            price_cents: l.price_cents,
            discount_percent: l.discount_percent,
        })
        .collect();
    let plan = plan_checkout(&lines);

    let intent = req
        .payment_intent_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty() && req.payment_method.requires_intent());
    let order_id: Uuid = sqlx::query_scalar(
        "INSERT INTO orders (user_id, status, total_cents, shipping_address, payment_method, payment_intent_id)
         VALUES ($1, 'pending', $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(user_id)
    .bind(plan.total_cents)
    .bind(req.shipping_address.trim())
    .bind(req.payment_method.as_str())
    .bind(intent)
    .fetch_one(&mut *conn)
    .await?;

    for line in &plan.lines {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, artisan_id, quantity, unit_price_cents)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.artisan_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .execute(&mut *conn)
        .await?;

        sqlx::query("UPDATE products SET stock = stock - $2, updated_at = now() WHERE id = $1")
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *conn)
            .await?;
    }

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    load_order(conn, order_id).await
}

// =============================================================================
// QUERIES
// =============================================================================

fn push_visibility(builder: &mut QueryBuilder<'_, Postgres>, viewer: &User) {
    match viewer.role {
        Role::Admin => {
            builder.push(" WHERE TRUE");
        }
        Role::Artisan => {
            builder
                .push(" WHERE (o.user_id = ")
                .push_bind(viewer.id)
                .push(" OR EXISTS (SELECT 1 FROM order_items oi WHERE oi.order_id = o.id AND oi.artisan_id = ")
                .push_bind(viewer.id)
                .push("))");
        }
        Role::Client => {
            builder.push(" WHERE o.user_id = ").push_bind(viewer.id);
        }
    }
}

/// List the orders visible to `viewer`, newest first.
pub async fn list_orders(pool: &PgPool, viewer: &User, query: &OrderQuery) -> Result<Paged<Order>, OrderError> {
    let page_query = query.page_query();
    let (page, per_page) = page_query.normalize();

    let mut count = QueryBuilder::new(format!("SELECT COUNT(*){ORDER_FROM}"));
    push_visibility(&mut count, viewer);
    if let Some(status) = query.status {
        count.push(" AND o.status = ").push_bind(status.as_str());
    }
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS}{ORDER_FROM}"));
    push_visibility(&mut select, viewer);
    if let Some(status) = query.status {
        select.push(" AND o.status = ").push_bind(status.as_str());
    }
    select
        .push(" ORDER BY o.created_at DESC, o.id LIMIT ")
        .push_bind(i64::from(per_page))
        .push(" OFFSET ")
        .push_bind(page_query.offset());
    let rows = select.build_query_as::<OrderRow>().fetch_all(pool).await?;

    let mut conn = pool.acquire().await?;
    let items = with_items(&mut conn, rows).await?;
    Ok(Paged { items, total, page, per_page })
}

/// True when `viewer` may read `order`.
pub(crate) fn can_view(viewer: &User, order: &Order) -> bool {
    viewer.role == Role::Admin || order.user_id == viewer.id || is_involved_artisan(viewer, order)
}

pub(crate) fn is_involved_artisan(viewer: &User, order: &Order) -> bool {
    viewer.role == Role::Artisan && order.items.iter().any(|item| item.artisan_id == viewer.id)
}

pub async fn get_order(pool: &PgPool, viewer: &User, id: Uuid) -> Result<Order, OrderError> {
    let mut conn = pool.acquire().await?;
    let order = load_order(&mut conn, id).await?;
    // Hidden orders look missing rather than forbidden.
    if can_view(viewer, &order) { Ok(order) } else { Err(OrderError::NotFound(id)) }
}

/// Decide whether `actor` may move `order` to `next`.
pub(crate) fn authorize_status_change(actor: &User, order: &Order, next: OrderStatus) -> Result<(), OrderError> {
    if actor.role != Role::Admin && !is_involved_artisan(actor, order) {
        return Err(OrderError::Forbidden);
    }
    check_transition(order.status, next, actor.role)?;
    Ok(())
}

/// How an order's reserved stock moves when its status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StockMove {
    /// The order stops holding stock; its quantities go back to the products.
    Restock,
    /// The order holds stock again; its quantities are taken back out.
    Reserve,
}

/// Every status except `refused` holds the stock taken at checkout.
fn holds_stock(status: OrderStatus) -> bool {
    status != OrderStatus::Refused
}

pub(crate) fn stock_move(from: OrderStatus, to: OrderStatus) -> Option<StockMove> {
    match (holds_stock(from), holds_stock(to)) {
        (true, false) => Some(StockMove::Restock),
        (false, true) => Some(StockMove::Reserve),
        _ => None,
    }
}

/// Change an order's status. Refusing returns the order's stock; an admin
/// moving it out of `refused` reserves the stock again.
pub async fn update_status(pool: &PgPool, actor: &User, id: Uuid, next: OrderStatus) -> Result<Order, OrderError> {
    let mut tx = pool.begin().await?;
    let order = update_status_in_tx(&mut tx, actor, id, next).await?;
    tx.commit().await?;
    Ok(order)
}

pub async fn update_status_in_tx(
    conn: &mut PgConnection,
    actor: &User,
    id: Uuid,
    next: OrderStatus,
) -> Result<Order, OrderError> {
    let order = load_order(conn, id).await?;
    if !can_view(actor, &order) {
        return Err(OrderError::NotFound(id));
    }
    authorize_status_change(actor, &order, next)?;

    let result = sqlx::query("UPDATE orders SET status = $3, updated_at = now() WHERE id = $1 AND status = $2")
        .bind(id)
        .bind(order.status.as_str())
        .bind(next.as_str())
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(OrderError::StatusRace);
    }

    match stock_move(order.status, next) {
        Some(StockMove::Restock) => {
            for item in &order.items {
                sqlx::query("UPDATE products SET stock = stock + $2, updated_at = now() WHERE id = $1")
                    .bind(item.product_id)
                    .bind(item.quantity)
                    .execute(&mut *conn)
                    .await?;
            }
        }
        Some(StockMove::Reserve) => {
            for item in &order.items {
                // Caller's transaction rolls back the status change and earlier items on failure.
                let reserved = sqlx::query(
                    "UPDATE products SET stock = stock - $2, updated_at = now() WHERE id = $1 AND stock >= $2",
                )
                .bind(item.product_id)
                .bind(item.quantity)
                .execute(&mut *conn)
                .await?;
                if reserved.rows_affected() == 0 {
                    return Err(OrderError::InsufficientStock(item.product_id));
                }
            }
        }
        None => {}
    }

    info!(order_id = %id, actor_id = %actor.id, from = %order.status, to = %next, "order status changed");
    load_order(conn, id).await
}

#[cfg(test)]
#[path = "orders_test.rs"]
mod tests;
