//! Resource DTOs for the REST API.
//!
//! DESIGN
//! ======
//! These types are the JSON contract of `/api/*`. The server builds them
//! from SQL rows, the mock backend from in-memory records, and the client
//! deserializes them unchanged. Request bodies with all-optional fields are
//! partial updates: absent fields are left untouched.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::PageQuery;
use crate::order::{IssueStatus, OrderStatus, PaymentMethod};
use crate::role::Role;

#[cfg(test)]
#[path = "resources_test.rs"]
mod tests;

// =============================================================================
// AUTH / USERS
// =============================================================================

/// A registered account as exposed to clients. Never carries the password hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email, unique across accounts.
    pub email: String,
    /// Role driving authorization.
    pub role: Role,
    /// Contact phone, if provided.
    #[serde(default)]
    pub phone: Option<String>,
    /// Default shipping address, if provided.
    #[serde(default)]
    pub address: Option<String>,
    /// RFC 3339 creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of a successful login or registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `client`. `admin` cannot be self-assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// Admin user listing filters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// Public artisan entry used by catalogue filters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtisanSummary {
    pub id: Uuid,
    pub name: String,
}

// =============================================================================
// CATALOGUE
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A product listing. Prices are integer cents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: Uuid,
    /// Owning artisan.
    pub artisan_id: Uuid,
    /// Owning artisan's display name, when joined.
    #[serde(default)]
    pub artisan_name: Option<String>,
    /// Category, if assigned.
    #[serde(default)]
    pub category_id: Option<Uuid>,
    /// Category name, when joined.
    #[serde(default)]
    pub category_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// List price before discount.
    pub price_cents: i64,
    /// Whole-percent discount, `0..=100`.
    pub discount_percent: i32,
    /// Price after discount, rounded half up.
    pub discounted_price_cents: i64,
    /// Units available for checkout.
    pub stock: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Inactive products are hidden from the public catalogue.
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub discount_percent: i32,
    #[serde(default)]
    pub stock: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

/// Catalogue filters. Every field is optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artisan_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<ProductSort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_inactive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

// =============================================================================
// CART
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price_cents: i64,
    pub discount_percent: i32,
    pub discounted_price_cents: i64,
    pub line_total_cents: i64,
    pub stock: i32,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total_cents: i64,
    pub item_count: i64,
}

impl Cart {
    /// Build a cart view, computing `total_cents` and `item_count`.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let total_cents = items.iter().map(|i| i.line_total_cents).sum();
        let item_count = items.iter().map(|i| i64::from(i.quantity)).sum();
        Self { items, total_cents, item_count }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

// =============================================================================
// ORDERS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    #[serde(default)]
    pub product_name: Option<String>,
    pub artisan_id: Uuid,
    pub quantity: i32,
    /// Discounted unit price frozen at checkout.
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

// =============================================================================
// ISSUES
// =============================================================================

/// A customer support issue, optionally tied to an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub order_id: Option<Uuid>,
    pub subject: String,
    pub description: String,
    pub status: IssueStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIssueRequest {
    pub subject: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateIssueStatusRequest {
    pub status: IssueStatus,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IssueQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IssueStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

macro_rules! impl_page_query {
    ($($ty:ty),*) => {
        $(impl $ty {
            /// Pagination part of the query.
            #[must_use]
            pub fn page_query(&self) -> PageQuery {
                PageQuery { page: self.page, per_page: self.per_page }
            }
        })*
    };
}

impl_page_query!(UserQuery, ProductQuery, OrderQuery, IssueQuery);
