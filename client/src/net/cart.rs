//! `/api/cart` client.

use models::{AddCartItemRequest, Cart, UpdateCartItemRequest};
use reqwest::Method;
use uuid::Uuid;

use super::api::{ApiClient, ApiError};

pub struct CartApi<'a> {
    api: &'a ApiClient,
}

impl<'a> CartApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn get(&self) -> Result<Cart, ApiError> {
        self.api.get("/api/cart").await
    }

    pub async fn add(&self, product_id: Uuid, quantity: i32) -> Result<Cart, ApiError> {
        self.api.post("/api/cart/items", &AddCartItemRequest { product_id, quantity }).await
    }

    /// Set a line's quantity; `0` removes the line.
    pub async fn update(&self, product_id: Uuid, quantity: i32) -> Result<Cart, ApiError> {
        self.api
            .put(&format!("/api/cart/items/{product_id}"), &UpdateCartItemRequest { quantity })
            .await
    }

    pub async fn remove(&self, product_id: Uuid) -> Result<Cart, ApiError> {
        self.api.delete(&format!("/api/cart/items/{product_id}")).await
    }

    /// Empty the cart. Succeeds when it is already empty.
    pub async fn clear(&self) -> Result<(), ApiError> {
        self.api.send_empty(Method::DELETE, "/api/cart").await
    }
}
