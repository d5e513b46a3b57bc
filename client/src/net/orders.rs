//! `/api/orders` client.

use models::{CheckoutRequest, Order, OrderQuery, OrderStatus, Paged, UpdateOrderStatusRequest};
use uuid::Uuid;

use super::api::{ApiClient, ApiError};

pub struct OrdersApi<'a> {
    api: &'a ApiClient,
}

impl<'a> OrdersApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Turn the current cart into one pending order.
    pub async fn checkout(&self, req: &CheckoutRequest) -> Result<Order, ApiError> {
        self.api.post("/api/orders/checkout", req).await
    }

    pub async fn list(&self, query: &OrderQuery) -> Result<Paged<Order>, ApiError> {
        self.api.get_query("/api/orders", query).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Order, ApiError> {
        self.api.get(&format!("/api/orders/{id}")).await
    }

    pub async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, ApiError> {
        self.api
            .put(&format!("/api/orders/{id}/status"), &UpdateOrderStatusRequest { status })
            .await
    }
}
