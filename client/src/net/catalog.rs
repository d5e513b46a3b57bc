//! `/api/products` and `/api/categories` clients.

use models::{
    Category, CategoryRequest, CreateProductRequest, Paged, Product, ProductQuery, UpdateProductRequest,
};
use reqwest::Method;
use uuid::Uuid;

use super::api::{ApiClient, ApiError};

pub struct ProductsApi<'a> {
    api: &'a ApiClient,
}

impl<'a> ProductsApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &ProductQuery) -> Result<Paged<Product>, ApiError> {
        self.api.get_query("/api/products", query).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, ApiError> {
        self.api.get(&format!("/api/products/{id}")).await
    }

    pub async fn create(&self, req: &CreateProductRequest) -> Result<Product, ApiError> {
        self.api.post("/api/products", req).await
    }

    pub async fn update(&self, id: Uuid, req: &UpdateProductRequest) -> Result<Product, ApiError> {
        self.api.put(&format!("/api/products/{id}"), req).await
    }

    /// Soft delete: the product stops appearing in the public catalogue.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.api.send_empty(Method::DELETE, &format!("/api/products/{id}")).await
    }
}

pub struct CategoriesApi<'a> {
    api: &'a ApiClient,
}

impl<'a> CategoriesApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Category>, ApiError> {
        self.api.get("/api/categories").await
    }

    pub async fn get(&self, id: Uuid) -> Result<Category, ApiError> {
        self.api.get(&format!("/api/categories/{id}")).await
    }

    pub async fn create(&self, req: &CategoryRequest) -> Result<Category, ApiError> {
        self.api.post("/api/categories", req).await
    }

    pub async fn update(&self, id: Uuid, req: &CategoryRequest) -> Result<Category, ApiError> {
        self.api.put(&format!("/api/categories/{id}"), req).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.api.send_empty(Method::DELETE, &format!("/api/categories/{id}")).await
    }
}
