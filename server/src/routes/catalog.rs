//! Category and product routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use models::{CategoryRequest, CreateProductRequest, ProductQuery, UpdateProductRequest};
use uuid::Uuid;

use super::auth::{AdminUser, AuthUser, MaybeAuthUser};
use crate::error::{ApiError, ApiJson, ApiQuery, ok};
use crate::services::{categories, products};
use crate::state::AppState;

// =============================================================================
// CATEGORIES
// =============================================================================

/// `GET /api/categories`
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(categories::list_categories(&state.pool).await?))
}

/// `GET /api/categories/{id}`
pub async fn get_category(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(categories::get_category(&state.pool, id).await?))
}

/// `POST /api/categories` (admin)
pub async fn create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = categories::create_category(&state.pool, &req).await?;
    Ok((StatusCode::CREATED, ok(category)))
}

/// `PUT /api/categories/{id}` (admin)
pub async fn update_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(categories::update_category(&state.pool, id, &req).await?))
}

/// `DELETE /api/categories/{id}` (admin)
pub async fn delete_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    categories::delete_category(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// PRODUCTS
// =============================================================================

/// `GET /api/products`
pub async fn list_products(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(products::list_products(&state.pool, &query, viewer.as_ref()).await?))
}

/// `GET /api/products/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(products::get_product(&state.pool, id, viewer.as_ref()).await?))
}

/// `POST /api/products` (artisan or admin)
pub async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = products::create_product(&state.pool, &auth.user, &req).await?;
    Ok((StatusCode::CREATED, ok(product)))
}

/// `PUT /api/products/{id}` (owner or admin)
pub async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(products::update_product(&state.pool, &auth.user, id, &req).await?))
}

/// `DELETE /api/products/{id}` (owner or admin)
pub async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    products::delete_product(&state.pool, &auth.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
