//! Cart routes. Every route acts on the caller's own cart.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use models::{AddCartItemRequest, UpdateCartItemRequest};
use uuid::Uuid;

use super::auth::AuthUser;
use crate::error::{ApiError, ApiJson, ok};
use crate::services::cart;
use crate::state::AppState;

/// `GET /api/cart`
pub async fn get_cart(State(state): State<AppState>, auth: AuthUser) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(cart::get_cart(&state.pool, auth.user.id).await?))
}

/// `POST /api/cart/items`
pub async fn add_item(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<AddCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(cart::add_item(&state.pool, auth.user.id, req.product_id, req.quantity).await?))
}

/// `PUT /api/cart/items/{product_id}`
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(cart::set_quantity(&state.pool, auth.user.id, product_id, req.quantity).await?))
}

/// `DELETE /api/cart/items/{product_id}`
pub async fn remove_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(cart::remove_item(&state.pool, auth.user.id, product_id).await?))
}

/// `DELETE /api/cart`
pub async fn clear_cart(State(state): State<AppState>, auth: AuthUser) -> Result<StatusCode, ApiError> {
    cart::clear_cart(&state.pool, auth.user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
