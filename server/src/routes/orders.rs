//! Checkout, order and support issue routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use models::{CheckoutRequest, CreateIssueRequest, IssueQuery, OrderQuery, UpdateIssueStatusRequest, UpdateOrderStatusRequest};
use uuid::Uuid;

use super::auth::{AdminUser, AuthUser};
use crate::error::{ApiError, ApiJson, ApiQuery, ok};
use crate::services::{issues, orders};
use crate::state::AppState;

/// `POST /api/orders/checkout`
pub async fn checkout(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = orders::checkout(&state.pool, auth.user.id, &req).await?;
    Ok((StatusCode::CREATED, ok(order)))
}

/// `GET /api/orders`
pub async fn list_orders(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(orders::list_orders(&state.pool, &auth.user, &query).await?))
}

/// `GET /api/orders/{id}`
pub async fn get_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(orders::get_order(&state.pool, &auth.user, id).await?))
}

/// `PUT /api/orders/{id}/status`
pub async fn update_order_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(orders::update_status(&state.pool, &auth.user, id, req.status).await?))
}

/// `POST /api/issues`
pub async fn create_issue(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateIssueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let issue = issues::create_issue(&state.pool, &auth.user, &req).await?;
    Ok((StatusCode::CREATED, ok(issue)))
}

/// `GET /api/issues`
pub async fn list_issues(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<IssueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(issues::list_issues(&state.pool, &auth.user, &query).await?))
}

/// `PUT /api/issues/{id}/status` (admin)
pub async fn update_issue_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateIssueStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(issues::update_issue_status(&state.pool, id, req.status).await?))
}
