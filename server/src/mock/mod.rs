//! In-memory mock of the REST API, served under `/mock/api`.
//!
//! SYSTEM CONTEXT
//! ==============
//! The mock mirrors every `/api` route with the same envelopes and status
//! codes but keeps its data in [`store::MockData`]. It backs local frontend
//! work without Postgres (`MOCK_ONLY=true`) and the client end-to-end tests.
//! `POST /mock/api/test/expire-sessions` revokes every token so clients can
//! exercise their 401 handling.

pub mod store;

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{RequestPartsExt, Router};
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use models::{
    AddCartItemRequest, CategoryRequest, ChangePasswordRequest, CheckoutRequest, CreateIssueRequest,
    CreateProductRequest, IssueQuery, LoginRequest, OrderQuery, ProductQuery, RegisterRequest, Role,
    UpdateCartItemRequest, UpdateIssueStatusRequest, UpdateOrderStatusRequest, UpdateProductRequest,
    UpdateProfileRequest, UpdateRoleRequest, User, UserQuery,
};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiJson, ApiQuery, ok};
use store::MockData;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// Shared mock state. Cloned into every handler.
#[derive(Clone)]
pub struct MockState {
    data: Arc<RwLock<MockData>>,
}

impl MockState {
    #[must_use]
    pub fn seeded() -> Self {
        Self { data: Arc::new(RwLock::new(MockData::seeded())) }
    }
}

/// Mock routes with fresh seed data, to be nested under `/mock`.
pub fn router() -> Router {
    router_with(MockState::seeded())
}

pub fn router_with(state: MockState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/users", get(list_users))
        .route("/api/users/artisans", get(list_artisans))
        .route("/api/users/me", put(update_me))
        .route("/api/users/me/password", put(change_password))
        .route("/api/users/{id}", get(get_user).delete(delete_user))
        .route("/api/users/{id}/role", put(update_role))
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/{id}", get(get_product).put(update_product).delete(delete_product))
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_cart_item))
        .route("/api/cart/items/{product_id}", put(update_cart_item).delete(remove_cart_item))
        .route("/api/orders", get(list_orders))
        .route("/api/orders/checkout", post(checkout))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/status", put(update_order_status))
        .route("/api/issues", get(list_issues).post(create_issue))
        .route("/api/issues/{id}/status", put(update_issue_status))
        .route("/api/test/expire-sessions", post(expire_sessions))
        .with_state(state)
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// Caller holding a live mock session.
pub struct MockAuth {
    pub user: User,
    pub token: String,
}

async fn bearer_token(parts: &mut Parts) -> Option<String> {
    parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .ok()
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_owned())
}

impl FromRequestParts<MockState> for MockAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &MockState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).await.ok_or_else(ApiError::unauthorized)?;
        let user = state
            .data
            .read()
            .await
            .session_user(&token)
            .ok_or_else(|| ApiError::Unauthorized("Session expired or invalid".into()))?;
        Ok(Self { user, token })
    }
}

/// Mock caller that must be an administrator.
pub struct MockAdmin(pub MockAuth);

impl FromRequestParts<MockState> for MockAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &MockState) -> Result<Self, Self::Rejection> {
        let auth = MockAuth::from_request_parts(parts, state).await?;
        crate::routes::auth::require_role(&auth.user, &[Role::Admin])?;
        Ok(Self(auth))
    }
}

/// Optional mock caller for public routes.
pub struct MaybeMockAuth(pub Option<User>);

impl FromRequestParts<MockState> for MaybeMockAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &MockState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts).await else {
            return Ok(Self(None));
        };
        Ok(Self(state.data.read().await.session_user(&token)))
    }
}

// =============================================================================
// AUTH / USERS
// =============================================================================

async fn register(
    State(state): State<MockState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = state.data.write().await.register(&req)?;
    Ok((StatusCode::CREATED, ok(payload)))
}

async fn login(State(state): State<MockState>, ApiJson(req): ApiJson<LoginRequest>) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.write().await.login(&req)?))
}

async fn me(auth: MockAuth) -> impl IntoResponse {
    ok(auth.user)
}

async fn logout(State(state): State<MockState>, auth: MockAuth) -> StatusCode {
    state.data.write().await.logout(&auth.token);
    StatusCode::NO_CONTENT
}

async fn expire_sessions(State(state): State<MockState>) -> impl IntoResponse {
    let revoked = state.data.write().await.expire_sessions();
    info!(revoked, "mock: sessions expired");
    ok(json!({ "revoked": revoked }))
}

async fn list_users(
    State(state): State<MockState>,
    _admin: MockAdmin,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> impl IntoResponse {
    ok(state.data.read().await.list_users(&query))
}

async fn list_artisans(State(state): State<MockState>) -> impl IntoResponse {
    ok(state.data.read().await.list_artisans())
}

async fn get_user(
    State(state): State<MockState>,
    auth: MockAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if auth.user.id != id && auth.user.role != Role::Admin {
        return Err(ApiError::forbidden());
    }
    Ok(ok(state.data.read().await.get_user(id)?))
}

async fn update_me(
    State(state): State<MockState>,
    auth: MockAuth,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.write().await.update_profile(auth.user.id, &req)?))
}

async fn change_password(
    State(state): State<MockState>,
    auth: MockAuth,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .data
        .write()
        .await
        .change_password(auth.user.id, &auth.token, &req.current_password, &req.new_password)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_role(
    State(state): State<MockState>,
    MockAdmin(admin): MockAdmin,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.write().await.update_role(admin.user.id, id, req.role)?))
}

async fn delete_user(
    State(state): State<MockState>,
    MockAdmin(admin): MockAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.data.write().await.delete_user(admin.user.id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// CATALOGUE
// =============================================================================

async fn list_categories(State(state): State<MockState>) -> impl IntoResponse {
    ok(state.data.read().await.list_categories())
}

async fn get_category(State(state): State<MockState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.read().await.get_category(id)?))
}

async fn create_category(
    State(state): State<MockState>,
    _admin: MockAdmin,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.data.write().await.create_category(&req)?;
    Ok((StatusCode::CREATED, ok(category)))
}

async fn update_category(
    State(state): State<MockState>,
    _admin: MockAdmin,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.write().await.update_category(id, &req)?))
}

async fn delete_category(
    State(state): State<MockState>,
    _admin: MockAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.data.write().await.delete_category(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_products(
    State(state): State<MockState>,
    MaybeMockAuth(viewer): MaybeMockAuth,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> impl IntoResponse {
    ok(state.data.read().await.list_products(&query, viewer.as_ref()))
}

async fn get_product(
    State(state): State<MockState>,
    MaybeMockAuth(viewer): MaybeMockAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.read().await.get_product(id, viewer.as_ref())?))
}

async fn create_product(
    State(state): State<MockState>,
    auth: MockAuth,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.data.write().await.create_product(&auth.user, &req)?;
    Ok((StatusCode::CREATED, ok(product)))
}

async fn update_product(
    State(state): State<MockState>,
    auth: MockAuth,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.write().await.update_product(&auth.user, id, &req)?))
}

async fn delete_product(
    State(state): State<MockState>,
    auth: MockAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.data.write().await.delete_product(&auth.user, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// CART / ORDERS / ISSUES
// =============================================================================

async fn get_cart(State(state): State<MockState>, auth: MockAuth) -> impl IntoResponse {
    ok(state.data.read().await.cart(auth.user.id))
}

async fn add_cart_item(
    State(state): State<MockState>,
    auth: MockAuth,
    ApiJson(req): ApiJson<AddCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.write().await.add_to_cart(auth.user.id, &req)?))
}

async fn update_cart_item(
    State(state): State<MockState>,
    auth: MockAuth,
    Path(product_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.write().await.set_cart_quantity(auth.user.id, product_id, req.quantity)?))
}

async fn remove_cart_item(
    State(state): State<MockState>,
    auth: MockAuth,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.write().await.remove_from_cart(auth.user.id, product_id)?))
}

async fn clear_cart(State(state): State<MockState>, auth: MockAuth) -> StatusCode {
    state.data.write().await.clear_cart(auth.user.id);
    StatusCode::NO_CONTENT
}

async fn checkout(
    State(state): State<MockState>,
    auth: MockAuth,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.data.write().await.checkout(&auth.user, &req)?;
    Ok((StatusCode::CREATED, ok(order)))
}

async fn list_orders(
    State(state): State<MockState>,
    auth: MockAuth,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> impl IntoResponse {
    ok(state.data.read().await.list_orders(&auth.user, &query))
}

async fn get_order(
    State(state): State<MockState>,
    auth: MockAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.read().await.get_order(&auth.user, id)?))
}

async fn update_order_status(
    State(state): State<MockState>,
    auth: MockAuth,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.write().await.update_order_status(&auth.user, id, req.status)?))
}

async fn create_issue(
    State(state): State<MockState>,
    auth: MockAuth,
    ApiJson(req): ApiJson<CreateIssueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let issue = state.data.write().await.create_issue(&auth.user, &req)?;
    Ok((StatusCode::CREATED, ok(issue)))
}

async fn list_issues(
    State(state): State<MockState>,
    auth: MockAuth,
    ApiQuery(query): ApiQuery<IssueQuery>,
) -> impl IntoResponse {
    ok(state.data.read().await.list_issues(&auth.user, &query))
}

async fn update_issue_status(
    State(state): State<MockState>,
    _admin: MockAdmin,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateIssueStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.data.write().await.update_issue_status(id, req.status)?))
}
