//! User routes: admin listing and role management, self-service profile.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use models::{Role, UpdateProfileRequest, UpdateRoleRequest, UserQuery};
use uuid::Uuid;

use super::auth::{AdminUser, AuthUser};
use crate::error::{ApiError, ApiJson, ApiQuery, ok};
use crate::services::users;
use crate::state::AppState;

/// `GET /api/users` (admin)
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(users::list_users(&state.pool, &query).await?))
}

/// `GET /api/users/artisans` (public)
pub async fn list_artisans(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(users::list_artisans(&state.pool).await?))
}

/// `GET /api/users/{id}` (admin or self)
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if auth.user.id != user_id && auth.user.role != Role::Admin {
        return Err(ApiError::forbidden());
    }
    Ok(ok(users::get_user(&state.pool, user_id).await?))
}

/// `PUT /api/users/me`
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(users::update_profile(&state.pool, auth.user.id, &req).await?))
}

/// `PUT /api/users/{id}/role` (admin)
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(users::update_role(&state.pool, admin.user.id, user_id, req.role).await?))
}

/// `DELETE /api/users/{id}` (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    users::delete_user(&state.pool, admin.user.id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
