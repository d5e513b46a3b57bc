//! Auth routes and the bearer-token extractors every protected route uses.

use axum::RequestPartsExt;
use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use models::{ChangePasswordRequest, LoginRequest, RegisterRequest, Role, User};

use crate::error::{ApiError, ApiJson, ok};
use crate::services::{auth as auth_svc, session};
use crate::state::AppState;

// =============================================================================
// EXTRACTORS
// =============================================================================

/// Authenticated caller, resolved from `Authorization: Bearer <token>`.
/// Missing, unknown and expired tokens are rejected with a 401 envelope.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

async fn bearer_token(parts: &mut Parts) -> Option<String> {
    parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .ok()
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_owned())
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).await.ok_or_else(ApiError::unauthorized)?;
        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, &token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Session expired or invalid".into()))?;
        Ok(Self { user, token })
    }
}

/// Caller that must be an administrator (403 otherwise).
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        require_role(&auth.user, &[Role::Admin])?;
        Ok(Self(auth))
    }
}

/// Optional caller for public routes that show more to signed-in users.
/// An invalid token is treated as anonymous.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts).await else {
            return Ok(Self(None));
        };
        let app_state = AppState::from_ref(state);
        Ok(Self(session::validate_session(&app_state.pool, &token).await?))
    }
}

/// Reject callers whose role is not listed.
pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) { Ok(()) } else { Err(ApiError::forbidden()) }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = auth_svc::register(&state.pool, &req, state.config.session_ttl).await?;
    Ok((StatusCode::CREATED, ok(payload)))
}

/// `POST /api/auth/login`
pub async fn login(State(state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> Result<impl IntoResponse, ApiError> {
    let payload = auth_svc::login(&state.pool, &req, state.config.session_ttl).await?;
    Ok(ok(payload))
}

/// `GET /api/auth/me`
pub async fn me(auth: AuthUser) -> impl IntoResponse {
    ok(auth.user)
}

/// `POST /api/auth/logout`
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> Result<StatusCode, ApiError> {
    session::delete_session(&state.pool, &auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/users/me/password`
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    auth_svc::change_password(&state.pool, auth.user.id, &auth.token, &req).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
