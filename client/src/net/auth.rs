//! `/api/auth` client.
//!
//! Login and registration store the returned session; logout always drops the
//! local session, even when the server call fails.

use models::{AuthPayload, LoginRequest, RegisterRequest, User};
use reqwest::Method;
use tracing::info;

use super::api::{ApiClient, ApiError};
use crate::state::session::Session;

pub struct AuthApi<'a> {
    api: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let req = LoginRequest { email: email.trim().to_owned(), password: password.to_owned() };
        let payload: AuthPayload = self.api.post("/api/auth/login", &req).await?;
        Ok(self.store(payload))
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<Session, ApiError> {
        let payload: AuthPayload = self.api.post("/api/auth/register", req).await?;
        Ok(self.store(payload))
    }

    /// Refresh the session's user from the server.
    pub async fn me(&self) -> Result<User, ApiError> {
        let user: User = self.api.get("/api/auth/me").await?;
        self.api.session().update_user(user.clone());
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = if self.api.session().is_authenticated() {
            self.api.send_empty(Method::POST, "/api/auth/logout").await
        } else {
            Ok(())
        };
        self.api.session().clear();
        result
    }

    fn store(&self, payload: AuthPayload) -> Session {
        let session = Session { token: payload.token, user: payload.user };
        info!(user_id = %session.user.id, role = %session.user.role, "signed in");
        self.api.session().set(session.clone());
        session
    }
}
