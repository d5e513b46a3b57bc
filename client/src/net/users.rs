//! `/api/users` client.

use models::{
    ArtisanSummary, ChangePasswordRequest, Paged, Role, UpdateProfileRequest, UpdateRoleRequest, User, UserQuery,
};
use reqwest::Method;
use uuid::Uuid;

use super::api::{ApiClient, ApiError};

pub struct UsersApi<'a> {
    api: &'a ApiClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Admin listing.
    pub async fn list(&self, query: &UserQuery) -> Result<Paged<User>, ApiError> {
        self.api.get_query("/api/users", query).await
    }

    pub async fn get(&self, id: Uuid) -> Result<User, ApiError> {
        self.api.get(&format!("/api/users/{id}")).await
    }

    /// Public artisan directory used by catalogue filters.
    pub async fn artisans(&self) -> Result<Vec<ArtisanSummary>, ApiError> {
        self.api.get("/api/users/artisans").await
    }

    /// Update the caller's own profile and refresh the stored session user.
    pub async fn update_profile(&self, req: &UpdateProfileRequest) -> Result<User, ApiError> {
        let user: User = self.api.put("/api/users/me", req).await?;
        self.api.session().update_user(user.clone());
        Ok(user)
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<(), ApiError> {
        let req = ChangePasswordRequest {
            current_password: current_password.to_owned(),
            new_password: new_password.to_owned(),
        };
        self.api.send_json_empty(Method::PUT, "/api/users/me/password", &req).await
    }

    pub async fn update_role(&self, id: Uuid, role: Role) -> Result<User, ApiError> {
        self.api.put(&format!("/api/users/{id}/role"), &UpdateRoleRequest { role }).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.api.send_empty(Method::DELETE, &format!("/api/users/{id}")).await
    }
}
