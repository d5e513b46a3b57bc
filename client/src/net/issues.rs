//! `/api/issues` client.

use models::{CreateIssueRequest, Issue, IssueQuery, IssueStatus, Paged, UpdateIssueStatusRequest};
use uuid::Uuid;

use super::api::{ApiClient, ApiError};

pub struct IssuesApi<'a> {
    api: &'a ApiClient,
}

impl<'a> IssuesApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn create(&self, req: &CreateIssueRequest) -> Result<Issue, ApiError> {
        self.api.post("/api/issues", req).await
    }

    /// The caller's issues; every issue for admins.
    pub async fn list(&self, query: &IssueQuery) -> Result<Paged<Issue>, ApiError> {
        self.api.get_query("/api/issues", query).await
    }

    pub async fn update_status(&self, id: Uuid, status: IssueStatus) -> Result<Issue, ApiError> {
        self.api
            .put(&format!("/api/issues/{id}/status"), &UpdateIssueStatusRequest { status })
            .await
    }
}
