//! Support issue service.

use models::{CreateIssueRequest, Issue, IssueQuery, IssueStatus, Paged, Role, User};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("issue not found: {0}")]
    NotFound(Uuid),
    #[error("subject and description are required")]
    MissingFields,
    #[error("order not found: {0}")]
    UnknownOrder(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<IssueError> for ApiError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::NotFound(_) => Self::not_found("Issue"),
            IssueError::UnknownOrder(_) => Self::not_found("Order"),
            IssueError::MissingFields => Self::BadRequest(err.to_string()),
            IssueError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

const ISSUE_COLUMNS: &str = "i.id, i.user_id, i.order_id, i.subject, i.description, i.status, iso8601(i.created_at) AS created_at";

#[derive(Debug, sqlx::FromRow)]
struct IssueRow {
    id: Uuid,
    user_id: Uuid,
    order_id: Option<Uuid>,
    subject: String,
    description: String,
    status: String,
    created_at: Option<String>,
}

impl From<IssueRow> for Issue {
    fn from(row: IssueRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            order_id: row.order_id,
            subject: row.subject,
            description: row.description,
            status: IssueStatus::parse(&row.status).unwrap_or(IssueStatus::Open),
            created_at: row.created_at,
        }
    }
}

/// Open an issue. A referenced order must belong to the reporter.
pub async fn create_issue(pool: &PgPool, reporter: &User, req: &CreateIssueRequest) -> Result<Issue, IssueError> {
    let subject = req.subject.trim();
    let description = req.description.trim();
    if subject.is_empty() || description.is_empty() {
        return Err(IssueError::MissingFields);
    }
    if let Some(order_id) = req.order_id {
        let owned: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1 AND user_id = $2)")
            .bind(order_id)
            .bind(reporter.id)
            .fetch_one(pool)
            .await?;
        if !owned {
            return Err(IssueError::UnknownOrder(order_id));
        }
    }

    let sql = format!(
        "INSERT INTO issues AS i (user_id, order_id, subject, description) VALUES ($1, $2, $3, $4) RETURNING {ISSUE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, IssueRow>(&sql)
        .bind(reporter.id)
        .bind(req.order_id)
        .bind(subject)
        .bind(description)
        .fetch_one(pool)
        .await?;
    Ok(row.into())
}

fn push_issue_filters(builder: &mut QueryBuilder<'_, Postgres>, viewer: &User, query: &IssueQuery) {
    builder.push(" WHERE TRUE");
    if viewer.role != Role::Admin {
        builder.push(" AND i.user_id = ").push_bind(viewer.id);
    }
    if let Some(status) = query.status {
        builder.push(" AND i.status = ").push_bind(status.as_str());
    }
}

/// Own issues, or every issue for admins.
pub async fn list_issues(pool: &PgPool, viewer: &User, query: &IssueQuery) -> Result<Paged<Issue>, IssueError> {
    let page_query = query.page_query();
    let (page, per_page) = page_query.normalize();

    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM issues i");
    push_issue_filters(&mut count, viewer, query);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::new(format!("SELECT {ISSUE_COLUMNS} FROM issues i"));
    push_issue_filters(&mut select, viewer, query);
    select
        .push(" ORDER BY i.created_at DESC, i.id LIMIT ")
        .push_bind(i64::from(per_page))
        .push(" OFFSET ")
        .push_bind(page_query.offset());
    let rows = select.build_query_as::<IssueRow>().fetch_all(pool).await?;

    Ok(Paged { items: rows.into_iter().map(Issue::from).collect(), total, page, per_page })
}

pub async fn update_issue_status(pool: &PgPool, id: Uuid, status: IssueStatus) -> Result<Issue, IssueError> {
    let sql = format!("UPDATE issues AS i SET status = $2, updated_at = now() WHERE i.id = $1 RETURNING {ISSUE_COLUMNS}");
    sqlx::query_as::<_, IssueRow>(&sql)
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await?
        .map(Issue::from)
        .ok_or(IssueError::NotFound(id))
}

#[cfg(test)]
#[path = "issues_test.rs"]
mod tests;
