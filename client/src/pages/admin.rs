//! Admin dashboard (`/admin`, admins only).
//!
//! LIFECYCLE
//! =========
//! 1. `load` fetches users, orders and issues concurrently
//! 2. `mount` starts the monitor websocket task feeding `DashboardState`
//! 3. `render` shows the tables plus the latest metrics and smoke run
//! 4. `unmount` cancels the monitor task

use models::{Issue, IssueQuery, IssueStatus, Order, OrderQuery, Paged, Role, User, UserQuery};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::components::view::{View, button, el, heading, list, paragraph, table, text};
use crate::components::widgets::{order_table, page_shell};
use crate::net::monitor::{RECONNECT_DELAY, monitor_url, run_monitor};
use crate::router::{LoadResult, Page, PageError};
use crate::state::dashboard::{DashboardState, RollbackStage};
use crate::state::session::Session;

use super::{Ctx, boxed};

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;

pub struct AdminPage {
    pub session: Session,
    pub users: Paged<User>,
    pub orders: Paged<Order>,
    pub issues: Paged<Issue>,
    monitor_url: String,
    dashboard_tx: watch::Sender<DashboardState>,
    dashboard: watch::Receiver<DashboardState>,
    monitor: Option<CancellationToken>,
}

impl AdminPage {
    #[must_use]
    pub fn new(session: Session, base_url: &str, users: Paged<User>, orders: Paged<Order>, issues: Paged<Issue>) -> Self {
        let (dashboard_tx, dashboard) = watch::channel(DashboardState::default());
        Self {
            monitor_url: monitor_url(base_url, &session.token),
            session,
            users,
            orders,
            issues,
            dashboard_tx,
            dashboard,
            monitor: None,
        }
    }

    #[must_use]
    pub fn dashboard(&self) -> DashboardState {
        self.dashboard.borrow().clone()
    }

    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.monitor.as_ref().is_some_and(|token| !token.is_cancelled())
    }

    fn monitor_view(&self) -> View {
        let state = self.dashboard.borrow();
        let connection = if state.connected { "connected" } else { "disconnected" };
        let mut section = el("section")
            .child(heading(2, "Monitoring"))
            .child(paragraph(format!("Live feed: {connection} ({} connection(s))", state.connections)));
        section = match &state.metrics {
            Some(m) => section.child(list([
                format!("Uptime: {}s", m.uptime_secs),
                format!("Requests: {} ({} client errors, {} server errors)", m.requests_total, m.client_errors, m.server_errors),
                format!("In flight: {}", m.in_flight),
                format!("Dashboards: {}", m.ws_subscribers),
                format!("DB pool: {} ({} idle)", m.db_pool_size, m.db_pool_idle),
            ])),
            None => section.child(paragraph("Waiting for metrics...")),
        };
        if let Some(run) = &state.run {
            let summary = match &run.result {
                Some(done) => format!("{}: {} passed, {} failed in {} ms", run.suite, done.passed, done.failed, done.duration_ms),
                None => format!("{}: running {}/{}", run.suite, run.logs.len(), run.checks),
            };
            section = section.child(paragraph(summary)).child(list(run.logs.iter().map(|log| {
                let mark = if log.passed { "ok" } else { "FAIL" };
                format!("[{mark}] {} {}", log.check, log.detail)
            })));
        }
        if let Some(last) = state.rollbacks.last() {
            let stage = match last.stage {
                RollbackStage::Started => "started",
                RollbackStage::Completed => "completed",
                RollbackStage::Failed => "FAILED",
            };
            section = section.child(paragraph(format!("Last rollback {stage}: {}", last.reason)));
        }
        section.child(button("run-smoke", "Run smoke tests")).into()
    }
}

fn user_rows(users: &[User]) -> Vec<Vec<View>> {
    users
        .iter()
        .map(|u| {
            let promote = Role::ALL
                .into_iter()
                .filter(|r| *r != u.role)
                .map(|r| button(format!("user-role:{}:{r}", u.id), format!("Make {r}")));
            vec![text(u.name.clone()), text(u.email.clone()), text(u.role.to_string()), el("span").children(promote).into()]
        })
        .collect()
}

fn issue_rows(issues: &[Issue]) -> Vec<Vec<View>> {
    issues
        .iter()
        .map(|issue| {
            let actions = IssueStatus::ALL
                .into_iter()
                .filter(|s| *s != issue.status)
                .map(|s| button(format!("issue-status:{}:{s}", issue.id), s.as_str()));
            vec![text(issue.subject.clone()), text(issue.status.to_string()), el("span").children(actions).into()]
        })
        .collect()
}

impl Page for AdminPage {
    fn render(&self) -> View {
        let body = vec![
            self.monitor_view(),
            heading(2, format!("Users ({})", self.users.total)).into(),
            table(&["Name", "Email", "Role", "Actions"], user_rows(&self.users.items)).into(),
            heading(2, format!("Orders ({})", self.orders.total)).into(),
            order_table(&self.orders.items, Role::Admin),
            heading(2, format!("Issues ({})", self.issues.total)).into(),
            table(&["Subject", "Status", "Actions"], issue_rows(&self.issues.items)).into(),
        ];
        page_shell(Some(&self.session), "Admin dashboard", body)
    }

    fn mount(&mut self) {
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("no async runtime; monitor feed disabled");
            return;
        }
        let token = CancellationToken::new();
        tokio::spawn(run_monitor(self.monitor_url.clone(), self.dashboard_tx.clone(), token.clone(), RECONNECT_DELAY));
        self.monitor = Some(token);
    }

    fn unmount(&mut self) {
        if let Some(token) = self.monitor.take() {
            token.cancel();
        }
    }
}

pub async fn load(ctx: Ctx) -> LoadResult {
    let session = ctx.services.session.current().ok_or_else(|| PageError::invalid("Not signed in"))?;
    let api = &ctx.services.api;
    let (users_api, orders_api, issues_api) = (api.users(), api.orders(), api.issues());
    let (user_query, order_query, issue_query) = (UserQuery::default(), OrderQuery::default(), IssueQuery::default());
    let (users, orders, issues) = tokio::join!(
        users_api.list(&user_query),
        orders_api.list(&order_query),
        issues_api.list(&issue_query),
    );
    Ok(boxed(AdminPage::new(session, api.base_url(), users?, orders?, issues?)))
}
