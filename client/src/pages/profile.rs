//! Profile page (`/profile`, signed in): account details, password change and
//! the user's support issues.

use models::{Issue, IssueQuery, Paged, User};

use crate::components::view::{View, button, el, heading, input, paragraph, table, text};
use crate::components::widgets::{details, page_shell};
use crate::router::{LoadResult, Page};
use crate::state::session::Session;

use super::{Ctx, boxed};

pub struct ProfilePage {
    pub session: Option<Session>,
    pub user: User,
    pub issues: Paged<Issue>,
}

fn issue_rows(issues: &[Issue]) -> Vec<Vec<View>> {
    issues
        .iter()
        .map(|issue| {
            vec![
                text(issue.subject.clone()),
                text(issue.order_id.map(|id| id.to_string()).unwrap_or_default()),
                text(issue.status.to_string()),
            ]
        })
        .collect()
}

impl Page for ProfilePage {
    fn render(&self) -> View {
        let u = &self.user;
        let profile_form = el("form")
            .attr("data-form", "update-profile")
            .child(input("name", "text", u.name.clone()))
            .child(input("phone", "tel", u.phone.clone().unwrap_or_default()))
            .child(input("address", "text", u.address.clone().unwrap_or_default()))
            .child(button("update-profile", "Save profile"));
        let password_form = el("form")
            .attr("data-form", "change-password")
            .child(input("current_password", "password", ""))
            .child(input("new_password", "password", ""))
            .child(button("change-password", "Change password"));
        let issue_form = el("form")
            .attr("data-form", "report-issue")
            .child(input("subject", "text", ""))
            .child(input("description", "text", ""))
            .child(input("order_id", "text", ""))
            .child(button("report-issue", "Report issue"));

        let mut body = vec![
            details(vec![
                ("Name", u.name.clone()),
                ("Email", u.email.clone()),
                ("Role", u.role.to_string()),
                ("Phone", u.phone.clone().unwrap_or_else(|| "-".to_owned())),
                ("Address", u.address.clone().unwrap_or_else(|| "-".to_owned())),
            ]),
            profile_form.into(),
            heading(2, "Password").into(),
            password_form.into(),
            heading(2, "Support issues").into(),
        ];
        if self.issues.items.is_empty() {
            body.push(paragraph("No issues reported.").into());
        } else {
            body.push(table(&["Subject", "Order", "Status"], issue_rows(&self.issues.items)).into());
        }
        body.push(issue_form.into());
        page_shell(self.session.as_ref(), "Your profile", body)
    }
}

pub async fn load(ctx: Ctx) -> LoadResult {
    let api = &ctx.services.api;
    let (auth_api, issues_api) = (api.auth(), api.issues());
    let issue_query = IssueQuery::default();
    let (user, issues) = tokio::join!(auth_api.me(), issues_api.list(&issue_query));
    Ok(boxed(ProfilePage { session: ctx.services.session.current(), user: user?, issues: issues? }))
}
