//! Registration page. Shoppers and artisans sign themselves up; admin accounts
//! are only granted by another admin.

use models::Role;

use crate::components::view::{View, button, el, input, link};
use crate::components::widgets::page_shell;
use crate::router::{LoadResult, Page};
use crate::state::session::Session;

use super::{Ctx, boxed};

pub struct RegisterPage {
    pub session: Option<Session>,
}

impl Page for RegisterPage {
    fn render(&self) -> View {
        let roles = el("select")
            .attr("name", "role")
            .children([Role::Client, Role::Artisan].map(|role| el("option").attr("value", role.as_str()).text(role.as_str())));
        let form = el("form")
            .attr("data-form", "register")
            .child(input("name", "text", ""))
            .child(input("email", "email", ""))
            .child(input("password", "password", ""))
            .child(roles)
            .child(button("register", "Create account"));
        let body = vec![
            form.into(),
            el("p").text("Already registered? ").child(link("/login", "Log in")).into(),
        ];
        page_shell(self.session.as_ref(), "Register", body)
    }
}

pub async fn load(ctx: Ctx) -> LoadResult {
    Ok(boxed(RegisterPage { session: ctx.services.session.current() }))
}
