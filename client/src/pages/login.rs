//! Login page.
//!
//! SYSTEM CONTEXT
//! ==============
//! Guards send anonymous visitors here with `redirect=<original path>`; the
//! `login` action returns them there after a successful sign-in.

use crate::components::view::{View, button, el, input, link, paragraph};
use crate::components::widgets::page_shell;
use crate::router::{LoadResult, Page};
use crate::state::session::Session;
use crate::util::auth::{REDIRECT_PARAM, safe_redirect};

use super::{Ctx, boxed};

#[cfg(test)]
#[path = "login_test.rs"]
mod tests;

pub struct LoginPage {
    pub session: Option<Session>,
    /// Sanitized post-login destination.
    pub redirect: String,
}

impl Page for LoginPage {
    fn render(&self) -> View {
        let mut body = Vec::new();
        if let Some(session) = &self.session {
            body.push(paragraph(format!("Signed in as {}.", session.user.email)).into());
        }
        body.push(
            el("form")
                .attr("data-form", "login")
                .child(input("email", "email", ""))
                .child(input("password", "password", ""))
                .child(input("redirect", "hidden", self.redirect.clone()))
                .child(button("login", "Log in"))
                .into(),
        );
        body.push(el("p").text("No account yet? ").child(link("/register", "Register")).into());
        page_shell(self.session.as_ref(), "Log in", body)
    }
}

pub async fn load(ctx: Ctx) -> LoadResult {
    Ok(boxed(LoginPage {
        session: ctx.services.session.current(),
        redirect: safe_redirect(ctx.location.param(REDIRECT_PARAM)),
    }))
}
