//! Fallback pages for unknown paths and refused actions.

use crate::components::view::{View, alert, link};
use crate::components::widgets::page_shell;
use crate::router::{LoadResult, Page};
use crate::state::session::Session;

use super::{Ctx, boxed};

pub struct NotFoundPage {
    pub session: Option<Session>,
    pub path: String,
}

impl Page for NotFoundPage {
    fn render(&self) -> View {
        page_shell(
            self.session.as_ref(),
            "Not Found",
            vec![
                alert("warning", format!("Nothing lives at {}.", self.path)).into(),
                link("/", "Back to the shop").into(),
            ],
        )
    }
}

pub async fn not_found(ctx: Ctx) -> LoadResult {
    Ok(boxed(NotFoundPage { session: ctx.services.session.current(), path: ctx.location.path.clone() }))
}

pub struct ForbiddenPage {
    pub session: Option<Session>,
}

impl Page for ForbiddenPage {
    fn render(&self) -> View {
        page_shell(
            self.session.as_ref(),
            "Forbidden",
            vec![
                alert("danger", "You do not have permission to do that.").into(),
                link("/", "Back to the shop").into(),
            ],
        )
    }
}

pub async fn forbidden(ctx: Ctx) -> LoadResult {
    Ok(boxed(ForbiddenPage { session: ctx.services.session.current() }))
}
