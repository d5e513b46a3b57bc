//! Route-level pages.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each module exposes an async `load` that fetches what the page needs
//! through the injected API client and returns a [`Page`] holding that data.
//! Loaders that need several independent resources fetch them concurrently.
//! Pages only render; user interaction goes through [`crate::app::Action`].

pub mod admin;
pub mod artisan;
pub mod cart;
pub mod checkout;
pub mod errors;
pub mod home;
pub mod login;
pub mod orders;
pub mod product;
pub mod profile;
pub mod register;

use crate::app::Services;
use crate::router::{Page, PageContext};

pub type Ctx = PageContext<Services>;

pub(crate) fn boxed(page: impl Page + 'static) -> Box<dyn Page> {
    Box::new(page)
}

/// Parse an optional numeric query value, ignoring garbage.
pub(crate) fn parse_param<T: std::str::FromStr>(ctx: &Ctx, key: &str) -> Option<T> {
    ctx.location.non_empty_param(key).and_then(|raw| raw.parse().ok())
}
