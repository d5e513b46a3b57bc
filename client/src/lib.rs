//! # client
//!
//! Headless storefront front end. Owns the client-side router and its auth
//! guards, the persisted session store, the REST and monitor clients, and the
//! page loaders that turn API data into typed [`components::view::View`]
//! trees. The `cli` crate hosts it in a terminal; tests drive it against the
//! server's mock backend.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod router;
pub mod state;
pub mod util;

pub use app::{Action, App};
pub use router::{NavigationState, Page, PageContext, Router};
pub use state::session::{FileStorage, MemoryStorage, Session, SessionStore, Storage};
