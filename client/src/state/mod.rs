//! Client-side state stores.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` is the single observable authentication store, `toast` collects
//! user-facing notifications, and `dashboard` folds monitor pushes into the
//! admin dashboard view model. All of them are injected through
//! [`crate::app::Services`] rather than reached as globals.

pub mod dashboard;
pub mod session;
pub mod toast;
