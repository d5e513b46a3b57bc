//! Networking modules for the REST API and the monitor websocket.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` is the shared request wrapper (bearer token, envelope unwrapping,
//! error normalization, 401 handling). The per-resource modules are thin
//! typed facades over it, and `monitor` runs the dashboard websocket.

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod issues;
pub mod monitor;
pub mod orders;
pub mod users;

pub use api::{ApiClient, ApiError, ApiEvent};
