//! Storefront API server.
//!
//! SYSTEM CONTEXT
//! ==============
//! Axum + SQLx service behind the storefront client: accounts and sessions,
//! catalogue, carts, checkout, order lifecycle, support issues and the admin
//! monitoring feed. The `mock` module serves the same contract from memory.

pub mod config;
pub mod db;
pub mod error;
pub mod mock;
pub mod routes;
pub mod services;
pub mod state;
