//! Domain services used by the HTTP and monitor routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence so route handlers can
//! stay focused on extraction, authorization and response shaping. Each
//! service exposes its own error enum that converts into `ApiError`.

pub mod auth;
pub mod cart;
pub mod categories;
pub mod issues;
pub mod monitor;
pub mod orders;
pub mod products;
pub mod session;
pub mod smoke;
pub mod users;
