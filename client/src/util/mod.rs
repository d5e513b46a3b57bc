//! Utility helpers shared across client modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pure helpers kept apart from the router and pages so they can be tested
//! without any I/O: route guard decisions and location parsing.

pub mod auth;
pub mod location;
