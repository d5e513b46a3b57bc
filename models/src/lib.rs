//! Shared storefront wire model.
//!
//! This crate owns the JSON shapes exchanged between `server` and `client`:
//! resource DTOs, the response envelope, order status rules, pricing helpers
//! and monitoring messages. It performs no I/O so both sides (and the mock
//! backend) apply exactly the same rules.

pub mod envelope;
pub mod money;
pub mod monitor;
pub mod order;
pub mod resources;
pub mod role;

pub use envelope::{ApiEnvelope, PageQuery, Paged};
pub use monitor::MonitorMessage;
pub use order::{IssueStatus, OrderStatus, PaymentMethod, TransitionError, check_transition};
pub use resources::*;
pub use role::Role;
