//! Order and issue status rules.
//!
//! DESIGN
//! ======
//! Fulfilment follows a fixed table for non-admin actors:
//! `pending -> accepted | refused`, `accepted -> shipped`,
//! `shipped -> delivered`. `refused` and `delivered` are terminal.
//! Admins bypass the table and may set any status directly. The check is a
//! pure function so the real server and the mock backend agree exactly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::role::Role;

#[cfg(test)]
#[path = "order_test.rs"]
mod tests;

/// Lifecycle status of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Refused,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [Self; 5] = [Self::Pending, Self::Accepted, Self::Refused, Self::Shipped, Self::Delivered];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Refused => "refused",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    /// Statuses a non-admin actor may move to from `self`.
    #[must_use]
    pub fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Refused],
            Self::Accepted => &[Self::Shipped],
            Self::Shipped => &[Self::Delivered],
            Self::Refused | Self::Delivered => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot change order status from {from} to {to}")]
    NotAllowed { from: OrderStatus, to: OrderStatus },
}

/// Decide whether `actor` may move an order from `current` to `next`.
///
/// # Errors
///
/// Returns [`TransitionError::NotAllowed`] when a non-admin asks for a
/// transition missing from the table.
pub fn check_transition(current: OrderStatus, next: OrderStatus, actor: Role) -> Result<(), TransitionError> {
    if actor.is_admin() || current.can_transition_to(next) {
        return Ok(());
    }
    Err(TransitionError::NotAllowed { from: current, to: next })
}

/// How the customer pays at checkout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Card,
}

impl PaymentMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::Card => "card",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cash_on_delivery" | "cod" => Some(Self::CashOnDelivery),
            "card" => Some(Self::Card),
            _ => None,
        }
    }

    /// Card payments must reference a payment intent created beforehand.
    #[must_use]
    pub fn requires_intent(self) -> bool {
        matches!(self, Self::Card)
    }
}

/// Support issue lifecycle. Only admins change it, so there is no table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl IssueStatus {
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
