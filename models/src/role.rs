//! Account roles.

use std::fmt;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "role_test.rs"]
mod tests;

/// Role attached to every account. Drives route guards on the client and
/// authorization checks on the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Shopper: browses, fills a cart, checks out.
    Client,
    /// Seller: owns products and moves their orders through fulfilment.
    Artisan,
    /// Operator: bypasses ownership and status rules.
    Admin,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Client, Self::Artisan, Self::Admin];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Artisan => "artisan",
            Self::Admin => "admin",
        }
    }

    /// Parse a role name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "client" => Some(Self::Client),
            "artisan" => Some(Self::Artisan),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
