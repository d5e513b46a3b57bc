//! Response envelope and pagination shapes.
//!
//! Most routes answer `{ "success": true, "data": ... }`; failures answer
//! `{ "success": false, "error": "..." }`. Some routes return raw arrays or
//! objects, so clients must accept both (see `client::api`).

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "envelope_test.rs"]
mod tests;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), message: None, error: None }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The human-readable failure text: `error`, else `message`.
    #[must_use]
    pub fn failure_text(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

impl ApiEnvelope<serde_json::Value> {
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, data: None, message: None, error: Some(error.into()) }
    }
}

/// One page of a filtered, sorted listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Paged<T> {
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        let total = u64::try_from(self.total.max(0)).unwrap_or(0);
        u32::try_from(total.div_ceil(u64::from(self.per_page))).unwrap_or(u32::MAX)
    }
}

/// Raw `page` / `per_page` query parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// 1-based page and clamped page size.
    #[must_use]
    pub fn normalize(self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }

    #[must_use]
    pub fn offset(self) -> i64 {
        let (page, per_page) = self.normalize();
        i64::from(page - 1) * i64::from(per_page)
    }
}
