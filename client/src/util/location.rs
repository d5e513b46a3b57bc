//! Parsing and building in-app locations (`/path?key=value`).
//!
//! Locations are resolved against a fixed dummy origin so the URL parser
//! handles percent-decoding and form encoding of query values.

use reqwest::Url;

#[cfg(test)]
#[path = "location_test.rs"]
mod tests;

const ORIGIN: &str = "http://storefront.local/";

/// A path plus its decoded query pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    /// Parse an in-app href. Relative inputs are taken from the root; input
    /// the URL parser rejects is kept verbatim as a path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let Some(url) = Url::parse(ORIGIN).ok().and_then(|origin| origin.join(raw.trim()).ok()) else {
            return Self { path: raw.to_owned(), query: Vec::new() };
        };
        let query = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        Self { path: url.path().to_owned(), query }
    }

    /// First value of `key`, if present.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Non-empty value of `key`.
    #[must_use]
    pub fn non_empty_param(&self, key: &str) -> Option<&str> {
        self.param(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// The location re-encoded as `path?query`.
    #[must_use]
    pub fn href(&self) -> String {
        let pairs: Vec<(&str, &str)> = self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        with_query(&self.path, &pairs)
    }
}

/// Append form-encoded `pairs` to `path`.
#[must_use]
pub fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return path.to_owned();
    }
    let Ok(mut url) = Url::parse(ORIGIN) else {
        return path.to_owned();
    };
    url.query_pairs_mut().extend_pairs(pairs.iter().copied());
    format!("{path}?{}", url.query().unwrap_or_default())
}
