//! Shared REST request wrapper.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every resource client funnels through [`ApiClient`]. It attaches the
//! session's bearer token, unwraps `{ success, data }` envelopes (or accepts a
//! raw body), and maps non-2xx responses to [`ApiError`].
//!
//! ERROR HANDLING
//! ==============
//! A 401 from any request clears the session. The call that actually removed
//! the session broadcasts a single [`ApiEvent::Unauthorized`]; later 401s seen
//! while already anonymous stay silent, so the router redirects to login once
//! per session loss. There are no retries and no caching.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::auth::AuthApi;
use super::cart::CartApi;
use super::catalog::{CategoriesApi, ProductsApi};
use super::issues::IssuesApi;
use super::orders::OrdersApi;
use super::users::UsersApi;
use crate::state::session::SessionStore;

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response other than 401.
    #[error("{message}")]
    Http { status: u16, message: String },
    /// 401: the session (if any) has been cleared.
    #[error("{0}")]
    Unauthorized(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Notifications broadcast by the API client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiEvent {
    /// The session was cleared by a 401 response.
    Unauthorized,
}

/// Message used when an error body carries no `error` or `message` field.
#[must_use]
pub fn fallback_message(status: u16) -> String {
    format!("Request failed with status {status}")
}

/// Extract the human-readable failure text from an error body.
#[must_use]
pub fn error_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_owned))
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| fallback_message(status))
}

/// Decode a success body: the envelope's `data` when the body is an
/// envelope, the root value otherwise. An empty body decodes as `null`.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(body).map_err(|e| ApiError::Decode(e.to_string()))?
    };
    let payload = match value {
        Value::Object(mut map) if map.get("success").is_some_and(Value::is_boolean) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
}

/// REST client bound to one backend and one session store. Clones share the
/// HTTP connection pool, the session and the event channel.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
    events: broadcast::Sender<ApiEvent>,
}

impl ApiClient {
    /// `base_url` is the origin the `/api/...` paths hang off, e.g.
    /// `http://127.0.0.1:3000` or `http://127.0.0.1:3000/mock`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http: reqwest::Client::new(), base_url, session, events }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ApiEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn cart(&self) -> CartApi<'_> {
        CartApi::new(self)
    }

    pub fn orders(&self) -> OrdersApi<'_> {
        OrdersApi::new(self)
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }

    pub fn issues(&self) -> IssuesApi<'_> {
        IssuesApi::new(self)
    }

    pub fn products(&self) -> ProductsApi<'_> {
        ProductsApi::new(self)
    }

    pub fn categories(&self) -> CategoriesApi<'_> {
        CategoriesApi::new(self)
    }

    // -------------------------------------------------------------------------
    // Verbs
    // -------------------------------------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(self.request(Method::GET, path)).await
    }

    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.fetch(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch(self.request(Method::PUT, path).json(body)).await
    }

    /// `DELETE` whose response body is decoded.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(self.request(Method::DELETE, path)).await
    }

    /// Request whose success body, if any, is ignored (e.g. `204 No Content`).
    pub async fn send_empty(&self, method: Method, path: &str) -> Result<(), ApiError> {
        self.execute(self.request(method, path)).await.map(|_| ())
    }

    /// Like [`Self::send_empty`] with a JSON body.
    pub async fn send_json_empty<B>(&self, method: Method, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.execute(self.request(method, path).json(body)).await.map(|_| ())
    }

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(request).await?;
        decode_body(&body)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_owned();
        let body = response.bytes().await?.to_vec();
        debug!(%url, status = status.as_u16(), "api response");

        if status == StatusCode::UNAUTHORIZED {
            let message = error_message(status.as_u16(), &body);
            self.handle_unauthorized(&url);
            return Err(ApiError::Unauthorized(message));
        }
        if !status.is_success() {
            return Err(ApiError::Http { status: status.as_u16(), message: error_message(status.as_u16(), &body) });
        }
        Ok(body)
    }

    fn handle_unauthorized(&self, url: &str) {
        if self.session.clear() {
            warn!(%url, "session rejected by server; signing out");
            // Err only means nobody is subscribed.
            let _ = self.events.send(ApiEvent::Unauthorized);
        }
    }
}
