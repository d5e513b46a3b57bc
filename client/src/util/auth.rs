//! Route guard decisions.
//!
//! SYSTEM CONTEXT
//! ==============
//! The router asks [`evaluate`] before every page load. The decision is a pure
//! function of the current session and the route's options: no loader runs
//! for a redirected request.

use models::Role;

use crate::state::session::Session;
use crate::util::location::with_query;

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

pub const LOGIN_PATH: &str = "/login";
/// Where role-mismatched users are sent.
pub const FORBIDDEN_TARGET: &str = "/";
pub const REDIRECT_PARAM: &str = "redirect";

/// Guard options attached to a registered route.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteOptions {
    pub require_auth: bool,
    /// Roles allowed to open the route. `None` admits every role.
    pub roles: Option<Vec<Role>>,
    pub title: String,
}

impl RouteOptions {
    #[must_use]
    pub fn public(title: impl Into<String>) -> Self {
        Self { require_auth: false, roles: None, title: title.into() }
    }

    #[must_use]
    pub fn authenticated(title: impl Into<String>) -> Self {
        Self { require_auth: true, roles: None, title: title.into() }
    }

    #[must_use]
    pub fn with_roles(mut self, roles: &[Role]) -> Self {
        self.roles = Some(roles.to_vec());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectLogin,
    RedirectForbidden,
}

/// Decide whether a route is reachable with `session`.
///
/// A role list implies authentication: an anonymous visitor is sent to login
/// rather than to the forbidden target.
#[must_use]
pub fn evaluate(session: Option<&Session>, options: &RouteOptions) -> GateDecision {
    let needs_session = options.require_auth || options.roles.is_some();
    let Some(session) = session else {
        return if needs_session { GateDecision::RedirectLogin } else { GateDecision::Allow };
    };
    match &options.roles {
        Some(roles) if !roles.contains(&session.user.role) => GateDecision::RedirectForbidden,
        _ => GateDecision::Allow,
    }
}

/// Login path carrying the originally requested location.
#[must_use]
pub fn login_target(original: &str) -> String {
    with_query(LOGIN_PATH, &[(REDIRECT_PARAM, original)])
}

/// Where a decision sends the visitor, or `None` for [`GateDecision::Allow`].
#[must_use]
pub fn redirect_target(decision: GateDecision, original: &str) -> Option<String> {
    match decision {
        GateDecision::Allow => None,
        GateDecision::RedirectLogin => Some(login_target(original)),
        GateDecision::RedirectForbidden => Some(FORBIDDEN_TARGET.to_owned()),
    }
}

/// Sanitize a post-login `redirect` value: only in-app absolute paths, and
/// never back to the login page itself.
#[must_use]
pub fn safe_redirect(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with(LOGIN_PATH) => path.to_owned(),
        _ => "/".to_owned(),
    }
}
