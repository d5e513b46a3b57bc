//! Client-side router.
//!
//! SYSTEM CONTEXT
//! ==============
//! The router owns the route table, the history stack and the mounted page.
//! Every navigation resolves a path, runs the auth gate, invokes the route's
//! loader and swaps the resulting page in.
//!
//! DESIGN
//! ======
//! - Guard order: missing session on a protected route redirects to login
//!   with `redirect=<original>`; a role mismatch redirects to the forbidden
//!   target; only then does the loader run.
//! - Redirects replace the top history entry instead of pushing.
//! - Each navigation owns a `CancellationToken`. Starting a new one cancels
//!   the previous token; a loader that finishes for a superseded navigation
//!   is dropped without being mounted.
//! - The outgoing page's `unmount()` always runs before the incoming page's
//!   `mount()`.
//! - A loader error renders an inline error page. There is no retry and the
//!   history entry stays.
//! - `ApiEvent::Unauthorized` is drained after each load and on
//!   [`Router::handle_api_events`], producing one redirect to login per
//!   session loss.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::components::view::{View, alert, el, heading, link};
use crate::net::api::{ApiError, ApiEvent};
use crate::state::session::SessionStore;
use crate::util::auth::{GateDecision, LOGIN_PATH, RouteOptions, evaluate, login_target, redirect_target};
use crate::util::location::Location;

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;

/// Upper bound on chained redirects within one navigation.
const MAX_REDIRECTS: usize = 4;

/// Redirect records kept for [`Router::redirects`]; older ones are dropped.
pub const REDIRECT_LOG_LIMIT: usize = 64;

pub const NOT_FOUND_TITLE: &str = "Not Found";

// =============================================================================
// PAGES AND LOADERS
// =============================================================================

/// A mounted page: renders its current data and owns whatever it starts in
/// `mount()` until `unmount()`.
pub trait Page: Send {
    fn render(&self) -> View;

    fn mount(&mut self) {}

    fn unmount(&mut self) {}
}

/// Failure of a page loader, rendered inline in place of the page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0}")]
    Invalid(String),
}

impl PageError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

pub type LoadResult = Result<Box<dyn Page>, PageError>;

/// Everything a loader receives for one navigation.
#[derive(Clone)]
pub struct PageContext<S> {
    pub services: S,
    pub location: Location,
    /// Cancelled when a newer navigation starts.
    pub cancel: CancellationToken,
}

type Loader<S> = Arc<dyn Fn(PageContext<S>) -> BoxFuture<'static, LoadResult> + Send + Sync>;

#[derive(Clone)]
struct Route<S> {
    path: String,
    loader: Loader<S>,
    options: RouteOptions,
}

/// Resolution of a path against the route table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub route_path: String,
    pub options: RouteOptions,
    pub not_found: bool,
}

/// Inline error block shown when a loader fails.
struct ErrorPage {
    title: String,
    message: String,
}

impl Page for ErrorPage {
    fn render(&self) -> View {
        el("section")
            .child(heading(1, self.title.clone()))
            .child(alert("danger", self.message.clone()))
            .into()
    }
}

struct BuiltinNotFound;

impl Page for BuiltinNotFound {
    fn render(&self) -> View {
        el("section")
            .child(heading(1, NOT_FOUND_TITLE))
            .child(link("/", "Back to the shop"))
            .into()
    }
}

// =============================================================================
// STATE
// =============================================================================

/// The committed result of a navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationState {
    /// Full href including the query string.
    pub path: String,
    /// Registered route that matched (the not-found entry reports `*`).
    pub route_path: String,
    pub title: String,
    pub query: Vec<(String, String)>,
    /// Loader failure text when an error page was rendered.
    pub error: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectReason {
    Login,
    Forbidden,
    SessionExpired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub from: String,
    pub to: String,
    pub reason: RedirectReason,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HistoryMode {
    Push,
    Replace,
}

#[derive(Default)]
struct RouterState {
    seq: u64,
    cancel: Option<CancellationToken>,
    history: Vec<String>,
    page: Option<Box<dyn Page>>,
    redirects: VecDeque<Redirect>,
}

// =============================================================================
// ROUTER
// =============================================================================

pub struct Router<S> {
    services: S,
    session: SessionStore,
    routes: RwLock<HashMap<String, Route<S>>>,
    not_found: RwLock<Option<Route<S>>>,
    state: Mutex<RouterState>,
    events: Mutex<Option<broadcast::Receiver<ApiEvent>>>,
    current: watch::Sender<Option<NavigationState>>,
}

impl<S> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(services: S, session: SessionStore) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            services,
            session,
            routes: RwLock::new(HashMap::new()),
            not_found: RwLock::new(None),
            state: Mutex::new(RouterState::default()),
            events: Mutex::new(None),
            current,
        }
    }

    /// Route API client notifications (401s) through this router.
    pub fn listen(&self, events: broadcast::Receiver<ApiEvent>) {
        *self.events.lock().unwrap_or_else(PoisonError::into_inner) = Some(events);
    }

    /// Add a route. Registering the same path again replaces the entry.
    pub fn register<F, Fut>(&self, path: &str, loader: F, options: RouteOptions)
    where
        F: Fn(PageContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LoadResult> + Send + 'static,
    {
        let route = Route { path: path.to_owned(), loader: boxed(loader), options };
        let previous = self
            .routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_owned(), route);
        if previous.is_some() {
            debug!(path, "route replaced");
        }
    }

    /// Loader used for paths without a registered route.
    pub fn set_not_found<F, Fut>(&self, loader: F)
    where
        F: Fn(PageContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LoadResult> + Send + 'static,
    {
        let route = Route { path: "*".to_owned(), loader: boxed(loader), options: RouteOptions::public(NOT_FOUND_TITLE) };
        *self.not_found.write().unwrap_or_else(PoisonError::into_inner) = Some(route);
    }

    /// Exact match on the path (query ignored), else the not-found entry.
    pub fn resolve(&self, path: &str) -> Resolved {
        let route = self.lookup(&Location::parse(path).path);
        Resolved { not_found: route.path == "*", route_path: route.path, options: route.options }
    }

    fn lookup(&self, path: &str) -> Route<S> {
        if let Some(route) = self.routes.read().unwrap_or_else(PoisonError::into_inner).get(path) {
            return route.clone();
        }
        self.not_found
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| Route {
                path: "*".to_owned(),
                loader: boxed(|_ctx: PageContext<S>| async { Ok(Box::new(BuiltinNotFound) as Box<dyn Page>) }),
                options: RouteOptions::public(NOT_FOUND_TITLE),
            })
    }

    /// Push `path` onto the history and render it. Returns `None` when a
    /// newer navigation superseded this one.
    pub async fn navigate(&self, path: &str) -> Option<NavigationState> {
        self.go(path.to_owned(), HistoryMode::Push).await
    }

    /// Re-run the current location without touching the history depth.
    pub async fn refresh(&self) -> Option<NavigationState> {
        let top = self.lock_state().history.last().cloned()?;
        self.go(top, HistoryMode::Replace).await
    }

    /// Pop the history and render the previous entry.
    pub async fn back(&self) -> Option<NavigationState> {
        let previous = {
            let mut state = self.lock_state();
            if state.history.len() < 2 {
                return None;
            }
            state.history.pop();
            state.history.last().cloned()
        }?;
        self.go(previous, HistoryMode::Replace).await
    }

    /// Redirect to login if an API call reported a lost session since the last
    /// check. Returns the resulting state when a redirect happened.
    pub async fn handle_api_events(&self) -> Option<NavigationState> {
        if !self.take_unauthorized() {
            return None;
        }
        let from = self.lock_state().history.last().cloned().unwrap_or_else(|| "/".to_owned());
        self.redirect_after_session_loss(&from).await
    }

    #[must_use]
    pub fn current(&self) -> Option<NavigationState> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<NavigationState>> {
        self.current.subscribe()
    }

    /// Render the mounted page.
    #[must_use]
    pub fn render(&self) -> Option<View> {
        self.lock_state().page.as_ref().map(|page| page.render())
    }

    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock_state().history.clone()
    }

    /// The most recent redirects (at most [`REDIRECT_LOG_LIMIT`]), oldest first.
    #[must_use]
    pub fn redirects(&self) -> Vec<Redirect> {
        self.lock_state().redirects.iter().cloned().collect()
    }

    #[must_use]
    pub fn services(&self) -> &S {
        &self.services
    }

    // -------------------------------------------------------------------------
    // Navigation core
    // -------------------------------------------------------------------------

    async fn go(&self, mut target: String, mut mode: HistoryMode) -> Option<NavigationState> {
        for _ in 0..=MAX_REDIRECTS {
            let location = Location::parse(&target);
            let href = location.href();
            let (seq, cancel) = self.begin(&href, mode);
            let route = self.lookup(&location.path);

            let decision = evaluate(self.session.current().as_ref(), &route.options);
            if let Some(next) = redirect_target(decision, &href) {
                let reason = if decision == GateDecision::RedirectLogin {
                    RedirectReason::Login
                } else {
                    RedirectReason::Forbidden
                };
                self.record_redirect(&href, &next, reason);
                target = next;
                mode = HistoryMode::Replace;
                continue;
            }

            let ctx = PageContext { services: self.services.clone(), location: location.clone(), cancel: cancel.clone() };
            let loaded = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(path = %href, "navigation superseded before load finished");
                    return None;
                }
                result = (route.loader)(ctx) => result,
            };

            if self.take_unauthorized() && location.path != LOGIN_PATH {
                let next = login_target(&href);
                self.record_redirect(&href, &next, RedirectReason::SessionExpired);
                target = next;
                mode = HistoryMode::Replace;
                continue;
            }

            let (page, error) = match loaded {
                Ok(page) => (page, None),
                Err(e) => {
                    warn!(path = %href, error = %e, "page loader failed");
                    let message = e.to_string();
                    let page: Box<dyn Page> = Box::new(ErrorPage { title: route.options.title.clone(), message: message.clone() });
                    (page, Some(message))
                }
            };
            let nav = NavigationState {
                path: href,
                route_path: route.path.clone(),
                title: route.options.title.clone(),
                query: location.query,
                error,
            };
            return self.commit(seq, page, nav);
        }
        warn!(path = %target, "too many redirects; navigation abandoned");
        None
    }

    /// Start a navigation: bump the sequence, cancel the previous one and
    /// record the history entry.
    fn begin(&self, href: &str, mode: HistoryMode) -> (u64, CancellationToken) {
        let mut state = self.lock_state();
        state.seq += 1;
        let token = CancellationToken::new();
        if let Some(previous) = state.cancel.replace(token.clone()) {
            previous.cancel();
        }
        match mode {
            HistoryMode::Replace if !state.history.is_empty() => {
                if let Some(top) = state.history.last_mut() {
                    href.clone_into(top);
                }
            }
            _ => state.history.push(href.to_owned()),
        }
        (state.seq, token)
    }

    fn commit(&self, seq: u64, mut page: Box<dyn Page>, nav: NavigationState) -> Option<NavigationState> {
        let mut state = self.lock_state();
        if state.seq != seq {
            debug!(path = %nav.path, "discarding stale page");
            return None;
        }
        if let Some(mut outgoing) = state.page.take() {
            outgoing.unmount();
        }
        page.mount();
        state.page = Some(page);
        drop(state);

        info!(path = %nav.path, route = %nav.route_path, "navigated");
        self.current.send_replace(Some(nav.clone()));
        Some(nav)
    }

    async fn redirect_after_session_loss(&self, from: &str) -> Option<NavigationState> {
        if Location::parse(from).path == LOGIN_PATH {
            return None;
        }
        let next = login_target(from);
        self.record_redirect(from, &next, RedirectReason::SessionExpired);
        self.go(next, HistoryMode::Replace).await
    }

    fn take_unauthorized(&self) -> bool {
        let mut guard = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(events) = guard.as_mut() else {
            return false;
        };
        let mut unauthorized = false;
        loop {
            match events.try_recv() {
                Ok(ApiEvent::Unauthorized) => unauthorized = true,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "api events lagged");
                    unauthorized = true;
                }
                Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => break,
            }
        }
        unauthorized
    }

    fn record_redirect(&self, from: &str, to: &str, reason: RedirectReason) {
        info!(%from, %to, ?reason, "redirect");
        let mut state = self.lock_state();
        if state.redirects.len() == REDIRECT_LOG_LIMIT {
            state.redirects.pop_front();
        }
        state.redirects.push_back(Redirect { from: from.to_owned(), to: to.to_owned(), reason });
    }

    fn lock_state(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn boxed<S, F, Fut>(loader: F) -> Loader<S>
where
    F: Fn(PageContext<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = LoadResult> + Send + 'static,
{
    Arc::new(move |ctx| loader(ctx).boxed())
}
