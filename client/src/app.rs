//! Application root.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`App`] wires the shared [`Services`] (API client, session store, toasts)
//! into a [`Router`] carrying the storefront route table. Hosts open paths,
//! render the mounted page and feed user interaction back as [`Action`]s.
//!
//! DESIGN
//! ======
//! - Pages never call mutating endpoints themselves. Buttons carry a
//!   `data-action` string which [`Action::from_data_action`] turns back into
//!   an action; forms are assembled by the host.
//! - Every action reports its outcome as a toast. A 401 hands control to the
//!   router's session-loss redirect, a 403 opens `/forbidden`.

use std::sync::Arc;

use models::{
    CheckoutRequest, CreateIssueRequest, IssueStatus, OrderStatus, RegisterRequest, Role, UpdateProfileRequest,
};
use reqwest::StatusCode;
use tracing::{info, warn};
use uuid::Uuid;

use crate::components::view::{View, render_html, render_text};
use crate::components::widgets::toast_stack;
use crate::net::api::{ApiClient, ApiError};
use crate::net::monitor::start_smoke_run;
use crate::pages::{admin, artisan, cart, checkout, errors, home, login, orders, product, profile, register};
use crate::router::{NavigationState, Router};
use crate::state::session::{SessionStore, Storage};
use crate::state::toast::Toasts;
use crate::util::auth::{LOGIN_PATH, RouteOptions, safe_redirect};

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;

pub const FORBIDDEN_PATH: &str = "/forbidden";

/// Shared handles injected into every page loader.
#[derive(Clone)]
pub struct Services {
    pub api: ApiClient,
    pub session: SessionStore,
    pub toasts: Toasts,
}

impl Services {
    #[must_use]
    pub fn new(base_url: &str, session: SessionStore) -> Self {
        Self { api: ApiClient::new(base_url, session.clone()), session, toasts: Toasts::new() }
    }
}

// =============================================================================
// ACTIONS
// =============================================================================

/// A user interaction that changes server state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Login { email: String, password: String, redirect: Option<String> },
    Register(RegisterRequest),
    Logout,
    AddToCart { product_id: Uuid, quantity: i32 },
    SetCartQuantity { product_id: Uuid, quantity: i32 },
    RemoveFromCart(Uuid),
    ClearCart,
    Checkout(CheckoutRequest),
    UpdateOrderStatus { order_id: Uuid, status: OrderStatus },
    UpdateProfile(UpdateProfileRequest),
    ChangePassword { current_password: String, new_password: String },
    ReportIssue(CreateIssueRequest),
    UpdateIssueStatus { issue_id: Uuid, status: IssueStatus },
    SetUserRole { user_id: Uuid, role: Role },
    DeleteProduct(Uuid),
    RunSmoke,
}

impl Action {
    /// Parse a button's `data-action` value (`name` or `name:arg:arg`).
    /// Form actions are not representable here and yield `None`.
    #[must_use]
    pub fn from_data_action(raw: &str) -> Option<Self> {
        let mut parts = raw.split(':');
        let name = parts.next()?;
        let args: Vec<&str> = parts.collect();
        let id = |i: usize| args.get(i).and_then(|raw| Uuid::parse_str(raw).ok());
        let action = match (name, args.len()) {
            ("logout", 0) => Self::Logout,
            ("clear-cart", 0) => Self::ClearCart,
            ("run-smoke", 0) => Self::RunSmoke,
            ("add-to-cart", 1) => Self::AddToCart { product_id: id(0)?, quantity: 1 },
            ("remove-from-cart", 1) => Self::RemoveFromCart(id(0)?),
            ("delete-product", 1) => Self::DeleteProduct(id(0)?),
            ("order-status", 2) => Self::UpdateOrderStatus { order_id: id(0)?, status: OrderStatus::parse(args[1])? },
            ("issue-status", 2) => Self::UpdateIssueStatus { issue_id: id(0)?, status: IssueStatus::parse(args[1])? },
            ("user-role", 2) => Self::SetUserRole { user_id: id(0)?, role: Role::parse(args[1])? },
            _ => return None,
        };
        Some(action)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Register(_) => "register",
            Self::Logout => "logout",
            Self::AddToCart { .. } => "add-to-cart",
            Self::SetCartQuantity { .. } => "set-cart-quantity",
            Self::RemoveFromCart(_) => "remove-from-cart",
            Self::ClearCart => "clear-cart",
            Self::Checkout(_) => "checkout",
            Self::UpdateOrderStatus { .. } => "order-status",
            Self::UpdateProfile(_) => "update-profile",
            Self::ChangePassword { .. } => "change-password",
            Self::ReportIssue(_) => "report-issue",
            Self::UpdateIssueStatus { .. } => "issue-status",
            Self::SetUserRole { .. } => "user-role",
            Self::DeleteProduct(_) => "delete-product",
            Self::RunSmoke => "run-smoke",
        }
    }
}

/// What the app does after an action succeeded.
enum Followup {
    Stay,
    Refresh,
    Open(String),
}

// =============================================================================
// APP
// =============================================================================

pub struct App {
    services: Services,
    router: Router<Services>,
}

impl App {
    /// Build the app with a session persisted in `storage`.
    #[must_use]
    pub fn new(base_url: &str, storage: Arc<dyn Storage>) -> Self {
        Self::with_session(base_url, SessionStore::new(storage))
    }

    #[must_use]
    pub fn with_session(base_url: &str, session: SessionStore) -> Self {
        let services = Services::new(base_url, session.clone());
        let router = Router::new(services.clone(), session);
        register_routes(&router);
        router.listen(services.api.subscribe());
        Self { services, router }
    }

    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    #[must_use]
    pub fn router(&self) -> &Router<Services> {
        &self.router
    }

    /// Navigate to `path` (query string allowed).
    pub async fn open(&self, path: &str) -> Option<NavigationState> {
        self.router.navigate(path).await
    }

    pub async fn back(&self) -> Option<NavigationState> {
        self.router.back().await
    }

    /// Run `action`, toast its outcome and navigate as it requires.
    ///
    /// Returns the navigation that followed, if any.
    pub async fn dispatch(&self, action: Action) -> Result<Option<NavigationState>, ApiError> {
        let name = action.name();
        info!(action = name, "dispatch");
        match self.perform(action).await {
            Ok((message, followup)) => {
                self.services.toasts.success(message);
                Ok(match followup {
                    Followup::Stay => None,
                    Followup::Refresh => self.router.refresh().await,
                    Followup::Open(path) => self.router.navigate(&path).await,
                })
            }
            Err(e) => {
                warn!(action = name, error = %e, "action failed");
                self.services.toasts.error(e.to_string());
                if e.is_unauthorized() {
                    self.router.handle_api_events().await;
                } else if e.status() == Some(StatusCode::FORBIDDEN.as_u16()) {
                    self.router.navigate(FORBIDDEN_PATH).await;
                }
                Err(e)
            }
        }
    }

    async fn perform(&self, action: Action) -> Result<(String, Followup), ApiError> {
        let api = &self.services.api;
        let done = match action {
            Action::Login { email, password, redirect } => {
                let session = api.auth().login(&email, &password).await?;
                let target = safe_redirect(redirect.as_deref());
                (format!("Welcome back, {}.", session.user.name), Followup::Open(target))
            }
            Action::Register(req) => {
                let session = api.auth().register(&req).await?;
                (format!("Welcome, {}.", session.user.name), Followup::Open("/".to_owned()))
            }
            Action::Logout => {
                if let Err(e) = api.auth().logout().await {
                    warn!(error = %e, "server logout failed; local session dropped anyway");
                }
                ("Signed out.".to_owned(), Followup::Open(LOGIN_PATH.to_owned()))
            }
            Action::AddToCart { product_id, quantity } => {
                let cart = api.cart().add(product_id, quantity).await?;
                (format!("Added to cart ({} item(s)).", cart.item_count), Followup::Refresh)
            }
            Action::SetCartQuantity { product_id, quantity } => {
                api.cart().update(product_id, quantity).await?;
                ("Cart updated.".to_owned(), Followup::Refresh)
            }
            Action::RemoveFromCart(product_id) => {
                api.cart().remove(product_id).await?;
                ("Item removed.".to_owned(), Followup::Refresh)
            }
            Action::ClearCart => {
                api.cart().clear().await?;
                ("Cart cleared.".to_owned(), Followup::Refresh)
            }
            Action::Checkout(req) => {
                let order = api.orders().checkout(&req).await?;
                (format!("Order {} placed.", order.id), Followup::Open("/orders".to_owned()))
            }
            Action::UpdateOrderStatus { order_id, status } => {
                let order = api.orders().update_status(order_id, status).await?;
                (format!("Order {} is now {}.", order.id, order.status), Followup::Refresh)
            }
            Action::UpdateProfile(req) => {
                api.users().update_profile(&req).await?;
                ("Profile saved.".to_owned(), Followup::Refresh)
            }
            Action::ChangePassword { current_password, new_password } => {
                api.users().change_password(&current_password, &new_password).await?;
                ("Password changed.".to_owned(), Followup::Stay)
            }
            Action::ReportIssue(req) => {
                api.issues().create(&req).await?;
                ("Issue reported.".to_owned(), Followup::Refresh)
            }
            Action::UpdateIssueStatus { issue_id, status } => {
                api.issues().update_status(issue_id, status).await?;
                (format!("Issue marked {status}."), Followup::Refresh)
            }
            Action::SetUserRole { user_id, role } => {
                let user = api.users().update_role(user_id, role).await?;
                (format!("{} is now {}.", user.name, user.role), Followup::Refresh)
            }
            Action::DeleteProduct(product_id) => {
                api.products().delete(product_id).await?;
                ("Product unlisted.".to_owned(), Followup::Refresh)
            }
            Action::RunSmoke => {
                // Progress arrives over the mounted dashboard's websocket.
                let run_id = start_smoke_run(api).await?;
                (format!("Smoke run {run_id} started."), Followup::Stay)
            }
        };
        Ok(done)
    }

    /// Pending toasts followed by the mounted page. Drains the toasts.
    #[must_use]
    pub fn view(&self) -> View {
        let mut parts = vec![toast_stack(&self.services.toasts.drain())];
        if let Some(page) = self.router.render() {
            parts.push(page);
        }
        View::Fragment(parts)
    }

    #[must_use]
    pub fn render_text(&self) -> String {
        render_text(&self.view())
    }

    #[must_use]
    pub fn render_html(&self) -> String {
        render_html(&self.view())
    }
}

fn register_routes(router: &Router<Services>) {
    router.register("/", home::load, RouteOptions::public("Shop"));
    router.register("/login", login::load, RouteOptions::public("Log in"));
    router.register("/register", register::load, RouteOptions::public("Register"));
    router.register("/product", product::load, RouteOptions::public("Product"));
    router.register("/cart", cart::load, RouteOptions::authenticated("Your cart"));
    router.register("/checkout", checkout::load, RouteOptions::authenticated("Checkout").with_roles(&[Role::Client]));
    router.register("/orders", orders::load, RouteOptions::authenticated("Orders"));
    router.register("/profile", profile::load, RouteOptions::authenticated("Your profile"));
    router.register("/artisan", artisan::load, RouteOptions::authenticated("Artisan dashboard").with_roles(&[Role::Artisan]));
    router.register("/admin", admin::load, RouteOptions::authenticated("Admin dashboard").with_roles(&[Role::Admin]));
    router.register(FORBIDDEN_PATH, errors::forbidden, RouteOptions::public("Forbidden"));
    router.set_not_found(errors::not_found);
}
