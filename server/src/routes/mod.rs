//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the REST API under `/api`, the monitor WebSocket at `/ws/monitor`
//! and, when enabled, the in-memory mock under `/mock/api`. Every request
//! passes through the request counters feeding the monitor, a trace span
//! and the CORS layer.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod monitor;
pub mod orders;
pub mod users;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::mock;
use crate::services::monitor::track_requests;
use crate::state::AppState;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// REST routes, still waiting for their state.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/users", get(users::list_users))
        .route("/api/users/artisans", get(users::list_artisans))
        .route("/api/users/me", put(users::update_me))
        .route("/api/users/me/password", put(auth::change_password))
        .route("/api/users/{id}", get(users::get_user).delete(users::delete_user))
        .route("/api/users/{id}/role", put(users::update_role))
        .route("/api/categories", get(catalog::list_categories).post(catalog::create_category))
        .route(
            "/api/categories/{id}",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route("/api/products", get(catalog::list_products).post(catalog::create_product))
        .route(
            "/api/products/{id}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route("/api/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/cart/items", post(cart::add_item))
        .route("/api/cart/items/{product_id}", put(cart::update_item).delete(cart::remove_item))
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/checkout", post(orders::checkout))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/status", put(orders::update_order_status))
        .route("/api/issues", get(orders::list_issues).post(orders::create_issue))
        .route("/api/issues/{id}/status", put(orders::update_issue_status))
        .route("/api/monitor/metrics", get(monitor::metrics))
        .route("/api/monitor/smoke", post(monitor::run_smoke))
        .route("/ws/monitor", get(monitor::handle_monitor_ws))
}

fn cors(config: &ServerConfig) -> CorsLayer {
    if config.cors_allow_any {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new()
    }
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();
    let mut router = api_routes()
        .route("/healthz", get(healthz))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .with_state(state);
    if config.mock_api {
        router = router.nest("/mock", mock::router());
    }
    router.layer(cors(&config)).layer(TraceLayer::new_for_http())
}

/// Router for `MOCK_ONLY=true`: the mock backend and a health check, no database.
pub fn mock_only_app(config: &ServerConfig) -> Router {
    Router::new()
        .nest("/mock", mock::router())
        .route("/healthz", get(healthz))
        .fallback(not_found)
        .layer(cors(config))
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route")
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
