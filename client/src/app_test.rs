use super::*;
use crate::router::RedirectReason;
use crate::state::session::MemoryStorage;

fn app() -> App {
    App::new("http://127.0.0.1:9", Arc::new(MemoryStorage::new()))
}

#[test]
fn parses_button_actions() {
    let id = Uuid::new_v4();
    assert_eq!(Action::from_data_action("logout"), Some(Action::Logout));
    assert_eq!(Action::from_data_action("clear-cart"), Some(Action::ClearCart));
    assert_eq!(
        Action::from_data_action(&format!("add-to-cart:{id}")),
        Some(Action::AddToCart { product_id: id, quantity: 1 })
    );
    assert_eq!(Action::from_data_action(&format!("remove-from-cart:{id}")), Some(Action::RemoveFromCart(id)));
    assert_eq!(
        Action::from_data_action(&format!("order-status:{id}:shipped")),
        Some(Action::UpdateOrderStatus { order_id: id, status: OrderStatus::Shipped })
    );
    assert_eq!(
        Action::from_data_action(&format!("issue-status:{id}:in_progress")),
        Some(Action::UpdateIssueStatus { issue_id: id, status: IssueStatus::InProgress })
    );
    assert_eq!(
        Action::from_data_action(&format!("user-role:{id}:artisan")),
        Some(Action::SetUserRole { user_id: id, role: Role::Artisan })
    );
}

#[test]
fn rejects_malformed_button_actions() {
    assert_eq!(Action::from_data_action(""), None);
    assert_eq!(Action::from_data_action("add-to-cart"), None);
    assert_eq!(Action::from_data_action("add-to-cart:not-a-uuid"), None);
    assert_eq!(Action::from_data_action(&format!("order-status:{}:lost", Uuid::new_v4())), None);
    assert_eq!(Action::from_data_action("logout:now"), None);
    assert_eq!(Action::from_data_action("login"), None);
}

#[test]
fn route_table_guards_match_storefront() {
    let app = app();
    let router = app.router();
    assert!(!router.resolve("/").options.require_auth);
    assert!(router.resolve("/cart").options.require_auth);
    assert_eq!(router.resolve("/checkout").options.roles, Some(vec![Role::Client]));
    assert_eq!(router.resolve("/artisan").options.roles, Some(vec![Role::Artisan]));
    assert_eq!(router.resolve("/admin?tab=users").options.roles, Some(vec![Role::Admin]));
    assert!(router.resolve("/product?id=1").options.roles.is_none());
    assert!(router.resolve("/nowhere").not_found);
}

#[tokio::test]
async fn anonymous_cart_visit_lands_on_login() {
    let app = app();
    let nav = app.open("/cart").await.unwrap();
    assert_eq!(nav.route_path, "/login");
    assert_eq!(nav.path, "/login?redirect=%2Fcart");
    assert_eq!(app.router().redirects()[0].reason, RedirectReason::Login);
    assert!(app.render_text().contains("# Log in"));
}

#[tokio::test]
async fn unknown_path_renders_not_found_page() {
    let app = app();
    let nav = app.open("/missing").await.unwrap();
    assert_eq!(nav.route_path, "*");
    assert!(app.render_text().contains("Nothing lives at /missing."));
}

#[tokio::test]
async fn failed_action_is_toasted_once() {
    let app = app();
    app.open("/register").await.unwrap();
    let err = app.dispatch(Action::ClearCart).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    let first = app.render_text();
    assert!(first.contains("[DANGER] network error"));
    assert!(!app.render_text().contains("[DANGER]"));
}
