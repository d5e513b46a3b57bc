use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use models::{Role, User};
use uuid::Uuid;

use super::*;
use crate::components::view::{paragraph, render_text};
use crate::state::session::Session;
use crate::util::auth::REDIRECT_PARAM;

type Log = Arc<Mutex<Vec<String>>>;

struct TestPage {
    name: String,
    log: Log,
}

impl Page for TestPage {
    fn render(&self) -> View {
        paragraph(self.name.clone()).into()
    }

    fn mount(&mut self) {
        self.log.lock().unwrap().push(format!("mount:{}", self.name));
    }

    fn unmount(&mut self) {
        self.log.lock().unwrap().push(format!("unmount:{}", self.name));
    }
}

fn page(name: &str, log: &Log) -> LoadResult {
    Ok(Box::new(TestPage { name: name.to_owned(), log: log.clone() }))
}

fn session(role: Role) -> Session {
    Session {
        token: "tok".to_owned(),
        user: User {
            id: Uuid::new_v4(),
            name: "Tess".to_owned(),
            email: "tess@example.com".to_owned(),
            role,
            phone: None,
            address: None,
            created_at: None,
        },
    }
}

struct Fixture {
    router: Arc<Router<()>>,
    session: SessionStore,
    log: Log,
    calls: Arc<AtomicUsize>,
}

/// Routes: `/` public, `/login` public, `/cart` auth, `/admin` admin-only
/// (counts loader calls), `/broken` fails.
fn fixture() -> Fixture {
    let session = SessionStore::in_memory();
    let router = Arc::new(Router::new((), session.clone()));
    let log: Log = Arc::default();
    let calls = Arc::new(AtomicUsize::new(0));

    for (path, options) in [
        ("/", RouteOptions::public("Home")),
        ("/login", RouteOptions::public("Login")),
        ("/cart", RouteOptions::authenticated("Cart")),
    ] {
        let log = log.clone();
        let name = path.to_owned();
        router.register(path, move |_ctx| std::future::ready(page(&name, &log)), options);
    }
    {
        let log = log.clone();
        let calls = calls.clone();
        router.register(
            "/admin",
            move |_ctx| {
                calls.fetch_add(1, Ordering::SeqCst);
                std::future::ready(page("/admin", &log))
            },
            RouteOptions::authenticated("Admin").with_roles(&[Role::Admin]),
        );
    }
    router.register(
        "/broken",
        |_ctx| async { Err(PageError::invalid("catalogue unavailable")) },
        RouteOptions::public("Broken"),
    );
    Fixture { router, session, log, calls }
}

#[test]
fn resolve_matches_exact_path_ignoring_query() {
    let f = fixture();
    let resolved = f.router.resolve("/cart?from=nav");
    assert_eq!(resolved.route_path, "/cart");
    assert!(resolved.options.require_auth);
    assert!(!resolved.not_found);
}

#[test]
fn resolve_falls_back_to_not_found() {
    let f = fixture();
    let resolved = f.router.resolve("/cart/extra");
    assert!(resolved.not_found);
    assert_eq!(resolved.options.title, NOT_FOUND_TITLE);
}

#[test]
fn register_overwrites_same_path() {
    let f = fixture();
    f.router.register("/cart", |_ctx| async { Err(PageError::invalid("x")) }, RouteOptions::public("Public Cart"));
    assert!(!f.router.resolve("/cart").options.require_auth);
}

#[tokio::test]
async fn anonymous_visit_to_protected_route_redirects_to_login_with_original_path() {
    let f = fixture();
    let nav = f.router.navigate("/cart?coupon=SPRING").await.unwrap();

    assert_eq!(nav.route_path, "/login");
    let loc = Location::parse(&nav.path);
    assert_eq!(loc.param(REDIRECT_PARAM), Some("/cart?coupon=SPRING"));
    assert_eq!(f.router.history(), vec![nav.path.clone()]);
    assert_eq!(f.router.redirects()[0].reason, RedirectReason::Login);
    assert_eq!(*f.log.lock().unwrap(), vec!["mount:/login".to_owned()]);
}

#[tokio::test]
async fn redirect_log_keeps_only_recent_entries() {
    let f = fixture();
    for i in 0..REDIRECT_LOG_LIMIT + 5 {
        f.router.navigate(&format!("/cart?visit={i}")).await.unwrap();
    }

    let redirects = f.router.redirects();
    assert_eq!(redirects.len(), REDIRECT_LOG_LIMIT);
    assert_eq!(redirects[0].from, "/cart?visit=5");
    assert_eq!(redirects.last().unwrap().from, format!("/cart?visit={}", REDIRECT_LOG_LIMIT + 4));
}

#[tokio::test]
async fn role_mismatch_never_invokes_loader() {
    let f = fixture();
    for role in [Role::Client, Role::Artisan] {
        f.session.set(session(role));
        let nav = f.router.navigate("/admin").await.unwrap();
        assert_eq!(nav.route_path, "/");
    }
    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
    assert!(f.router.redirects().iter().all(|r| r.reason == RedirectReason::Forbidden));

    f.session.set(session(Role::Admin));
    let nav = f.router.navigate("/admin").await.unwrap();
    assert_eq!(nav.route_path, "/admin");
    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn anonymous_visit_to_role_route_goes_to_login_not_home() {
    let f = fixture();
    let nav = f.router.navigate("/admin").await.unwrap();
    assert_eq!(nav.route_path, "/login");
    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_path_renders_builtin_not_found() {
    let f = fixture();
    let nav = f.router.navigate("/nope").await.unwrap();
    assert_eq!(nav.route_path, "*");
    assert!(render_text(&f.router.render().unwrap()).contains(NOT_FOUND_TITLE));
}

#[tokio::test]
async fn loader_error_renders_inline_alert_and_keeps_history() {
    let f = fixture();
    f.router.navigate("/").await.unwrap();
    let nav = f.router.navigate("/broken").await.unwrap();

    assert_eq!(nav.error.as_deref(), Some("catalogue unavailable"));
    let text = render_text(&f.router.render().unwrap());
    assert!(text.contains("[DANGER] catalogue unavailable"));
    assert_eq!(f.router.history(), vec!["/".to_owned(), "/broken".to_owned()]);
}

#[tokio::test]
async fn outgoing_page_unmounts_before_incoming_mounts() {
    let f = fixture();
    f.session.set(session(Role::Client));
    f.router.navigate("/").await.unwrap();
    f.router.navigate("/cart").await.unwrap();

    assert_eq!(*f.log.lock().unwrap(), vec!["mount:/", "unmount:/", "mount:/cart"]);
}

#[tokio::test]
async fn back_pops_history_and_rerenders_previous_entry() {
    let f = fixture();
    f.router.navigate("/").await.unwrap();
    f.router.navigate("/login").await.unwrap();

    let nav = f.router.back().await.unwrap();
    assert_eq!(nav.path, "/");
    assert_eq!(f.router.history(), vec!["/".to_owned()]);
    assert!(f.router.back().await.is_none());
}

#[tokio::test]
async fn newer_navigation_cancels_and_discards_slow_loader() {
    let f = fixture();
    let observed_cancel = Arc::new(AtomicUsize::new(0));
    {
        let observed = observed_cancel.clone();
        let log = f.log.clone();
        f.router.register(
            "/slow",
            move |ctx: PageContext<()>| {
                let observed = observed.clone();
                let log = log.clone();
                async move {
                    tokio::select! {
                        () = ctx.cancel.cancelled() => {
                            observed.fetch_add(1, Ordering::SeqCst);
                        }
                        () = tokio::time::sleep(Duration::from_secs(5)) => {}
                    }
                    page("/slow", &log)
                }
            },
            RouteOptions::public("Slow"),
        );
    }

    let router = f.router.clone();
    let slow = tokio::spawn(async move { router.navigate("/slow").await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    let fast = f.router.navigate("/").await.unwrap();

    assert!(slow.await.unwrap().is_none());
    assert_eq!(fast.path, "/");
    assert_eq!(f.router.current().unwrap().path, "/");
    assert!(!f.log.lock().unwrap().iter().any(|entry| entry == "mount:/slow"));
}

#[tokio::test]
async fn api_unauthorized_event_redirects_once() {
    let f = fixture();
    let (tx, rx) = broadcast::channel(4);
    f.router.listen(rx);
    f.session.set(session(Role::Client));
    f.router.navigate("/cart").await.unwrap();

    f.session.clear();
    tx.send(ApiEvent::Unauthorized).unwrap();
    let nav = f.router.handle_api_events().await.unwrap();
    assert_eq!(Location::parse(&nav.path).param(REDIRECT_PARAM), Some("/cart"));
    assert!(f.router.handle_api_events().await.is_none());

    let expired: Vec<_> = f
        .router
        .redirects()
        .into_iter()
        .filter(|r| r.reason == RedirectReason::SessionExpired)
        .collect();
    assert_eq!(expired.len(), 1);
}

#[tokio::test]
async fn session_lost_during_load_redirects_to_login() {
    let f = fixture();
    let (tx, rx) = broadcast::channel(4);
    f.router.listen(rx);
    f.session.set(session(Role::Client));
    {
        let session = f.session.clone();
        f.router.register(
            "/orders",
            move |_ctx| {
                // Simulates the API client reacting to a 401.
                if session.clear() {
                    let _ = tx.send(ApiEvent::Unauthorized);
                }
                async { Err(PageError::invalid("Session expired or invalid")) }
            },
            RouteOptions::authenticated("Orders"),
        );
    }

    let nav = f.router.navigate("/orders").await.unwrap();
    assert_eq!(nav.route_path, "/login");
    assert_eq!(f.router.history().len(), 1);
    assert_eq!(f.router.redirects().len(), 1);
    assert!(f.router.handle_api_events().await.is_none());
}
