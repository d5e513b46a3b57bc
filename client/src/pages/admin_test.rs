use super::*;
use crate::components::view::render_text;
use models::MonitorMessage;
use models::monitor::{MetricsSnapshot, TestLog, TestStart};
use uuid::Uuid;

fn admin() -> Session {
    Session {
        token: "tok".to_owned(),
        user: User {
            id: Uuid::new_v4(),
            name: "Ada".to_owned(),
            email: "admin@example.com".to_owned(),
            role: Role::Admin,
            phone: None,
            address: None,
            created_at: None,
        },
    }
}

fn empty<T>() -> Paged<T> {
    Paged { items: Vec::new(), total: 0, page: 1, per_page: 20 }
}

fn page() -> AdminPage {
    AdminPage::new(admin(), "http://127.0.0.1:9", empty(), empty(), empty())
}

#[test]
fn monitor_url_carries_session_token() {
    assert_eq!(page().monitor_url, "ws://127.0.0.1:9/ws/monitor?token=tok");
}

#[test]
fn renders_waiting_state_before_first_push() {
    let text = render_text(&page().render());
    assert!(text.contains("Live feed: disconnected"));
    assert!(text.contains("Waiting for metrics..."));
    assert!(page().render().actions().contains(&"run-smoke".to_owned()));
}

#[test]
fn renders_metrics_and_run_progress() {
    let page = page();
    let run_id = Uuid::new_v4();
    page.dashboard_tx.send_modify(|state| {
        state.mark_connected();
        state.apply(MonitorMessage::Metrics(MetricsSnapshot { requests_total: 42, ..MetricsSnapshot::default() }));
        state.apply(MonitorMessage::TestStart(TestStart { run_id, suite: "smoke".to_owned(), checks: 3 }));
        state.apply(MonitorMessage::TestLog(TestLog {
            run_id,
            check: "health".to_owned(),
            passed: true,
            detail: "200".to_owned(),
        }));
    });
    let text = render_text(&page.render());
    assert!(text.contains("Live feed: connected (1 connection(s))"));
    assert!(text.contains("Requests: 42"));
    assert!(text.contains("smoke: running 1/3"));
    assert!(text.contains("[ok] health 200"));
}

#[test]
fn mount_without_runtime_leaves_monitor_off() {
    let mut page = page();
    page.mount();
    assert!(!page.is_monitoring());
}

#[tokio::test]
async fn unmount_stops_monitor_task() {
    let mut page = page();
    page.mount();
    assert!(page.is_monitoring());
    page.unmount();
    assert!(!page.is_monitoring());
}
