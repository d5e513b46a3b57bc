use super::*;
use models::monitor::{RollbackEvent, TestStart};

fn start(run_id: Uuid) -> MonitorMessage {
    MonitorMessage::TestStart(TestStart { run_id, suite: "smoke".to_owned(), checks: 2 })
}

fn log(run_id: Uuid, check: &str, passed: bool) -> MonitorMessage {
    MonitorMessage::TestLog(TestLog { run_id, check: check.to_owned(), passed, detail: String::new() })
}

#[test]
fn metrics_replace_previous_snapshot() {
    let mut state = DashboardState::default();
    state.apply(MonitorMessage::Metrics(MetricsSnapshot { requests_total: 1, ..Default::default() }));
    state.apply(MonitorMessage::Metrics(MetricsSnapshot { requests_total: 7, ..Default::default() }));
    assert_eq!(state.metrics.unwrap().requests_total, 7);
}

#[test]
fn test_run_collects_logs_and_result() {
    let run_id = Uuid::new_v4();
    let mut state = DashboardState::default();
    state.apply(start(run_id));
    state.apply(log(run_id, "create_users", true));
    state.apply(log(run_id, "checkout", false));
    assert!(state.run.as_ref().unwrap().is_running());

    state.apply(MonitorMessage::TestComplete(TestComplete { run_id, passed: 1, failed: 1, duration_ms: 12 }));
    let run = state.run.unwrap();
    assert_eq!(run.logs.len(), 2);
    assert!(!run.is_running());
    assert_eq!(run.result.unwrap().failed, 1);
}

#[test]
fn messages_for_a_stale_run_are_ignored() {
    let old = Uuid::new_v4();
    let current = Uuid::new_v4();
    let mut state = DashboardState::default();
    state.apply(start(old));
    state.apply(start(current));
    state.apply(log(old, "create_users", true));
    state.apply(MonitorMessage::TestComplete(TestComplete { run_id: old, passed: 6, failed: 0, duration_ms: 1 }));

    let run = state.run.unwrap();
    assert_eq!(run.run_id, current);
    assert!(run.logs.is_empty());
    assert!(run.result.is_none());
}

#[test]
fn rollback_history_is_bounded() {
    let mut state = DashboardState::default();
    for _ in 0..(MAX_ROLLBACKS + 3) {
        state.apply(MonitorMessage::RollbackStart(RollbackEvent { run_id: Uuid::new_v4(), reason: "smoke".into() }));
    }
    state.apply(MonitorMessage::RollbackFailed(RollbackEvent { run_id: Uuid::new_v4(), reason: "db gone".into() }));
    assert_eq!(state.rollbacks.len(), MAX_ROLLBACKS);
    assert_eq!(state.rollbacks.last().unwrap().stage, RollbackStage::Failed);
}

#[test]
fn connection_tracking_counts_reconnects() {
    let mut state = DashboardState::default();
    state.mark_connected();
    state.mark_disconnected();
    state.mark_connected();
    assert!(state.connected);
    assert_eq!(state.connections, 2);
}
