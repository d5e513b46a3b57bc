use super::*;
use serde_json::json;

#[test]
fn metrics_message_uses_type_and_data_keys() {
    let msg = MonitorMessage::Metrics(MetricsSnapshot { requests_total: 7, ..MetricsSnapshot::default() });
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "metrics");
    assert_eq!(value["data"]["requests_total"], 7);
}

#[test]
fn rollback_messages_parse_from_wire() {
    let run_id = Uuid::new_v4();
    let raw = json!({"type": "rollback_complete", "data": {"run_id": run_id, "reason": "smoke fixtures"}});
    let msg: MonitorMessage = serde_json::from_value(raw).unwrap();
    assert_eq!(msg.kind(), "rollback_complete");
    assert_eq!(msg, MonitorMessage::RollbackComplete(RollbackEvent { run_id, reason: "smoke fixtures".into() }));
}

#[test]
fn unknown_type_is_rejected() {
    let raw = json!({"type": "reboot", "data": {}});
    assert!(serde_json::from_value::<MonitorMessage>(raw).is_err());
}

#[test]
fn kind_matches_serialized_tag() {
    let run_id = Uuid::nil();
    let messages = [
        MonitorMessage::TestStart(TestStart { run_id, suite: "smoke".into(), checks: 3 }),
        MonitorMessage::TestLog(TestLog { run_id, check: "db".into(), passed: true, detail: String::new() }),
        MonitorMessage::TestComplete(TestComplete { run_id, passed: 3, failed: 0, duration_ms: 12 }),
        MonitorMessage::RollbackFailed(RollbackEvent { run_id, reason: "x".into() }),
    ];
    for msg in messages {
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], msg.kind());
    }
}
