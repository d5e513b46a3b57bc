//! Operational monitoring messages pushed over `/ws/monitor`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(test)]
#[path = "monitor_test.rs"]
mod tests;

/// One push from the monitoring hub. Serialized as `{ "type": ..., "data": ... }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MonitorMessage {
    Metrics(MetricsSnapshot),
    TestStart(TestStart),
    TestLog(TestLog),
    TestComplete(TestComplete),
    RollbackStart(RollbackEvent),
    RollbackComplete(RollbackEvent),
    RollbackFailed(RollbackEvent),
}

impl MonitorMessage {
    /// The `type` tag as it appears on the wire.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Metrics(_) => "metrics",
            Self::TestStart(_) => "test_start",
            Self::TestLog(_) => "test_log",
            Self::TestComplete(_) => "test_complete",
            Self::RollbackStart(_) => "rollback_start",
            Self::RollbackComplete(_) => "rollback_complete",
            Self::RollbackFailed(_) => "rollback_failed",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub requests_total: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub in_flight: u64,
    pub ws_subscribers: u64,
    pub db_pool_size: u32,
    pub db_pool_idle: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStart {
    pub run_id: Uuid,
    pub suite: String,
    pub checks: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestLog {
    pub run_id: Uuid,
    pub check: String,
    pub passed: bool,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestComplete {
    pub run_id: Uuid,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackEvent {
    pub run_id: Uuid,
    pub reason: String,
}
