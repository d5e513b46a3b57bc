//! Admin monitoring dashboard view model.
//!
//! SYSTEM CONTEXT
//! ==============
//! `net::monitor` feeds every `/ws/monitor` push into [`DashboardState::apply`];
//! the admin page renders whatever the state holds at render time.

use models::MonitorMessage;
use models::monitor::{MetricsSnapshot, TestComplete, TestLog};
use uuid::Uuid;

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;

/// Rollback entries kept for display.
pub const MAX_ROLLBACKS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollbackStage {
    Started,
    Completed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollbackRecord {
    pub run_id: Uuid,
    pub stage: RollbackStage,
    pub reason: String,
}

/// The smoke run currently shown on the dashboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestRun {
    pub run_id: Uuid,
    pub suite: String,
    pub checks: usize,
    pub logs: Vec<TestLog>,
    pub result: Option<TestComplete>,
}

impl TestRun {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.result.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DashboardState {
    pub connected: bool,
    pub connections: u32,
    pub metrics: Option<MetricsSnapshot>,
    pub run: Option<TestRun>,
    pub rollbacks: Vec<RollbackRecord>,
}

impl DashboardState {
    /// Fold one monitor push into the state.
    ///
    /// Log and completion messages for a run other than the current one are
    /// ignored, so a late message from an old run cannot corrupt the view.
    pub fn apply(&mut self, message: MonitorMessage) {
        match message {
            MonitorMessage::Metrics(snapshot) => self.metrics = Some(snapshot),
            MonitorMessage::TestStart(start) => {
                self.run = Some(TestRun {
                    run_id: start.run_id,
                    suite: start.suite,
                    checks: start.checks,
                    logs: Vec::new(),
                    result: None,
                });
            }
            MonitorMessage::TestLog(log) => {
                if let Some(run) = self.run.as_mut().filter(|r| r.run_id == log.run_id) {
                    run.logs.push(log);
                }
            }
            MonitorMessage::TestComplete(done) => {
                if let Some(run) = self.run.as_mut().filter(|r| r.run_id == done.run_id) {
                    run.result = Some(done);
                }
            }
            MonitorMessage::RollbackStart(event) => self.push_rollback(event.run_id, RollbackStage::Started, event.reason),
            MonitorMessage::RollbackComplete(event) => {
                self.push_rollback(event.run_id, RollbackStage::Completed, event.reason);
            }
            MonitorMessage::RollbackFailed(event) => self.push_rollback(event.run_id, RollbackStage::Failed, event.reason),
        }
    }

    pub fn mark_connected(&mut self) {
        self.connected = true;
        self.connections += 1;
    }

    pub fn mark_disconnected(&mut self) {
        self.connected = false;
    }

    fn push_rollback(&mut self, run_id: Uuid, stage: RollbackStage, reason: String) {
        if self.rollbacks.len() == MAX_ROLLBACKS {
            self.rollbacks.remove(0);
        }
        self.rollbacks.push(RollbackRecord { run_id, stage, reason });
    }
}
