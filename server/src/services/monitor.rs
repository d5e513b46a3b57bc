//! Monitoring hub, request counters and the periodic metrics push.
//!
//! ARCHITECTURE
//! ============
//! Producers (metrics task, smoke runner) publish `MonitorMessage`s into a
//! `tokio::sync::broadcast` channel. Each `/ws/monitor` connection holds one
//! receiver. Publishing with no subscribers is a no-op, and slow subscribers
//! that lag behind simply skip ahead.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use models::MonitorMessage;
use models::monitor::MetricsSnapshot;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::state::AppState;

#[cfg(test)]
#[path = "monitor_test.rs"]
mod tests;

const HUB_CAPACITY: usize = 256;

// =============================================================================
// HUB
// =============================================================================

#[derive(Clone)]
pub struct MonitorHub {
    tx: broadcast::Sender<MonitorMessage>,
}

impl MonitorHub {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(HUB_CAPACITY);
        Self { tx }
    }

    /// Publish to every current subscriber. Returns how many received it.
    pub fn publish(&self, message: MonitorMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorMessage> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for MonitorHub {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// REQUEST METRICS
// =============================================================================

#[derive(Default)]
struct Counters {
    requests_total: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    in_flight: AtomicU64,
}

/// Process-wide request counters, updated by [`track_requests`].
#[derive(Clone)]
pub struct RequestMetrics {
    started: Instant,
    counters: Arc<Counters>,
}

impl RequestMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self { started: Instant::now(), counters: Arc::new(Counters::default()) }
    }

    fn begin(&self) {
        self.counters.requests_total.fetch_add(1, Ordering::Relaxed);
        self.counters.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self, status: u16) {
        self.counters.in_flight.fetch_sub(1, Ordering::Relaxed);
        if (400..500).contains(&status) {
            self.counters.client_errors.fetch_add(1, Ordering::Relaxed);
        } else if status >= 500 {
            self.counters.server_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn requests_total(&self) -> u64 {
        self.counters.requests_total.load(Ordering::Relaxed)
    }

    /// Snapshot the counters. Pool and subscriber figures are filled in by the caller.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started.elapsed().as_secs(),
            requests_total: self.requests_total(),
            client_errors: self.counters.client_errors.load(Ordering::Relaxed),
            server_errors: self.counters.server_errors.load(Ordering::Relaxed),
            in_flight: self.counters.in_flight.load(Ordering::Relaxed),
            ..MetricsSnapshot::default()
        }
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Axum middleware counting requests by outcome.
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.metrics.begin();
    let response = next.run(request).await;
    state.metrics.finish(response.status().as_u16());
    response
}

/// Full metrics message including pool and subscriber figures.
#[must_use]
pub fn collect_metrics(state: &AppState) -> MonitorMessage {
    let mut snapshot = state.metrics.snapshot();
    snapshot.ws_subscribers = state.monitor.subscriber_count() as u64;
    snapshot.db_pool_size = state.pool.size();
    snapshot.db_pool_idle = u32::try_from(state.pool.num_idle()).unwrap_or(u32::MAX);
    MonitorMessage::Metrics(snapshot)
}

/// Spawn the task that pushes a `metrics` message every configured interval
/// while at least one dashboard is connected.
pub fn spawn_metrics_task(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(state.config.metrics_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if state.monitor.subscriber_count() == 0 {
                continue;
            }
            state.monitor.publish(collect_metrics(&state));
        }
    })
}
