//! Monitor dashboard websocket client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The admin page mounts [`run_monitor`] in a background task. Every text
//! frame is parsed as a [`MonitorMessage`] and folded into the shared
//! [`DashboardState`]. When the socket closes or fails, the loop waits a fixed
//! delay and reconnects, until its cancellation token fires.

use std::time::Duration;

use futures::StreamExt;
use models::MonitorMessage;
use models::monitor::MetricsSnapshot;
use serde::Deserialize;
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::api::{ApiClient, ApiError};
use crate::state::dashboard::DashboardState;
use crate::util::location::with_query;

#[cfg(test)]
#[path = "monitor_test.rs"]
mod tests;

pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// `ws(s)://.../ws/monitor?token=...` for an HTTP(S) API base URL.
#[must_use]
pub fn monitor_url(base_url: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_owned()
    };
    with_query(&format!("{ws_base}/ws/monitor"), &[("token", token)])
}

#[derive(Debug, Deserialize)]
struct SmokeStarted {
    run_id: Uuid,
}

/// `POST /api/monitor/smoke`: start a smoke run whose progress arrives over
/// the websocket.
pub async fn start_smoke_run(api: &ApiClient) -> Result<Uuid, ApiError> {
    let started: SmokeStarted = api.post("/api/monitor/smoke", &serde_json::json!({})).await?;
    Ok(started.run_id)
}

pub async fn fetch_metrics(api: &ApiClient) -> Result<MetricsSnapshot, ApiError> {
    api.get("/api/monitor/metrics").await
}

/// Why one connection ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Cancelled,
    Closed,
}

/// Connect, stream, and reconnect after `delay` until `cancel` fires.
pub async fn run_monitor(url: String, dashboard: watch::Sender<DashboardState>, cancel: CancellationToken, delay: Duration) {
    loop {
        match stream_once(&url, &dashboard, &cancel).await {
            SessionEnd::Cancelled => break,
            SessionEnd::Closed => {
                dashboard.send_modify(DashboardState::mark_disconnected);
                debug!(delay_ms = delay.as_millis(), "monitor reconnect scheduled");
            }
        }
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }
    dashboard.send_modify(DashboardState::mark_disconnected);
    info!("monitor client stopped");
}

async fn stream_once(url: &str, dashboard: &watch::Sender<DashboardState>, cancel: &CancellationToken) -> SessionEnd {
    let connected = tokio::select! {
        () = cancel.cancelled() => return SessionEnd::Cancelled,
        result = connect_async(url) => result,
    };
    let mut stream = match connected {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!(error = %e, "monitor connect failed");
            return SessionEnd::Closed;
        }
    };
    dashboard.send_modify(DashboardState::mark_connected);
    info!("monitor connected");

    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => {
                let _ = stream.close(None).await;
                return SessionEnd::Cancelled;
            }
            next = stream.next() => next,
        };
        match next {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<MonitorMessage>(text.as_str()) {
                Ok(message) => {
                    debug!(kind = message.kind(), "monitor message");
                    dashboard.send_modify(|state| state.apply(message));
                }
                Err(e) => warn!(error = %e, "unparseable monitor message"),
            },
            Some(Ok(Message::Close(_))) | None => {
                info!("monitor socket closed");
                return SessionEnd::Closed;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(error = %e, "monitor socket error");
                return SessionEnd::Closed;
            }
        }
    }
}
