//! Admin monitoring: live WebSocket feed, metrics snapshot, smoke trigger.
//!
//! LIFECYCLE
//! =========
//! 1. `GET /ws/monitor?token=<admin session token>` validates the token and
//!    upgrades
//! 2. The connection receives one `metrics` message immediately, then every
//!    hub message as a JSON text frame
//! 3. Lagging connections skip missed messages; close ends the loop

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use models::{MonitorMessage, Role};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::AdminUser;
use crate::error::{ApiError, ApiQuery, ok};
use crate::services::{monitor, session, smoke};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MonitorParams {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SmokeStarted {
    pub run_id: Uuid,
}

/// `GET /ws/monitor`. Authorization is checked before the upgrade is.
pub async fn handle_monitor_ws(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<MonitorParams>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let token = params.token.filter(|t| !t.is_empty()).ok_or_else(ApiError::unauthorized)?;
    let user = session::validate_session(&state.pool, &token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Session expired or invalid".into()))?;
    if user.role != Role::Admin {
        return Err(ApiError::forbidden());
    }
    let ws = ws.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let admin_id = user.id;
    Ok(ws.on_upgrade(move |socket| run_monitor(socket, state, admin_id)))
}

async fn run_monitor(mut socket: WebSocket, state: AppState, admin_id: Uuid) {
    let mut rx = state.monitor.subscribe();
    info!(%admin_id, "monitor: dashboard connected");

    if send_message(&mut socket, &monitor::collect_metrics(&state)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(message) => {
                        if send_message(&mut socket, &message).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%admin_id, skipped, "monitor: subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
    info!(%admin_id, "monitor: dashboard disconnected");
}

async fn send_message(socket: &mut WebSocket, message: &MonitorMessage) -> Result<(), ()> {
    let Ok(json) = serde_json::to_string(message) else {
        return Ok(());
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

/// `GET /api/monitor/metrics` (admin)
pub async fn metrics(State(state): State<AppState>, _admin: AdminUser) -> impl IntoResponse {
    ok(monitor::collect_metrics(&state))
}

/// `POST /api/monitor/smoke` (admin). Progress is streamed over `/ws/monitor`.
pub async fn run_smoke(State(state): State<AppState>, AdminUser(admin): AdminUser) -> impl IntoResponse {
    let run_id = smoke::spawn_smoke_run(&state);
    info!(%run_id, admin_id = %admin.user.id, "smoke run started");
    (StatusCode::ACCEPTED, ok(SmokeStarted { run_id }))
}
