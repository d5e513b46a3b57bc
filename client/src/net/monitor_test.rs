use super::*;
use futures::SinkExt;
use models::monitor::MetricsSnapshot;
use tokio::net::TcpListener;

#[test]
fn monitor_url_switches_scheme_and_encodes_token() {
    assert_eq!(monitor_url("http://127.0.0.1:3000/", "abc"), "ws://127.0.0.1:3000/ws/monitor?token=abc");
    assert_eq!(monitor_url("https://shop.example", "a b"), "wss://shop.example/ws/monitor?token=a+b");
}

/// Accept websocket clients forever; each gets one metrics push, then a close.
async fn flaky_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut served = 0_u64;
        loop {
            let Ok((socket, _)) = listener.accept().await else { break };
            served += 1;
            let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else { continue };
            let push = MonitorMessage::Metrics(MetricsSnapshot { requests_total: served, ..Default::default() });
            let json = serde_json::to_string(&push).unwrap();
            let _ = ws.send(Message::Text(json.into())).await;
            let _ = ws.close(None).await;
        }
    });
    format!("ws://{addr}/ws/monitor")
}

#[tokio::test]
async fn reconnects_after_close_and_applies_messages() {
    let url = flaky_server().await;
    let (tx, mut rx) = watch::channel(DashboardState::default());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_monitor(url, tx, cancel.clone(), Duration::from_millis(20)));

    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.connections >= 2 && s.metrics.is_some()))
        .await
        .expect("monitor did not reconnect")
        .unwrap()
        .clone();
    assert!(state.metrics.unwrap().requests_total >= 1);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert!(!rx.borrow().connected);
}

#[tokio::test]
async fn cancel_stops_a_client_waiting_to_reconnect() {
    // Nothing listens on this port, so every attempt fails immediately.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("ws://{}/ws/monitor", listener.local_addr().unwrap());
    drop(listener);

    let (tx, _rx) = watch::channel(DashboardState::default());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_monitor(url, tx, cancel.clone(), RECONNECT_DELAY));
    tokio::time::sleep(Duration::from_millis(50)).await;

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
}
