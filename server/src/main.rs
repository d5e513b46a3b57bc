use std::time::Duration;

use server::config::ServerConfig;
use server::{db, routes, services, state};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env().expect("invalid configuration");
    let port = config.port;

    let app = if config.mock_only {
        tracing::warn!("MOCK_ONLY set: serving the in-memory mock API without a database");
        routes::mock_only_app(&config)
    } else {
        let database_url = config.database_url.clone().expect("DATABASE_URL required");
        let pool = db::init_pool(&database_url, config.db_max_connections)
            .await
            .expect("database init failed");
        let state = state::AppState::new(pool, config);

        let _metrics = services::monitor::spawn_metrics_task(state.clone());
        let purge_pool = state.pool.clone();
        let _purge = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
            loop {
                ticker.tick().await;
                match services::session::purge_expired(&purge_pool).await {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!(purged, "expired sessions removed"),
                    Err(e) => tracing::warn!(error = %e, "session purge failed"),
                }
            }
        });

        routes::app(state)
    };

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "storefront listening");
    axum::serve(listener, app).await.expect("server failed");
}
