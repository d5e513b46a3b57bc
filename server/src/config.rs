//! Server configuration parsed from environment variables.
//!
//! `main` loads `.env` (via `dotenvy`) before calling [`ServerConfig::from_env`],
//! so every setting can come from either source.

use std::time::Duration;

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 168;
pub const DEFAULT_METRICS_INTERVAL_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL required (or set MOCK_ONLY=true)")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `None` only in mock-only mode.
    pub database_url: Option<String>,
    pub port: u16,
    pub db_max_connections: u32,
    pub session_ttl: Duration,
    /// Mount the in-memory mock backend under `/mock`.
    pub mock_api: bool,
    /// Serve only the mock backend; no database is touched.
    pub mock_only: bool,
    pub metrics_interval: Duration,
    pub cors_allow_any: bool,
}

impl ServerConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL` unless `MOCK_ONLY=true`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `SESSION_TTL_HOURS`: default 168
    /// - `MOCK_API`: default false
    /// - `MOCK_ONLY`: default false
    /// - `MONITOR_METRICS_INTERVAL_SECS`: default 5
    /// - `CORS_ALLOW_ANY`: default true
    pub fn from_env() -> Result<Self, ConfigError> {
        let mock_only = env_bool("MOCK_ONLY").unwrap_or(false);
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());
        if database_url.is_none() && !mock_only {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        Ok(Self {
            database_url,
            port: env_parse("PORT", DEFAULT_PORT),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            session_ttl: Duration::from_secs(env_parse("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS) * 3600),
            mock_api: mock_only || env_bool("MOCK_API").unwrap_or(false),
            mock_only,
            metrics_interval: Duration::from_secs(
                env_parse("MONITOR_METRICS_INTERVAL_SECS", DEFAULT_METRICS_INTERVAL_SECS).max(1),
            ),
            cors_allow_any: env_bool("CORS_ALLOW_ANY").unwrap_or(true),
        })
    }

    /// Config for tests and the mock-only server.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            port: 0,
            db_max_connections: 1,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_HOURS * 3600),
            mock_api: true,
            mock_only: false,
            metrics_interval: Duration::from_secs(DEFAULT_METRICS_INTERVAL_SECS),
            cors_allow_any: true,
        }
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| parse_bool(&raw))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
