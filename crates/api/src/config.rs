use std::time::Duration;

/// Slack added on top of the longest wait before the request layer gives up.
const REQUEST_TIMEOUT_MARGIN_SECS: u64 = 30;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds.
    ///
    /// Defaults to the longest server-side wait plus a margin, where each
    /// poll attempt counts `POLL_INTERVAL_SECS` plus `PROVIDER_TIMEOUT_SECS`.
    /// A shorter value turns a poll timeout (504) into a 408.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | see [`request_timeout_for`]|
    ///
    /// `max_wait` is the orchestrator's longest blocking wait.
    pub fn from_env(max_wait: Duration) -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let minimum = request_timeout_for(max_wait);
        let request_timeout_secs: u64 = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .expect("REQUEST_TIMEOUT_SECS must be a valid u64"),
            Err(_) => minimum,
        };
        if request_timeout_secs < minimum {
            tracing::warn!(
                request_timeout_secs,
                minimum,
                "REQUEST_TIMEOUT_SECS is shorter than the longest wait, slow polls will end in 408",
            );
        }

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
        }
    }
}

/// Request timeout that lets the longest wait end with its own 504.
pub fn request_timeout_for(max_wait: Duration) -> u64 {
    max_wait.as_secs() + REQUEST_TIMEOUT_MARGIN_SECS
}
