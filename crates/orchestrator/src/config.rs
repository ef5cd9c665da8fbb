use std::time::Duration;

use sangeet_provider::ProviderConfig;

/// Orchestrator settings.
///
/// | Env var                   | Default |
/// |---------------------------|---------|
/// | `STATUS_PROBE_TTL_SECS`   | `3600`  |
/// | `PROBE_LOG_INTERVAL_SECS` | `300`   |
/// | `POLL_MAX_ATTEMPTS`       | `60`    |
/// | `POLL_INTERVAL_SECS`      | `5`     |
///
/// The prompt limit and status path candidates come from the
/// [`ProviderConfig`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_prompt_chars: usize,
    pub status_paths: Vec<String>,
    pub status_probe_ttl: Duration,
    pub probe_log_interval: Duration,
    pub poll_max_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let provider = ProviderConfig::default();
        Self {
            max_prompt_chars: provider.max_prompt_chars,
            status_paths: provider.status_paths,
            status_probe_ttl: Duration::from_secs(3600),
            probe_log_interval: Duration::from_secs(300),
            poll_max_attempts: 60,
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl OrchestratorConfig {
    /// Load from environment variables.
    ///
    /// Panics if a variable is set but cannot be parsed.
    pub fn from_env(provider: &ProviderConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_prompt_chars: provider.max_prompt_chars,
            status_paths: provider.status_paths.clone(),
            status_probe_ttl: env_secs("STATUS_PROBE_TTL_SECS", defaults.status_probe_ttl),
            probe_log_interval: env_secs("PROBE_LOG_INTERVAL_SECS", defaults.probe_log_interval),
            poll_max_attempts: std::env::var("POLL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| defaults.poll_max_attempts.to_string())
                .parse()
                .expect("POLL_MAX_ATTEMPTS must be a valid u32"),
            poll_interval: env_secs("POLL_INTERVAL_SECS", defaults.poll_interval),
        }
    }
}

impl OrchestratorConfig {
    /// Upper bound on how long a blocking wait can run: every attempt
    /// sleeps once and its status request may run to the provider timeout.
    pub fn max_wait(&self, provider_timeout: Duration) -> Duration {
        (self.poll_interval + provider_timeout) * self.poll_max_attempts
    }
}

fn env_secs(name: &str, default: Duration) -> Duration {
    let secs: u64 = std::env::var(name)
        .unwrap_or_else(|_| default.as_secs().to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid number of seconds"));
    Duration::from_secs(secs)
}
