//! Provider connection settings loaded from environment variables.

/// Default candidate status paths, tried in order during discovery.
/// `{task_id}` is replaced by the percent-encoded task identifier.
pub const DEFAULT_STATUS_PATHS: &[&str] = &[
    "/api/v1/generate/record-info?taskId={task_id}",
    "/api/v1/generate/status/{task_id}",
    "/api/v1/tasks/{task_id}",
];

/// Provider settings.
///
/// | Env var                    | Default                                          |
/// |----------------------------|--------------------------------------------------|
/// | `PROVIDER_BASE_URL`        | `http://localhost:9000`                          |
/// | `PROVIDER_API_KEY`         | *(empty)*                                        |
/// | `PROVIDER_CALLBACK_URL`    | `http://localhost:3000/api/v1/webhooks/provider` |
/// | `PROVIDER_MODEL`           | `V4`                                             |
/// | `PROVIDER_MAX_PROMPT_CHARS`| `400`                                            |
/// | `PROVIDER_TIMEOUT_SECS`    | `30`                                             |
/// | `PROVIDER_STATUS_PATHS`    | comma-separated, see [`DEFAULT_STATUS_PATHS`]    |
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub callback_url: String,
    pub model: String,
    pub max_prompt_chars: usize,
    pub timeout_secs: u64,
    pub status_paths: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".into(),
            api_key: String::new(),
            callback_url: "http://localhost:3000/api/v1/webhooks/provider".into(),
            model: "V4".into(),
            max_prompt_chars: 400,
            timeout_secs: 30,
            status_paths: DEFAULT_STATUS_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ProviderConfig {
    /// Load from environment variables, falling back to [`Default`] values.
    ///
    /// Panics if a numeric variable is set but cannot be parsed, so
    /// misconfiguration is caught at startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("PROVIDER_BASE_URL").unwrap_or(defaults.base_url);
        let api_key = std::env::var("PROVIDER_API_KEY").unwrap_or(defaults.api_key);
        let callback_url =
            std::env::var("PROVIDER_CALLBACK_URL").unwrap_or(defaults.callback_url);
        let model = std::env::var("PROVIDER_MODEL").unwrap_or(defaults.model);

        let max_prompt_chars: usize = std::env::var("PROVIDER_MAX_PROMPT_CHARS")
            .unwrap_or_else(|_| defaults.max_prompt_chars.to_string())
            .parse()
            .expect("PROVIDER_MAX_PROMPT_CHARS must be a valid usize");

        let timeout_secs: u64 = std::env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults.timeout_secs.to_string())
            .parse()
            .expect("PROVIDER_TIMEOUT_SECS must be a valid u64");

        let status_paths = std::env::var("PROVIDER_STATUS_PATHS")
            .map(|raw| parse_status_paths(&raw))
            .ok()
            .filter(|paths| !paths.is_empty())
            .unwrap_or(defaults.status_paths);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            callback_url,
            model,
            max_prompt_chars,
            timeout_secs,
            status_paths,
        }
    }
}

/// Split a comma-separated path list, dropping blanks.
pub fn parse_status_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
