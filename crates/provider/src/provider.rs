//! The seam between the orchestrator and whatever generates the music.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ProviderError;

/// A generation job as sent to the provider.
///
/// The prompt must already be truncated to the provider's limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitRequest {
    pub prompt: String,
    pub instrumental: bool,
}

/// Result of a single status-endpoint fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusFetch {
    /// The endpoint does not exist (HTTP 404).
    NotFound,
    /// A success status whose body is not JSON (typically an HTML page).
    NotJson,
    /// A usable JSON body.
    Json(serde_json::Value),
}

impl StatusFetch {
    /// Whether this response means "try the next candidate path".
    pub fn is_missing_endpoint(&self) -> bool {
        matches!(self, Self::NotFound | Self::NotJson)
    }
}

/// Asynchronous generation backend.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Submit a job; returns the provider's task identifier.
    async fn submit(&self, request: &SubmitRequest) -> Result<String, ProviderError>;

    /// GET a status path (relative to the provider base URL).
    async fn fetch_status(&self, path: &str) -> Result<StatusFetch, ProviderError>;
}
