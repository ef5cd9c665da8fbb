//! REST client for the provider HTTP endpoints.
//!
//! Wraps job submission and status retrieval using [`reqwest`] and maps
//! every failure onto a [`ProviderError`] variant.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::ProviderConfig;
use crate::error::{classify_code, classify_status, ProviderError};
use crate::provider::{GenerationProvider, StatusFetch, SubmitRequest};

/// Path of the submission endpoint, relative to the base URL.
pub const SUBMIT_PATH: &str = "/api/v1/generate";

/// HTTP client for the generation provider.
pub struct ProviderApi {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl ProviderApi {
    /// Create a client with the configured request timeout.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Read the body of a response, mapping non-2xx statuses to errors.
    async fn success_body(response: reqwest::Response) -> Result<String, ProviderError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }
        Ok(body)
    }
}

#[async_trait]
impl GenerationProvider for ProviderApi {
    async fn submit(&self, request: &SubmitRequest) -> Result<String, ProviderError> {
        let body = json!({
            "prompt": request.prompt,
            "instrumental": request.instrumental,
            "customMode": false,
            "model": self.config.model,
            "callBackUrl": self.config.callback_url,
        });

        let response = self
            .client
            .post(self.url(SUBMIT_PATH))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let text = Self::success_body(response).await?;
        parse_submit_body(&text)
    }

    async fn fetch_status(&self, path: &str) -> Result<StatusFetch, ProviderError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(StatusFetch::NotFound);
        }
        let text = Self::success_body(response).await?;
        Ok(match serde_json::from_str::<Value>(&text) {
            Ok(value) => StatusFetch::Json(value),
            Err(_) => StatusFetch::NotJson,
        })
    }
}

/// Extract the task id from a 2xx submission body.
pub fn parse_submit_body(text: &str) -> Result<String, ProviderError> {
    let value: Value = serde_json::from_str(text).map_err(|_| {
        ProviderError::MalformedResponse("submission response is not JSON".to_string())
    })?;

    if let Some(code) = value.get("code").and_then(Value::as_i64) {
        if !(200..300).contains(&code) {
            let message = value
                .get("msg")
                .or_else(|| value.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Err(classify_code(code, message));
        }
    }

    extract_task_id(&value).ok_or_else(|| {
        ProviderError::MalformedResponse("submission response carries no task id".to_string())
    })
}

/// Locate a task id in a provider body.
///
/// Looks at `data.task_id`, `data.taskId`, `task_id`, `taskId` in that
/// order and accepts strings or numbers.
pub fn extract_task_id(value: &Value) -> Option<String> {
    let data = value.get("data");
    [
        data.and_then(|d| d.get("task_id")),
        data.and_then(|d| d.get("taskId")),
        value.get("task_id"),
        value.get("taskId"),
    ]
    .into_iter()
    .flatten()
    .find_map(id_string)
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
