//! Provider callback endpoint.
//!
//! The provider retries callbacks that are not answered with 200, and a
//! retry never helps: the payload would be the same. So every request is
//! acknowledged, including malformed JSON, odd query strings and unknown
//! tasks. Nothing here may use an extractor that can reject.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use sangeet_orchestrator::WebhookOutcome;
use serde::Serialize;
use serde_json::Value;

use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /api/v1/webhooks/provider
///
/// The query string is read as raw pairs so a repeated `task_id` cannot
/// fail extraction; the first non-empty `task_id` wins.
pub async fn provider_callback(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    body: Bytes,
) -> Json<DataResponse<WebhookAck>> {
    let ack = Json(DataResponse {
        data: WebhookAck { received: true },
    });

    let query_task_id = match query {
        Ok(Query(pairs)) => query_task_id(pairs),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unparseable webhook query string");
            None
        }
    };

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(
                error = %e,
                body_len = body.len(),
                body = %String::from_utf8_lossy(&body[..body.len().min(2048)]),
                "Webhook body is not JSON",
            );
            return ack;
        }
    };

    let outcome = state
        .orchestrator
        .handle_provider_webhook(&payload, query_task_id.as_deref())
        .await;
    if let WebhookOutcome::Reconciled(result) = outcome {
        tracing::debug!(result = ?result, "Webhook reconciled");
    }

    ack
}

fn query_task_id(pairs: Vec<(String, String)>) -> Option<String> {
    pairs
        .into_iter()
        .find(|(key, value)| key == "task_id" && !value.trim().is_empty())
        .map(|(_, value)| value)
}
