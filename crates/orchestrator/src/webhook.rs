//! Push path: provider callbacks.
//!
//! Nothing here returns an error. The HTTP layer always acknowledges the
//! provider; what happened is reported through [`WebhookOutcome`], logs,
//! and the audit trail.

use sangeet_core::audit::{events, sources};
use sangeet_provider::callback::{extract_task_id, parse_callback};
use serde_json::{json, Value};

use crate::orchestrator::Orchestrator;
use crate::reconciler::ReconcileOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Reconciled(ReconcileOutcome),
    MissingTaskId,
    UnknownTask(String),
    /// An internal error was logged.
    Failed,
}

impl Orchestrator {
    /// Apply a provider callback.
    ///
    /// `query_task_id` is the `task_id` query parameter, consulted only when
    /// the body carries no task id.
    pub async fn handle_provider_webhook(
        &self,
        payload: &Value,
        query_task_id: Option<&str>,
    ) -> WebhookOutcome {
        let Some(task_id) = extract_task_id(payload).or_else(|| {
            query_task_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
        }) else {
            tracing::warn!(payload = %payload, "Webhook without task id");
            return WebhookOutcome::MissingTaskId;
        };

        let record_id = match self.registry.resolve(self.store.as_ref(), &task_id).await {
            Ok(Some(record_id)) => record_id,
            Ok(None) => {
                tracing::warn!(task_id = %task_id, payload = %payload, "Webhook for unknown task");
                self.auditor
                    .record(
                        &task_id,
                        events::UNKNOWN_TASK,
                        json!({"source": sources::WEBHOOK, "payload": payload}),
                    )
                    .await;
                return WebhookOutcome::UnknownTask(task_id);
            }
            Err(e) => {
                tracing::error!(
                    task_id = %task_id,
                    error = %e,
                    payload = %payload,
                    "Failed to resolve webhook task",
                );
                return WebhookOutcome::Failed;
            }
        };

        let normalized = parse_callback(payload);
        let signal = normalized.signal();
        tracing::debug!(
            task_id = %task_id,
            record_id,
            shape = normalized.shape,
            signal = signal.kind(),
            "Webhook received",
        );
        if normalized.is_unrecognized() {
            tracing::warn!(task_id = %task_id, payload = %payload, "Unrecognized webhook payload");
        }

        match self
            .reconciler
            .apply(&task_id, record_id, signal, sources::WEBHOOK)
            .await
        {
            Ok(outcome) => WebhookOutcome::Reconciled(outcome),
            Err(e) => {
                tracing::error!(
                    task_id = %task_id,
                    record_id,
                    error = %e,
                    payload = %payload,
                    "Failed to reconcile webhook",
                );
                WebhookOutcome::Failed
            }
        }
    }
}
