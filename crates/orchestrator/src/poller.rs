//! Pull path: status checks and the bounded poll loop.
//!
//! A status check never answers from the provider alone. The provider's
//! answer (if any) is fed through the reconciler and the response is always
//! read back from the record, so an unavailable or failing status endpoint
//! only makes the answer staler, never wrong.

use sangeet_core::audit::sources;
use sangeet_core::types::{DbId, Timestamp};
use sangeet_db::models::generation::GenerationRecord;
use sangeet_db::models::status::GenerationStatus;
use sangeet_provider::status::parse_status_response;
use sangeet_provider::ProbeOutcome;
use serde::Serialize;

use crate::error::OrchestratorError;
use crate::orchestrator::Orchestrator;

/// Status of one generation, as seen by API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationStatusView {
    pub task_id: String,
    pub record_id: DbId,
    pub status: GenerationStatus,
    pub artifact_url: Option<String>,
    pub all_artifact_urls: Vec<String>,
    pub title: Option<String>,
    pub error_message: Option<String>,
    pub updated_at: Timestamp,
}

impl GenerationStatusView {
    pub fn from_record(task_id: &str, record: &GenerationRecord) -> Self {
        Self {
            task_id: task_id.to_string(),
            record_id: record.id,
            status: record.status(),
            artifact_url: record.artifact_url.clone(),
            all_artifact_urls: record.artifact_urls.clone(),
            title: record.title.clone(),
            error_message: record.error_message.clone(),
            updated_at: record.updated_at,
        }
    }
}

impl Orchestrator {
    /// Current status of a task.
    ///
    /// Terminal records are answered without any provider call. Otherwise
    /// the status endpoint is probed (unless known to be unavailable) and
    /// whatever it reports is reconciled first.
    pub async fn get_generation_status(
        &self,
        task_id: &str,
    ) -> Result<GenerationStatusView, OrchestratorError> {
        let record = self.get_record_by_task(task_id).await?;
        if record.status().is_terminal() {
            return Ok(GenerationStatusView::from_record(task_id, &record));
        }

        match self.prober.probe(self.provider.as_ref(), task_id).await {
            ProbeOutcome::Found { path_index, body } => {
                let signal = parse_status_response(&body);
                tracing::debug!(
                    task_id,
                    record_id = record.id,
                    path_index,
                    signal = signal.kind(),
                    "Provider status fetched",
                );
                self.reconciler
                    .apply(task_id, record.id, signal, sources::POLL)
                    .await?;
                let record = self
                    .store
                    .find_record(record.id)
                    .await?
                    .ok_or(OrchestratorError::RecordNotFound(record.id))?;
                Ok(GenerationStatusView::from_record(task_id, &record))
            }
            ProbeOutcome::Unavailable => Ok(GenerationStatusView::from_record(task_id, &record)),
            ProbeOutcome::Failed(e) => {
                tracing::debug!(task_id, error = %e, "Answering status from record");
                Ok(GenerationStatusView::from_record(task_id, &record))
            }
        }
    }

    /// Poll until the task is terminal, at most `poll_max_attempts` times,
    /// `poll_interval` apart.
    pub async fn wait_for_completion(
        &self,
        task_id: &str,
    ) -> Result<GenerationStatusView, OrchestratorError> {
        let max_attempts = self.config.poll_max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let view = self.get_generation_status(task_id).await?;
            if view.status.is_terminal() {
                tracing::debug!(task_id, attempt, status = view.status.as_str(), "Poll loop done");
                return Ok(view);
            }
            if attempt < max_attempts {
                tokio::select! {
                    _ = self.shutdown.cancelled() => return Err(OrchestratorError::ShuttingDown),
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
            }
        }

        tracing::warn!(task_id, attempts = max_attempts, "Poll loop timed out");
        Err(OrchestratorError::PollTimeout {
            task_id: task_id.to_string(),
            attempts: max_attempts,
        })
    }
}
