//! Submission of generation requests.

use sangeet_core::error::CoreError;
use sangeet_core::generation::{build_prompt, validate_params, GenerationParams};
use sangeet_core::types::DbId;
use sangeet_db::models::generation::{GenerationRecord, NewGenerationRecord};
use sangeet_provider::SubmitRequest;
use serde::Serialize;
use serde_json::json;

use crate::error::OrchestratorError;
use crate::orchestrator::Orchestrator;

/// Handles returned by a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatched {
    pub task_id: String,
    pub record_id: DbId,
}

impl Orchestrator {
    /// Validate, build the prompt, create the pending record, submit it.
    ///
    /// Returns only after the record, the task, and the dispatch audit
    /// entry are all stored. If the provider rejects the submission the
    /// record is marked failed and the provider error is returned.
    pub async fn submit_generation(
        &self,
        params: &GenerationParams,
    ) -> Result<Dispatched, OrchestratorError> {
        self.dispatch(params, None).await
    }

    /// Dispatch a new record from an existing record's parameters.
    ///
    /// The original record is left untouched. Records still in flight
    /// cannot be regenerated.
    pub async fn regenerate(&self, record_id: DbId) -> Result<Dispatched, OrchestratorError> {
        let original = self
            .store
            .find_record(record_id)
            .await?
            .ok_or(OrchestratorError::RecordNotFound(record_id))?;
        if !original.status().is_terminal() {
            return Err(CoreError::Conflict(format!(
                "Generation record {record_id} is still {}",
                original.status().as_str()
            ))
            .into());
        }
        let params: GenerationParams = serde_json::from_value(original.parameters.clone())
            .map_err(|e| {
                CoreError::Internal(format!(
                    "Stored parameters of record {record_id} are unreadable: {e}"
                ))
            })?;
        self.dispatch(&params, Some(record_id)).await
    }

    async fn dispatch(
        &self,
        params: &GenerationParams,
        regenerated_from: Option<DbId>,
    ) -> Result<Dispatched, OrchestratorError> {
        validate_params(params)?;
        let prompt = build_prompt(params, self.config.max_prompt_chars);

        let parameters = serde_json::to_value(params)
            .map_err(|e| CoreError::Internal(format!("Failed to encode parameters: {e}")))?;
        let record = self
            .store
            .create_record(&NewGenerationRecord {
                parameters,
                prompt: prompt.clone(),
                regenerated_from,
            })
            .await?;

        let request = SubmitRequest {
            prompt,
            instrumental: params.mode.is_instrumental(),
        };
        let task_id = match self.provider.submit(&request).await {
            Ok(task_id) => task_id,
            Err(e) => {
                tracing::warn!(
                    record_id = record.id,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Provider rejected generation",
                );
                self.fail_undispatched(&record, &e.to_string()).await;
                return Err(e.into());
            }
        };

        let detail = json!({
            "prompt_chars": request.prompt.chars().count(),
            "instrumental": request.instrumental,
            "regenerated_from": regenerated_from,
        });
        if let Err(e) = self.store.register_dispatch(record.id, &task_id, &detail).await {
            tracing::error!(
                record_id = record.id,
                task_id = %task_id,
                error = %e,
                "Failed to register dispatched task",
            );
            self.fail_undispatched(&record, &e.to_string()).await;
            return Err(e.into());
        }
        self.registry.insert(&task_id, record.id).await;

        tracing::info!(
            task_id = %task_id,
            record_id = record.id,
            prompt_chars = request.prompt.chars().count(),
            "Generation dispatched",
        );
        Ok(Dispatched {
            task_id,
            record_id: record.id,
        })
    }

    async fn fail_undispatched(&self, record: &GenerationRecord, reason: &str) {
        if let Err(e) = self.store.mark_failed(record.id, reason).await {
            tracing::error!(record_id = record.id, error = %e, "Failed to mark record failed");
        }
    }
}
