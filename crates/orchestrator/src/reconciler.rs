//! The single writer of generation state.
//!
//! Webhooks and status polls both reduce their input to a
//! [`ProviderSignal`] and hand it to [`Reconciler::apply`]. Every
//! transition is a guarded conditional write in the store, so duplicate
//! and out-of-order signals converge to one outcome: the first completion
//! attaches the artifact, later ones are no-ops.

use std::sync::Arc;

use sangeet_core::audit::events;
use sangeet_core::types::DbId;
use sangeet_db::models::generation::ArtifactUpdate;
use sangeet_db::models::status::GenerationStatus;
use sangeet_db::{GenerationStore, StoreError};
use sangeet_provider::ProviderSignal;
use serde_json::json;

use crate::audit::Auditor;

/// What applying a signal did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Completed,
    Failed,
    Processing,
    /// A terminal signal for an already terminal record.
    Duplicate,
    /// Looked complete, carried no usable URL. Record untouched.
    Ambiguous,
    Unchanged,
}

pub struct Reconciler {
    store: Arc<dyn GenerationStore>,
    auditor: Auditor,
}

impl Reconciler {
    pub fn new(store: Arc<dyn GenerationStore>, auditor: Auditor) -> Self {
        Self { store, auditor }
    }

    /// Apply `signal` from `source` to the record behind `task_id`.
    pub async fn apply(
        &self,
        task_id: &str,
        record_id: DbId,
        signal: ProviderSignal,
        source: &'static str,
    ) -> Result<ReconcileOutcome, StoreError> {
        match signal {
            ProviderSignal::Completed {
                primary_url,
                all_urls,
                title,
            } => {
                let update = ArtifactUpdate {
                    primary_url,
                    all_urls,
                    title,
                };
                match self.store.attach_artifact(record_id, &update).await? {
                    Some(record) => {
                        tracing::info!(
                            task_id,
                            record_id,
                            source,
                            artifact_url = %update.primary_url,
                            "Generation completed",
                        );
                        self.auditor
                            .record(
                                task_id,
                                events::COMPLETED,
                                json!({
                                    "source": source,
                                    "record_id": record_id,
                                    "artifact_url": record.artifact_url,
                                    "artifact_count": record.artifact_urls.len(),
                                    "status": GenerationStatus::Complete.as_str(),
                                }),
                            )
                            .await;
                        Ok(ReconcileOutcome::Completed)
                    }
                    None => Ok(self.duplicate(task_id, record_id, "completed", source).await),
                }
            }

            ProviderSignal::Failed { reason } => {
                if self.store.mark_failed(record_id, &reason).await? {
                    tracing::warn!(task_id, record_id, source, reason = %reason, "Generation failed");
                    self.auditor
                        .record(
                            task_id,
                            events::FAILED,
                            json!({
                                "source": source,
                                "record_id": record_id,
                                "reason": reason,
                                "status": GenerationStatus::Failed.as_str(),
                            }),
                        )
                        .await;
                    Ok(ReconcileOutcome::Failed)
                } else {
                    Ok(self.duplicate(task_id, record_id, "failed", source).await)
                }
            }

            ProviderSignal::Progress => {
                if self.store.mark_processing(record_id).await? {
                    tracing::info!(task_id, record_id, source, "Generation processing");
                    self.auditor
                        .record(
                            task_id,
                            events::PROCESSING,
                            json!({
                                "source": source,
                                "record_id": record_id,
                                "status": GenerationStatus::Processing.as_str(),
                            }),
                        )
                        .await;
                    Ok(ReconcileOutcome::Processing)
                } else {
                    Ok(ReconcileOutcome::Unchanged)
                }
            }

            ProviderSignal::Ambiguous { detail } => {
                tracing::warn!(
                    task_id,
                    record_id,
                    source,
                    detail = %detail,
                    "Ambiguous completion signal ignored",
                );
                self.auditor
                    .record(
                        task_id,
                        events::AMBIGUOUS_COMPLETION,
                        json!({"source": source, "record_id": record_id, "detail": detail}),
                    )
                    .await;
                Ok(ReconcileOutcome::Ambiguous)
            }

            ProviderSignal::Waiting => Ok(ReconcileOutcome::Unchanged),

            ProviderSignal::Unrecognized => {
                tracing::warn!(task_id, record_id, source, "Unrecognized provider signal");
                Ok(ReconcileOutcome::Unchanged)
            }
        }
    }

    async fn duplicate(
        &self,
        task_id: &str,
        record_id: DbId,
        signal: &str,
        source: &'static str,
    ) -> ReconcileOutcome {
        tracing::debug!(task_id, record_id, source, signal, "Duplicate terminal signal ignored");
        self.auditor
            .record(
                task_id,
                events::DUPLICATE_SIGNAL,
                json!({"source": source, "record_id": record_id, "signal": signal}),
            )
            .await;
        ReconcileOutcome::Duplicate
    }
}
