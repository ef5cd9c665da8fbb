//! The persistence seam used by the orchestrator.
//!
//! [`GenerationStore`] is implemented by [`PgGenerationStore`] (durable,
//! production) and [`MemoryGenerationStore`] (process-local, for tests and
//! local development). Both implementations share the same transition
//! guards: a record leaves PENDING/PROCESSING at most once and an artifact
//! is written at most once.

mod memory;
mod postgres;

use async_trait::async_trait;
use sangeet_core::types::DbId;

use crate::models::audit::{AuditLogEntry, NewAuditLogEntry};
use crate::models::generation::{
    ArtifactUpdate, GenerationRecord, GenerationTask, NewGenerationRecord,
};

pub use memory::MemoryGenerationStore;
pub use postgres::PgGenerationStore;

/// Errors surfaced by a [`GenerationStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying database call failed.
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A provider task id was registered twice.
    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),
}

/// Append-only sink for dispatch and resolution events.
#[async_trait]
pub trait AuditLogSink: Send + Sync {
    /// Append one entry. Entries are never updated or removed.
    async fn append_audit(&self, entry: &NewAuditLogEntry) -> Result<AuditLogEntry, StoreError>;

    /// All entries for a task, oldest first.
    async fn list_audit(&self, task_id: &str) -> Result<Vec<AuditLogEntry>, StoreError>;
}

/// Durable state for generation records and their provider tasks.
#[async_trait]
pub trait GenerationStore: AuditLogSink {
    /// Verify the backing store is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Insert a pending record with no artifact.
    async fn create_record(
        &self,
        input: &NewGenerationRecord,
    ) -> Result<GenerationRecord, StoreError>;

    async fn find_record(&self, id: DbId) -> Result<Option<GenerationRecord>, StoreError>;

    /// Create the task row for `record_id` and append the `dispatched`
    /// audit entry atomically.
    async fn register_dispatch(
        &self,
        record_id: DbId,
        task_id: &str,
        detail: &serde_json::Value,
    ) -> Result<GenerationTask, StoreError>;

    async fn find_task(&self, task_id: &str) -> Result<Option<GenerationTask>, StoreError>;

    /// Tasks still PENDING or PROCESSING (used to rebuild the registry).
    async fn list_open_tasks(&self) -> Result<Vec<GenerationTask>, StoreError>;

    /// PENDING -> PROCESSING. `false` when the record was not pending.
    async fn mark_processing(&self, record_id: DbId) -> Result<bool, StoreError>;

    /// Attach the artifact and complete the record, only if no artifact is
    /// attached yet and the record is open. `None` means nothing was written.
    async fn attach_artifact(
        &self,
        record_id: DbId,
        update: &ArtifactUpdate,
    ) -> Result<Option<GenerationRecord>, StoreError>;

    /// Fail an open record. `false` when it was already terminal.
    async fn mark_failed(&self, record_id: DbId, reason: &str) -> Result<bool, StoreError>;
}
