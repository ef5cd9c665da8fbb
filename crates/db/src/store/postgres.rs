//! PostgreSQL-backed [`GenerationStore`].

use async_trait::async_trait;
use sangeet_core::types::DbId;

use super::{AuditLogSink, GenerationStore, StoreError};
use crate::models::audit::{AuditLogEntry, NewAuditLogEntry};
use crate::models::generation::{
    ArtifactUpdate, GenerationRecord, GenerationTask, NewGenerationRecord,
};
use crate::repositories::{AuditLogRepo, GenerationRecordRepo, GenerationTaskRepo};
use crate::DbPool;

/// Unique constraint guarding provider task ids.
const TASK_ID_CONSTRAINT: &str = "uq_generation_tasks_task_id";

/// Durable store delegating to the repository layer.
#[derive(Clone)]
pub struct PgGenerationStore {
    pool: DbPool,
}

impl PgGenerationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl AuditLogSink for PgGenerationStore {
    async fn append_audit(&self, entry: &NewAuditLogEntry) -> Result<AuditLogEntry, StoreError> {
        Ok(AuditLogRepo::append(&self.pool, entry).await?)
    }

    async fn list_audit(&self, task_id: &str) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(AuditLogRepo::list_by_task(&self.pool, task_id).await?)
    }
}

#[async_trait]
impl GenerationStore for PgGenerationStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn create_record(
        &self,
        input: &NewGenerationRecord,
    ) -> Result<GenerationRecord, StoreError> {
        Ok(GenerationRecordRepo::create(&self.pool, input).await?)
    }

    async fn find_record(&self, id: DbId) -> Result<Option<GenerationRecord>, StoreError> {
        Ok(GenerationRecordRepo::find_by_id(&self.pool, id).await?)
    }

    async fn register_dispatch(
        &self,
        record_id: DbId,
        task_id: &str,
        detail: &serde_json::Value,
    ) -> Result<GenerationTask, StoreError> {
        GenerationTaskRepo::register(&self.pool, record_id, task_id, detail)
            .await
            .map_err(|e| {
                let duplicate = matches!(
                    &e,
                    sqlx::Error::Database(db_err) if db_err.constraint() == Some(TASK_ID_CONSTRAINT)
                );
                if duplicate {
                    StoreError::DuplicateTask(task_id.to_string())
                } else {
                    StoreError::Database(e)
                }
            })
    }

    async fn find_task(&self, task_id: &str) -> Result<Option<GenerationTask>, StoreError> {
        Ok(GenerationTaskRepo::find_by_task_id(&self.pool, task_id).await?)
    }

    async fn list_open_tasks(&self) -> Result<Vec<GenerationTask>, StoreError> {
        Ok(GenerationTaskRepo::list_open(&self.pool).await?)
    }

    async fn mark_processing(&self, record_id: DbId) -> Result<bool, StoreError> {
        Ok(GenerationRecordRepo::mark_processing(&self.pool, record_id).await?)
    }

    async fn attach_artifact(
        &self,
        record_id: DbId,
        update: &ArtifactUpdate,
    ) -> Result<Option<GenerationRecord>, StoreError> {
        Ok(GenerationRecordRepo::attach_artifact(&self.pool, record_id, update).await?)
    }

    async fn mark_failed(&self, record_id: DbId, reason: &str) -> Result<bool, StoreError> {
        Ok(GenerationRecordRepo::mark_failed(&self.pool, record_id, reason).await?)
    }
}
