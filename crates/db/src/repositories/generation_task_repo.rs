//! Repository for the `generation_tasks` table.

use sqlx::{PgExecutor, PgPool};
use sangeet_core::audit::events;
use sangeet_core::types::DbId;

use crate::models::audit::NewAuditLogEntry;
use crate::models::generation::GenerationTask;
use crate::models::status::{GenerationStatus, OPEN_STATUSES};
use crate::repositories::AuditLogRepo;

/// Column list for `generation_tasks` queries.
const COLUMNS: &str = "id, task_id, record_id, status_id, submitted_at, updated_at";

/// Provides query operations for provider task handles.
pub struct GenerationTaskRepo;

impl GenerationTaskRepo {
    /// Insert the task row for a freshly dispatched record and write the
    /// `dispatched` audit entry in the same transaction.
    pub async fn register(
        pool: &PgPool,
        record_id: DbId,
        task_id: &str,
        detail: &serde_json::Value,
    ) -> Result<GenerationTask, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO generation_tasks (task_id, record_id, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, GenerationTask>(&query)
            .bind(task_id)
            .bind(record_id)
            .bind(GenerationStatus::Pending.id())
            .fetch_one(&mut *tx)
            .await?;

        let mut detail = detail.clone();
        if let Some(obj) = detail.as_object_mut() {
            obj.insert("record_id".into(), record_id.into());
            obj.insert("status".into(), GenerationStatus::Pending.as_str().into());
        }
        AuditLogRepo::append(
            &mut *tx,
            &NewAuditLogEntry::new(task_id, events::DISPATCHED, detail),
        )
        .await?;

        tx.commit().await?;
        Ok(task)
    }

    /// Find a task by its provider-assigned id.
    pub async fn find_by_task_id(
        pool: &PgPool,
        task_id: &str,
    ) -> Result<Option<GenerationTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generation_tasks WHERE task_id = $1");
        sqlx::query_as::<_, GenerationTask>(&query)
            .bind(task_id)
            .fetch_optional(pool)
            .await
    }

    /// All tasks that have not reached a terminal status.
    pub async fn list_open(pool: &PgPool) -> Result<Vec<GenerationTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generation_tasks \
             WHERE status_id = ANY($1) \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, GenerationTask>(&query)
            .bind(&OPEN_STATUSES[..])
            .fetch_all(pool)
            .await
    }

    /// Mirror a record's status onto its task row.
    pub async fn sync_status<'e, E: PgExecutor<'e>>(
        executor: E,
        record_id: DbId,
        status: GenerationStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generation_tasks SET status_id = $2, updated_at = NOW() WHERE record_id = $1",
        )
        .bind(record_id)
        .bind(status.id())
        .execute(executor)
        .await?;
        Ok(())
    }
}
