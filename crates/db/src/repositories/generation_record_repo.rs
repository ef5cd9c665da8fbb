//! Repository for the `generation_records` table.
//!
//! Every status transition is a guarded `UPDATE ... WHERE status_id = ANY(open)`
//! so concurrent or repeated signals converge: exactly one caller sees the
//! row come back, everyone else gets `None`/`false`.

use sqlx::PgPool;
use sangeet_core::types::DbId;

use crate::models::generation::{ArtifactUpdate, GenerationRecord, NewGenerationRecord};
use crate::models::status::{GenerationStatus, OPEN_STATUSES};
use crate::repositories::GenerationTaskRepo;

/// Column list for `generation_records` queries.
const COLUMNS: &str = "\
    id, parameters, prompt, artifact_url, artifact_urls, title, status_id, \
    error_message, regenerated_from, created_at, updated_at, completed_at";

/// Provides CRUD and guarded status transitions for generation records.
pub struct GenerationRecordRepo;

impl GenerationRecordRepo {
    /// Insert a pending record with no artifact.
    pub async fn create(
        pool: &PgPool,
        input: &NewGenerationRecord,
    ) -> Result<GenerationRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO generation_records (parameters, prompt, status_id, regenerated_from) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationRecord>(&query)
            .bind(&input.parameters)
            .bind(&input.prompt)
            .bind(GenerationStatus::Pending.id())
            .bind(input.regenerated_from)
            .fetch_one(pool)
            .await
    }

    /// Find a record by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<GenerationRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generation_records WHERE id = $1");
        sqlx::query_as::<_, GenerationRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // ── Status transitions ───────────────────────────────────────────

    /// PENDING -> PROCESSING. Returns `false` if the record was not pending.
    pub async fn mark_processing(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let result = sqlx::query(
            "UPDATE generation_records \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(GenerationStatus::Processing.id())
        .bind(GenerationStatus::Pending.id())
        .execute(&mut *tx)
        .await?;

        let applied = result.rows_affected() > 0;
        if applied {
            GenerationTaskRepo::sync_status(&mut *tx, id, GenerationStatus::Processing).await?;
        }
        tx.commit().await?;
        Ok(applied)
    }

    /// Attach the artifact and move to COMPLETE, only if no artifact is
    /// attached yet and the record is still open. Returns the updated row
    /// when this call performed the write.
    pub async fn attach_artifact(
        pool: &PgPool,
        id: DbId,
        update: &ArtifactUpdate,
    ) -> Result<Option<GenerationRecord>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE generation_records \
             SET artifact_url = $2, artifact_urls = $3, title = COALESCE(title, $4), \
                 status_id = $5, updated_at = NOW(), completed_at = NOW() \
             WHERE id = $1 AND artifact_url IS NULL AND $2 <> '' AND status_id = ANY($6) \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, GenerationRecord>(&query)
            .bind(id)
            .bind(&update.primary_url)
            .bind(&update.all_urls)
            .bind(&update.title)
            .bind(GenerationStatus::Complete.id())
            .bind(&OPEN_STATUSES[..])
            .fetch_optional(&mut *tx)
            .await?;

        if updated.is_some() {
            GenerationTaskRepo::sync_status(&mut *tx, id, GenerationStatus::Complete).await?;
        }
        tx.commit().await?;
        Ok(updated)
    }

    /// Move an open record to FAILED. Returns `false` if it was already
    /// terminal.
    pub async fn mark_failed(pool: &PgPool, id: DbId, reason: &str) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let result = sqlx::query(
            "UPDATE generation_records \
             SET status_id = $2, error_message = $3, updated_at = NOW(), completed_at = NOW() \
             WHERE id = $1 AND status_id = ANY($4)",
        )
        .bind(id)
        .bind(GenerationStatus::Failed.id())
        .bind(reason)
        .bind(&OPEN_STATUSES[..])
        .execute(&mut *tx)
        .await?;

        let applied = result.rows_affected() > 0;
        if applied {
            GenerationTaskRepo::sync_status(&mut *tx, id, GenerationStatus::Failed).await?;
        }
        tx.commit().await?;
        Ok(applied)
    }
}
