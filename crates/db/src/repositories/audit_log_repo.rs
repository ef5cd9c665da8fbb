//! Repository for the append-only `generation_audit_log` table.

use sqlx::{PgExecutor, PgPool};

use crate::models::audit::{AuditLogEntry, NewAuditLogEntry};

/// Column list for `generation_audit_log` queries.
const COLUMNS: &str = "id, task_id, event, detail, logged_at";

/// Provides append and read operations for the audit log. There is no
/// update or delete.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append an entry. Accepts a pool or an open transaction.
    pub async fn append<'e, E: PgExecutor<'e>>(
        executor: E,
        entry: &NewAuditLogEntry,
    ) -> Result<AuditLogEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO generation_audit_log (task_id, event, detail) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLogEntry>(&query)
            .bind(&entry.task_id)
            .bind(&entry.event)
            .bind(&entry.detail)
            .fetch_one(executor)
            .await
    }

    /// All entries for a task, oldest first.
    pub async fn list_by_task(
        pool: &PgPool,
        task_id: &str,
    ) -> Result<Vec<AuditLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generation_audit_log WHERE task_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, AuditLogEntry>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }
}
