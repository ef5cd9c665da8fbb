//! Generation audit log models.
//!
//! Entries are immutable once written (no `updated_at`).

use serde::Serialize;
use sqlx::FromRow;
use sangeet_core::types::{DbId, Timestamp};

/// A single append-only audit entry for a provider task.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLogEntry {
    pub id: DbId,
    pub task_id: String,
    pub event: String,
    pub detail: serde_json::Value,
    pub logged_at: Timestamp,
}

/// DTO for appending an audit entry.
#[derive(Debug, Clone)]
pub struct NewAuditLogEntry {
    pub task_id: String,
    pub event: String,
    pub detail: serde_json::Value,
}

impl NewAuditLogEntry {
    pub fn new(task_id: impl Into<String>, event: &str, detail: serde_json::Value) -> Self {
        Self {
            task_id: task_id.into(),
            event: event.to_string(),
            detail,
        }
    }
}
