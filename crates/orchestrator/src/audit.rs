//! Best-effort audit writes for reconciliation events.
//!
//! The dispatch entry is written in the same transaction as the task row
//! (see [`GenerationStore::register_dispatch`]). Every later entry goes
//! through [`Auditor`], which logs write failures instead of returning them.

use std::sync::Arc;

use sangeet_db::models::audit::{AuditLogEntry, NewAuditLogEntry};
use sangeet_db::{GenerationStore, StoreError};
use serde_json::Value;

#[derive(Clone)]
pub struct Auditor {
    store: Arc<dyn GenerationStore>,
}

impl Auditor {
    pub fn new(store: Arc<dyn GenerationStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, task_id: &str, event: &str, detail: Value) {
        let entry = NewAuditLogEntry::new(task_id, event, detail);
        if let Err(e) = self.store.append_audit(&entry).await {
            tracing::error!(task_id, event, error = %e, "Failed to write audit entry");
        }
    }

    pub async fn list(&self, task_id: &str) -> Result<Vec<AuditLogEntry>, StoreError> {
        self.store.list_audit(task_id).await
    }
}
