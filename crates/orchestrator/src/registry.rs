//! Task id to record id lookup.
//!
//! An in-memory map in front of the durable task table. Entries are added
//! at dispatch; a miss reads through to the store, so a restarted process
//! still resolves tasks dispatched before the restart.

use std::collections::HashMap;

use sangeet_core::types::DbId;
use sangeet_db::models::generation::GenerationTask;
use sangeet_db::{GenerationStore, StoreError};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct TaskRegistry {
    entries: RwLock<HashMap<String, DbId>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, task_id: &str, record_id: DbId) {
        self.entries
            .write()
            .await
            .insert(task_id.to_string(), record_id);
    }

    /// Cached lookup only.
    pub async fn get(&self, task_id: &str) -> Option<DbId> {
        self.entries.read().await.get(task_id).copied()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Cached lookup, falling back to the durable task table.
    pub async fn resolve(
        &self,
        store: &dyn GenerationStore,
        task_id: &str,
    ) -> Result<Option<DbId>, StoreError> {
        if let Some(record_id) = self.get(task_id).await {
            return Ok(Some(record_id));
        }
        let Some(task) = store.find_task(task_id).await? else {
            return Ok(None);
        };
        tracing::debug!(task_id, record_id = task.record_id, "Registry miss resolved from store");
        self.insert(task_id, task.record_id).await;
        Ok(Some(task.record_id))
    }

    /// Replace the cached entries with `tasks`.
    pub async fn rebuild(&self, tasks: &[GenerationTask]) {
        let mut entries = self.entries.write().await;
        entries.clear();
        entries.extend(tasks.iter().map(|t| (t.task_id.clone(), t.record_id)));
    }
}
