//! Process-local [`GenerationStore`] for tests and database-less runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use sangeet_core::audit::events;
use sangeet_core::types::DbId;

use super::{AuditLogSink, GenerationStore, StoreError};
use crate::models::audit::{AuditLogEntry, NewAuditLogEntry};
use crate::models::generation::{
    ArtifactUpdate, GenerationRecord, GenerationTask, NewGenerationRecord,
};
use crate::models::status::GenerationStatus;

/// In-memory store. All state sits behind one mutex, so each operation is
/// atomic with respect to the others, matching the transactional
/// guarantees of the Postgres store.
#[derive(Default)]
pub struct MemoryGenerationStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    records: BTreeMap<DbId, GenerationRecord>,
    tasks: HashMap<String, GenerationTask>,
    audit: Vec<AuditLogEntry>,
    next_record_id: DbId,
    next_task_id: DbId,
    next_audit_id: DbId,
}

impl MemoryState {
    fn next_id(counter: &mut DbId) -> DbId {
        *counter += 1;
        *counter
    }

    fn push_audit(&mut self, entry: &NewAuditLogEntry) -> AuditLogEntry {
        let row = AuditLogEntry {
            id: Self::next_id(&mut self.next_audit_id),
            task_id: entry.task_id.clone(),
            event: entry.event.clone(),
            detail: entry.detail.clone(),
            logged_at: Utc::now(),
        };
        self.audit.push(row.clone());
        row
    }

    fn sync_task_status(&mut self, record_id: DbId, status: GenerationStatus) {
        let now = Utc::now();
        for task in self.tasks.values_mut().filter(|t| t.record_id == record_id) {
            task.status_id = status.id();
            task.updated_at = now;
        }
    }

    /// Apply `next` to an open record, mirroring the guarded SQL updates.
    fn transition(
        &mut self,
        record_id: DbId,
        next: GenerationStatus,
        apply: impl FnOnce(&mut GenerationRecord),
    ) -> Option<GenerationRecord> {
        let record = self.records.get_mut(&record_id)?;
        if !record.status().can_transition_to(next) {
            return None;
        }
        let now = Utc::now();
        apply(record);
        record.status_id = next.id();
        record.updated_at = now;
        if next.is_terminal() {
            record.completed_at = Some(now);
        }
        let updated = record.clone();
        self.sync_task_status(record_id, next);
        Some(updated)
    }
}

impl MemoryGenerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock cannot leave a half-applied
        // transition behind, so a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AuditLogSink for MemoryGenerationStore {
    async fn append_audit(&self, entry: &NewAuditLogEntry) -> Result<AuditLogEntry, StoreError> {
        Ok(self.lock().push_audit(entry))
    }

    async fn list_audit(&self, task_id: &str) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(self
            .lock()
            .audit
            .iter()
            .filter(|e| e.task_id == task_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GenerationStore for MemoryGenerationStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_record(
        &self,
        input: &NewGenerationRecord,
    ) -> Result<GenerationRecord, StoreError> {
        let mut state = self.lock();
        let now = Utc::now();
        let record = GenerationRecord {
            id: MemoryState::next_id(&mut state.next_record_id),
            parameters: input.parameters.clone(),
            prompt: input.prompt.clone(),
            artifact_url: None,
            artifact_urls: Vec::new(),
            title: None,
            status_id: GenerationStatus::Pending.id(),
            error_message: None,
            regenerated_from: input.regenerated_from,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_record(&self, id: DbId) -> Result<Option<GenerationRecord>, StoreError> {
        Ok(self.lock().records.get(&id).cloned())
    }

    async fn register_dispatch(
        &self,
        record_id: DbId,
        task_id: &str,
        detail: &serde_json::Value,
    ) -> Result<GenerationTask, StoreError> {
        let mut state = self.lock();
        if state.tasks.contains_key(task_id) {
            return Err(StoreError::DuplicateTask(task_id.to_string()));
        }
        let now = Utc::now();
        let task = GenerationTask {
            id: MemoryState::next_id(&mut state.next_task_id),
            task_id: task_id.to_string(),
            record_id,
            status_id: GenerationStatus::Pending.id(),
            submitted_at: now,
            updated_at: now,
        };
        state.tasks.insert(task.task_id.clone(), task.clone());

        let mut detail = detail.clone();
        if let Some(obj) = detail.as_object_mut() {
            obj.insert("record_id".into(), record_id.into());
            obj.insert("status".into(), GenerationStatus::Pending.as_str().into());
        }
        state.push_audit(&NewAuditLogEntry::new(task_id, events::DISPATCHED, detail));
        Ok(task)
    }

    async fn find_task(&self, task_id: &str) -> Result<Option<GenerationTask>, StoreError> {
        Ok(self.lock().tasks.get(task_id).cloned())
    }

    async fn list_open_tasks(&self) -> Result<Vec<GenerationTask>, StoreError> {
        let mut open: Vec<_> = self
            .lock()
            .tasks
            .values()
            .filter(|t| !t.status().is_terminal())
            .cloned()
            .collect();
        open.sort_by_key(|t| t.id);
        Ok(open)
    }

    async fn mark_processing(&self, record_id: DbId) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .transition(record_id, GenerationStatus::Processing, |_| {})
            .is_some())
    }

    async fn attach_artifact(
        &self,
        record_id: DbId,
        update: &ArtifactUpdate,
    ) -> Result<Option<GenerationRecord>, StoreError> {
        if update.primary_url.is_empty() {
            return Ok(None);
        }
        let mut state = self.lock();
        if state
            .records
            .get(&record_id)
            .is_some_and(|r| r.artifact_url.is_some())
        {
            return Ok(None);
        }
        Ok(state.transition(record_id, GenerationStatus::Complete, |record| {
            record.artifact_url = Some(update.primary_url.clone());
            record.artifact_urls = update.all_urls.clone();
            if record.title.is_none() {
                record.title = update.title.clone();
            }
        }))
    }

    async fn mark_failed(&self, record_id: DbId, reason: &str) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .transition(record_id, GenerationStatus::Failed, |record| {
                record.error_message = Some(reason.to_string());
            })
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    async fn seeded() -> (MemoryGenerationStore, DbId) {
        let store = MemoryGenerationStore::new();
        let record = store
            .create_record(&NewGenerationRecord {
                parameters: json!({"scale": "yaman"}),
                prompt: "Calm raga".into(),
                regenerated_from: None,
            })
            .await
            .unwrap();
        store
            .register_dispatch(record.id, "abc123", &json!({}))
            .await
            .unwrap();
        (store, record.id)
    }

    fn artifact(url: &str) -> ArtifactUpdate {
        ArtifactUpdate {
            primary_url: url.into(),
            all_urls: vec![url.into()],
            title: Some("Yaman".into()),
        }
    }

    #[tokio::test]
    async fn register_dispatch_writes_pending_audit_entry() {
        let (store, record_id) = seeded().await;
        let audit = store.list_audit("abc123").await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].event, events::DISPATCHED);
        assert_eq!(audit[0].detail["status"], "pending");
        assert_eq!(audit[0].detail["record_id"], record_id);
    }

    #[tokio::test]
    async fn duplicate_task_id_is_rejected() {
        let (store, record_id) = seeded().await;
        let err = store
            .register_dispatch(record_id, "abc123", &json!({}))
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::DuplicateTask(id) if id == "abc123");
    }

    #[tokio::test]
    async fn artifact_is_attached_exactly_once() {
        let (store, record_id) = seeded().await;

        let first = store
            .attach_artifact(record_id, &artifact("https://x/a.mp3"))
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .attach_artifact(record_id, &artifact("https://x/b.mp3"))
            .await
            .unwrap();
        assert!(second.is_none());

        let record = store.find_record(record_id).await.unwrap().unwrap();
        assert_eq!(record.artifact_url.as_deref(), Some("https://x/a.mp3"));
        assert_eq!(record.status(), GenerationStatus::Complete);

        let task = store.find_task("abc123").await.unwrap().unwrap();
        assert_eq!(task.status(), GenerationStatus::Complete);
    }

    #[tokio::test]
    async fn empty_artifact_url_is_never_written() {
        let (store, record_id) = seeded().await;
        let written = store.attach_artifact(record_id, &artifact("")).await.unwrap();
        assert!(written.is_none());
        let record = store.find_record(record_id).await.unwrap().unwrap();
        assert_eq!(record.status(), GenerationStatus::Pending);
        assert!(!record.has_artifact());
    }

    #[tokio::test]
    async fn failed_record_cannot_complete_later() {
        let (store, record_id) = seeded().await;
        assert!(store.mark_failed(record_id, "provider error").await.unwrap());
        assert!(!store.mark_failed(record_id, "again").await.unwrap());

        let written = store
            .attach_artifact(record_id, &artifact("https://x/a.mp3"))
            .await
            .unwrap();
        assert!(written.is_none());

        let record = store.find_record(record_id).await.unwrap().unwrap();
        assert_eq!(record.status(), GenerationStatus::Failed);
        assert_eq!(record.error_message.as_deref(), Some("provider error"));
    }

    #[tokio::test]
    async fn processing_is_only_entered_from_pending() {
        let (store, record_id) = seeded().await;
        assert!(store.mark_processing(record_id).await.unwrap());
        assert!(!store.mark_processing(record_id).await.unwrap());

        store
            .attach_artifact(record_id, &artifact("https://x/a.mp3"))
            .await
            .unwrap();
        assert!(!store.mark_processing(record_id).await.unwrap());
    }

    #[tokio::test]
    async fn open_tasks_exclude_terminal_ones() {
        let (store, record_id) = seeded().await;
        assert_eq!(store.list_open_tasks().await.unwrap().len(), 1);
        store.mark_failed(record_id, "boom").await.unwrap();
        assert!(store.list_open_tasks().await.unwrap().is_empty());
    }
}
