//! The [`Orchestrator`] facade.
//!
//! Owns the registry, the endpoint availability cache, and the reconciler
//! as explicit per-instance state. Operations are split across
//! [`crate::dispatcher`], [`crate::webhook`] and [`crate::poller`].

use std::sync::Arc;

use sangeet_db::models::audit::AuditLogEntry;
use sangeet_db::models::generation::GenerationRecord;
use sangeet_db::GenerationStore;
use sangeet_provider::{EndpointAvailabilityCache, GenerationProvider, StatusProber};
use tokio_util::sync::CancellationToken;

use crate::audit::Auditor;
use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::reconciler::Reconciler;
use crate::registry::TaskRegistry;

/// Created once at startup; share it behind an `Arc`.
pub struct Orchestrator {
    pub(crate) store: Arc<dyn GenerationStore>,
    pub(crate) provider: Arc<dyn GenerationProvider>,
    pub(crate) registry: TaskRegistry,
    pub(crate) reconciler: Reconciler,
    pub(crate) auditor: Auditor,
    pub(crate) prober: StatusProber,
    pub(crate) config: OrchestratorConfig,
    /// Cancelled at shutdown to end in-flight poll loops.
    pub(crate) shutdown: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn GenerationStore>,
        provider: Arc<dyn GenerationProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        let auditor = Auditor::new(Arc::clone(&store));
        let cache = Arc::new(EndpointAvailabilityCache::new(config.status_probe_ttl));
        let prober = StatusProber::new(
            config.status_paths.clone(),
            cache,
            config.probe_log_interval,
        );
        Self {
            reconciler: Reconciler::new(Arc::clone(&store), auditor.clone()),
            registry: TaskRegistry::new(),
            store,
            provider,
            auditor,
            prober,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn availability(&self) -> &EndpointAvailabilityCache {
        self.prober.cache()
    }

    /// Load every open task from the store into the registry.
    ///
    /// Returns the number of tasks loaded.
    pub async fn rebuild_registry(&self) -> Result<usize, OrchestratorError> {
        let open = self.store.list_open_tasks().await?;
        self.registry.rebuild(&open).await;
        tracing::info!(open_tasks = open.len(), "Task registry rebuilt");
        Ok(open.len())
    }

    /// The record behind a provider task, as stored.
    pub async fn get_record_by_task(
        &self,
        task_id: &str,
    ) -> Result<GenerationRecord, OrchestratorError> {
        let record_id = self
            .registry
            .resolve(self.store.as_ref(), task_id)
            .await?
            .ok_or_else(|| OrchestratorError::UnknownTask(task_id.to_string()))?;
        self.store
            .find_record(record_id)
            .await?
            .ok_or(OrchestratorError::RecordNotFound(record_id))
    }

    /// Audit trail of a provider task, oldest first.
    pub async fn list_audit(&self, task_id: &str) -> Result<Vec<AuditLogEntry>, OrchestratorError> {
        if self.store.find_task(task_id).await?.is_none() {
            return Err(OrchestratorError::UnknownTask(task_id.to_string()));
        }
        Ok(self.auditor.list(task_id).await?)
    }

    /// End in-flight poll loops.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
