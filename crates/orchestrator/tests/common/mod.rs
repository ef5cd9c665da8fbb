#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sangeet_core::generation::{GenerationMode, GenerationParams};
use sangeet_db::{GenerationStore, MemoryGenerationStore};
use sangeet_orchestrator::{Orchestrator, OrchestratorConfig};
use sangeet_provider::{GenerationProvider, ProviderError, StatusFetch, SubmitRequest};

/// Scripted provider. Submissions return queued results, then `task-N`.
/// Status paths answer from a table; unknown paths are 404.
#[derive(Default)]
pub struct FakeProvider {
    submit_results: Mutex<VecDeque<Result<String, ProviderError>>>,
    statuses: Mutex<HashMap<String, StatusFetch>>,
    status_error: Mutex<Option<u16>>,
    submitted: Mutex<Vec<SubmitRequest>>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning_task(self, task_id: &str) -> Self {
        self.push_submit(Ok(task_id.to_string()));
        self
    }

    pub fn push_submit(&self, result: Result<String, ProviderError>) {
        self.submit_results.lock().unwrap().push_back(result);
    }

    pub fn set_status(&self, path: &str, fetch: StatusFetch) {
        self.statuses.lock().unwrap().insert(path.to_string(), fetch);
    }

    /// Make every status fetch fail with this HTTP status.
    pub fn fail_status_with(&self, status: u16) {
        *self.status_error.lock().unwrap() = Some(status);
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn last_submitted(&self) -> Option<SubmitRequest> {
        self.submitted.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerationProvider for FakeProvider {
    async fn submit(&self, request: &SubmitRequest) -> Result<String, ProviderError> {
        let n = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.submitted.lock().unwrap().push(request.clone());
        self.submit_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("task-{n}")))
    }

    async fn fetch_status(&self, path: &str) -> Result<StatusFetch, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = *self.status_error.lock().unwrap() {
            return Err(ProviderError::ServerError {
                status,
                body: "status backend down".into(),
            });
        }
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or(StatusFetch::NotFound))
    }
}

pub struct Harness {
    pub store: Arc<MemoryGenerationStore>,
    pub provider: Arc<FakeProvider>,
    pub orchestrator: Orchestrator,
}

pub fn test_config() -> OrchestratorConfig {
    OrchestratorConfig {
        status_paths: vec![
            "/api/v1/generate/record-info?taskId={task_id}".into(),
            "/api/v1/generate/status/{task_id}".into(),
            "/api/v1/tasks/{task_id}".into(),
        ],
        poll_max_attempts: 60,
        poll_interval: Duration::from_secs(5),
        ..OrchestratorConfig::default()
    }
}

pub fn harness(provider: FakeProvider) -> Harness {
    harness_with(Arc::new(MemoryGenerationStore::new()), provider)
}

/// Build an orchestrator over an existing store (simulates a restart).
pub fn harness_with(store: Arc<MemoryGenerationStore>, provider: FakeProvider) -> Harness {
    let provider = Arc::new(provider);
    let dyn_store: Arc<dyn GenerationStore> = store.clone();
    let dyn_provider: Arc<dyn GenerationProvider> = provider.clone();
    let orchestrator = Orchestrator::new(dyn_store, dyn_provider, test_config());
    Harness {
        store,
        provider,
        orchestrator,
    }
}

/// Instrumental Yaman in Teental with sitar and tabla.
pub fn yaman_params() -> GenerationParams {
    GenerationParams {
        mode: GenerationMode::InstrumentalOnly,
        scale: "yaman".into(),
        cycle: "teental".into(),
        instruments: vec!["sitar".into(), "tabla".into()],
        tempo: 90,
        mood: "calm".into(),
        prompt: None,
        voice: None,
        language: None,
    }
}
