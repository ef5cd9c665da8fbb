#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sangeet_api::app::build_app;
use sangeet_api::config::ServerConfig;
use sangeet_api::state::AppState;
use sangeet_db::{GenerationStore, MemoryGenerationStore};
use sangeet_orchestrator::{Orchestrator, OrchestratorConfig};
use sangeet_provider::{GenerationProvider, ProviderError, StatusFetch, SubmitRequest};
use serde_json::Value;
use tower::ServiceExt;

/// Scripted provider. Submissions return queued results, then `task-N`.
/// Status paths answer from a table; unknown paths are 404.
#[derive(Default)]
pub struct FakeProvider {
    submit_results: Mutex<VecDeque<Result<String, ProviderError>>>,
    statuses: Mutex<HashMap<String, StatusFetch>>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn push_submit(&self, result: Result<String, ProviderError>) {
        self.submit_results.lock().unwrap().push_back(result);
    }

    pub fn set_status(&self, path: &str, fetch: StatusFetch) {
        self.statuses.lock().unwrap().insert(path.to_string(), fetch);
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for FakeProvider {
    async fn submit(&self, _request: &SubmitRequest) -> Result<String, ProviderError> {
        let n = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.submit_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("task-{n}")))
    }

    async fn fetch_status(&self, path: &str) -> Result<StatusFetch, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or(StatusFetch::NotFound))
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Two status candidates and a short poll budget so `/wait` tests finish
/// quickly in real time.
pub fn test_orchestrator_config() -> OrchestratorConfig {
    OrchestratorConfig {
        status_paths: vec![
            "/api/v1/generate/record-info?taskId={task_id}".into(),
            "/api/v1/generate/status/{task_id}".into(),
        ],
        poll_max_attempts: 3,
        poll_interval: Duration::from_millis(10),
        ..OrchestratorConfig::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryGenerationStore>,
    pub provider: Arc<FakeProvider>,
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the full application router over an in-memory store and a
/// scripted provider.
///
/// Uses [`build_app`], so tests exercise the same middleware stack
/// (CORS, request ID, timeout, tracing, panic recovery) as production.
pub fn build_test_app(provider: FakeProvider) -> TestApp {
    let store = Arc::new(MemoryGenerationStore::new());
    let provider = Arc::new(provider);

    let dyn_store: Arc<dyn GenerationStore> = store.clone();
    let dyn_provider: Arc<dyn GenerationProvider> = provider.clone();
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&dyn_store),
        dyn_provider,
        test_orchestrator_config(),
    ));

    let state = AppState {
        orchestrator: Arc::clone(&orchestrator),
        store: dyn_store,
        config: Arc::new(test_config()),
    };

    TestApp {
        router: build_app(state),
        store,
        provider,
        orchestrator,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &TestApp, uri: &str, body: Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: &TestApp, uri: &str, body: impl Into<String>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn post_empty(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Instrumental Yaman request body.
pub fn yaman_body() -> Value {
    serde_json::json!({
        "mode": "instrumental_only",
        "scale": "yaman",
        "cycle": "teental",
        "instruments": ["sitar", "tabla"],
        "tempo": 90,
        "mood": "calm"
    })
}
