use std::sync::Arc;

use sangeet_db::GenerationStore;
use sangeet_orchestrator::Orchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Same store the orchestrator writes to; used for health checks.
    pub store: Arc<dyn GenerationStore>,
    pub config: Arc<ServerConfig>,
}
