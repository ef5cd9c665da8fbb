use sangeet_core::error::CoreError;
use sangeet_core::types::DbId;
use sangeet_db::StoreError;
use sangeet_provider::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// No task with this id was ever dispatched (or it is not in the store).
    #[error("Unknown provider task: {0}")]
    UnknownTask(String),

    #[error("Generation record {0} not found")]
    RecordNotFound(DbId),

    #[error("Task {task_id} still open after {attempts} status checks")]
    PollTimeout { task_id: String, attempts: u32 },

    #[error("Orchestrator is shutting down")]
    ShuttingDown,
}
