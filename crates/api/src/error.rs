use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sangeet_core::error::CoreError;
use sangeet_db::StoreError;
use sangeet_orchestrator::OrchestratorError;
use sangeet_provider::ProviderError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`OrchestratorError`] and adds request-shape failures caught by
/// axum extractors. Implements [`IntoResponse`] to produce consistent JSON
/// error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An error from the orchestrator (validation, provider, store, task lookup).
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    /// A request body or path the extractors could not parse.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type Mapped = (StatusCode, &'static str, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Orchestrator(err) => classify_orchestrator_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> Mapped {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(err: &CoreError) -> Mapped {
    match err {
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

fn classify_orchestrator_error(err: &OrchestratorError) -> Mapped {
    match err {
        OrchestratorError::Core(core) => classify_core_error(core),
        OrchestratorError::Provider(provider) => classify_provider_error(provider),
        OrchestratorError::Store(store) => classify_store_error(store),
        OrchestratorError::UnknownTask(task_id) => (
            StatusCode::NOT_FOUND,
            "UNKNOWN_TASK",
            format!("No generation task {task_id}"),
        ),
        OrchestratorError::RecordNotFound(id) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("GenerationRecord with id {id} not found"),
        ),
        OrchestratorError::PollTimeout { .. } => {
            (StatusCode::GATEWAY_TIMEOUT, "POLL_TIMEOUT", err.to_string())
        }
        OrchestratorError::ShuttingDown => (
            StatusCode::SERVICE_UNAVAILABLE,
            "SHUTTING_DOWN",
            err.to_string(),
        ),
    }
}

/// Map a provider error to a status the client can act on.
///
/// Rate limits and maintenance are retryable (429, 503). Credential and
/// response-shape problems are ours to fix (502) and their details stay in
/// the logs.
fn classify_provider_error(err: &ProviderError) -> Mapped {
    match err {
        ProviderError::RateLimited { .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            "PROVIDER_RATE_LIMITED",
            err.to_string(),
        ),
        ProviderError::Maintenance { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "PROVIDER_MAINTENANCE",
            err.to_string(),
        ),
        ProviderError::Rejected { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "PROVIDER_REJECTED",
            err.to_string(),
        ),
        ProviderError::Auth { .. } => {
            tracing::error!(error = %err, "Provider authentication failed");
            (
                StatusCode::BAD_GATEWAY,
                "PROVIDER_AUTH_FAILED",
                "The generation provider rejected our credentials".to_string(),
            )
        }
        ProviderError::MalformedResponse(_) => {
            tracing::error!(error = %err, "Malformed provider response");
            (
                StatusCode::BAD_GATEWAY,
                "PROVIDER_MALFORMED_RESPONSE",
                "The generation provider returned an unusable response".to_string(),
            )
        }
        ProviderError::ServerError { .. } => (
            StatusCode::BAD_GATEWAY,
            "PROVIDER_SERVER_ERROR",
            "The generation provider failed".to_string(),
        ),
        ProviderError::Transport(_) => {
            tracing::error!(error = %err, "Provider unreachable");
            (
                StatusCode::BAD_GATEWAY,
                "PROVIDER_UNREACHABLE",
                "The generation provider is unreachable".to_string(),
            )
        }
    }
}

fn classify_store_error(err: &StoreError) -> Mapped {
    match err {
        StoreError::Database(db) => classify_sqlx_error(db),
        StoreError::DuplicateTask(task_id) => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Task {task_id} is already registered"),
        ),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Mapped {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
