//! Handlers for submitting generations and following their progress.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sangeet_core::generation::GenerationParams;
use sangeet_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// POST /api/v1/generations
///
/// Validate, store and submit a generation. Returns 201 with the provider
/// task id and the record id once both are stored. Unparseable bodies are
/// answered with 400.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<GenerationParams>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(params) = payload?;
    let dispatched = state.orchestrator.submit_generation(&params).await?;

    tracing::info!(
        task_id = %dispatched.task_id,
        record_id = dispatched.record_id,
        "Generation submitted",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: dispatched })))
}

/// POST /api/v1/generations/records/{id}/regenerate
///
/// Submit a new generation using the parameters of record `id`.
pub async fn regenerate(
    State(state): State<AppState>,
    id: Result<Path<DbId>, PathRejection>,
) -> AppResult<impl IntoResponse> {
    let Path(id) = id?;
    let dispatched = state.orchestrator.regenerate(id).await?;

    tracing::info!(
        task_id = %dispatched.task_id,
        record_id = dispatched.record_id,
        regenerated_from = id,
        "Generation regenerated",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: dispatched })))
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// GET /api/v1/generations/tasks/{task_id}/status
pub async fn get_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = state.orchestrator.get_generation_status(&task_id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/generations/tasks/{task_id}/wait
///
/// Poll until the generation finishes or the poll budget runs out (504).
pub async fn wait(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = state.orchestrator.wait_for_completion(&task_id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// GET /api/v1/generations/tasks/{task_id}/record
pub async fn get_record(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let record = state.orchestrator.get_record_by_task(&task_id).await?;
    Ok(Json(DataResponse { data: record }))
}

/// GET /api/v1/generations/tasks/{task_id}/audit
pub async fn list_audit(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let entries = state.orchestrator.list_audit(&task_id).await?;
    Ok(Json(DataResponse { data: entries }))
}
