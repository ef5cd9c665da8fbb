//! Route definitions for the `/generations` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::generations;
use crate::state::AppState;

/// Routes mounted at `/generations`.
///
/// ```text
/// POST   /                              -> create
/// GET    /tasks/{task_id}/status        -> get_status
/// GET    /tasks/{task_id}/record        -> get_record
/// GET    /tasks/{task_id}/audit         -> list_audit
/// POST   /tasks/{task_id}/wait          -> wait
/// POST   /records/{id}/regenerate       -> regenerate
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(generations::create))
        .route("/tasks/{task_id}/status", get(generations::get_status))
        .route("/tasks/{task_id}/record", get(generations::get_record))
        .route("/tasks/{task_id}/audit", get(generations::list_audit))
        .route("/tasks/{task_id}/wait", post(generations::wait))
        .route("/records/{id}/regenerate", post(generations::regenerate))
}
