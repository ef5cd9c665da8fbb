pub mod generations;
pub mod health;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /generations                                  submit (POST)
/// /generations/tasks/{task_id}/status           current status, probing the provider
/// /generations/tasks/{task_id}/record           stored record
/// /generations/tasks/{task_id}/audit            audit trail
/// /generations/tasks/{task_id}/wait             bounded server-side poll (POST)
/// /generations/records/{id}/regenerate          new record from old parameters (POST)
///
/// /webhooks/provider                            provider callback (POST, always 200)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/generations", generations::router())
        .nest("/webhooks", webhooks::router())
}
