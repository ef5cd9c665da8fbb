use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// Routes mounted at `/webhooks`.
///
/// The body limit is lifted: an oversized callback must still be
/// acknowledged, or the provider keeps retrying it.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/provider",
        post(webhooks::provider_callback).layer(DefaultBodyLimit::disable()),
    )
}
