//! Tests for `AppError` -> HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router is
//! involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use sangeet_api::error::AppError;
use sangeet_core::error::CoreError;
use sangeet_db::StoreError;
use sangeet_orchestrator::OrchestratorError;
use sangeet_provider::ProviderError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

fn provider(err: ProviderError) -> AppError {
    AppError::Orchestrator(OrchestratorError::Provider(err))
}

// ---------------------------------------------------------------------------
// Core and store errors
// ---------------------------------------------------------------------------

fn core(err: CoreError) -> AppError {
    AppError::Orchestrator(OrchestratorError::Core(err))
}

fn store(err: StoreError) -> AppError {
    AppError::Orchestrator(OrchestratorError::Store(err))
}

#[tokio::test]
async fn record_not_found_returns_404() {
    let err = AppError::Orchestrator(OrchestratorError::RecordNotFound(42));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "GenerationRecord with id 42 not found");
}

#[tokio::test]
async fn conflict_returns_409() {
    let (status, json) = error_to_response(core(CoreError::Conflict("still open".into()))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = core(CoreError::Validation("tempo out of range".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "tempo out of range");
}

#[tokio::test]
async fn internal_error_is_sanitized() {
    let err = core(CoreError::Internal("connection string leaked".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("bad".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "bad");
}

// ---------------------------------------------------------------------------
// Orchestrator errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_task_returns_404() {
    let err = AppError::Orchestrator(OrchestratorError::UnknownTask("abc".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "UNKNOWN_TASK");
}

#[tokio::test]
async fn poll_timeout_returns_504() {
    let err = AppError::Orchestrator(OrchestratorError::PollTimeout {
        task_id: "abc".into(),
        attempts: 60,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["code"], "POLL_TIMEOUT");
}

#[tokio::test]
async fn duplicate_task_returns_409() {
    let err = store(StoreError::DuplicateTask("abc".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let err = store(StoreError::Database(sqlx::Error::RowNotFound));

    let (status, _) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provider_errors_map_to_actionable_statuses() {
    let cases = [
        (
            provider(ProviderError::RateLimited { message: "slow".into() }),
            StatusCode::TOO_MANY_REQUESTS,
            "PROVIDER_RATE_LIMITED",
        ),
        (
            provider(ProviderError::Maintenance { message: "down".into() }),
            StatusCode::SERVICE_UNAVAILABLE,
            "PROVIDER_MAINTENANCE",
        ),
        (
            provider(ProviderError::Rejected { status: 400, body: "prompt too long".into() }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "PROVIDER_REJECTED",
        ),
        (
            provider(ProviderError::MalformedResponse("<html>".into())),
            StatusCode::BAD_GATEWAY,
            "PROVIDER_MALFORMED_RESPONSE",
        ),
        (
            provider(ProviderError::ServerError { status: 502, body: "oops".into() }),
            StatusCode::BAD_GATEWAY,
            "PROVIDER_SERVER_ERROR",
        ),
    ];

    for (err, expected_status, expected_code) in cases {
        let (status, json) = error_to_response(err).await;
        assert_eq!(status, expected_status, "{expected_code}");
        assert_eq!(json["code"], expected_code);
    }
}

#[tokio::test]
async fn provider_auth_failure_hides_details() {
    let err = provider(ProviderError::Auth {
        status: 403,
        message: "key sk-123 disabled".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "PROVIDER_AUTH_FAILED");
    assert!(!json["error"].as_str().unwrap().contains("sk-123"));
}
