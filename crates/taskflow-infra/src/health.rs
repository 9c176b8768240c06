//! Liveness and readiness responses shared by both services

use axum::{http::StatusCode, response::IntoResponse, Json};
use std::future::Future;
use std::time::Duration;

use taskflow_core::AppError;

const READINESS_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe over a store ping. 503 when the ping fails or takes
/// longer than five seconds.
pub async fn readiness_response<F>(ping: F) -> impl IntoResponse
where
    F: Future<Output = Result<(), AppError>>,
{
    match tokio::time::timeout(READINESS_TIMEOUT, ping).await {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready", "database": "ready" })),
        ),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "not_ready", "database": "not_ready" })),
            )
        }
        Err(_) => {
            tracing::error!("Database readiness check timed out");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "not_ready", "database": "timeout" })),
            )
        }
    }
}
