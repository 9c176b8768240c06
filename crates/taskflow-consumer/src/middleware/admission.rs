use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use taskflow_infra::{HttpAppError, RateLimiter};

/// Token-bucket admission gate in front of `/consume`.
///
/// Runs before the body is read. A rejected request is answered with 429 and
/// never reaches validation, the store or the metrics.
pub async fn admission_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    match limiter.admit().await {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::debug!(path = %request.uri().path(), "Request rejected by admission limiter");
            HttpAppError::from(err).into_response()
        }
    }
}
