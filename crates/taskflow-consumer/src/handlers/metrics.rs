use axum::{extract::State, response::IntoResponse};
use std::sync::Arc;

use taskflow_infra::{metrics_response, HttpAppError};

use crate::state::AppState;

/// Prometheus scrape endpoint
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    metrics_response(state.metrics.render())
}
