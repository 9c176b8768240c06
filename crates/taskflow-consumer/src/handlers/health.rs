//! Health check handlers

use axum::{extract::State, response::IntoResponse};
use std::sync::Arc;

use taskflow_infra::readiness_response;

use crate::state::AppState;

pub use taskflow_infra::liveness_check;

/// Readiness probe - the task store answers.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    readiness_response(state.store.ping()).await.into_response()
}
