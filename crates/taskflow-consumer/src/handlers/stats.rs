use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use taskflow_core::{TaskState, TypeTotals};
use taskflow_infra::HttpAppError;

use crate::state::AppState;

/// Store-derived view of the queue: counts per state and per-type totals of done tasks.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub received: i64,
    pub processing: i64,
    pub done: i64,
    pub totals: Vec<TypeTotals>,
}

/// GET /stats
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, HttpAppError> {
    let store = &state.store;

    Ok(Json(StatsResponse {
        received: store.count_by_state(TaskState::Received).await?,
        processing: store.count_by_state(TaskState::Processing).await?,
        done: store.count_by_state(TaskState::Done).await?,
        totals: store.value_totals().await?,
    }))
}
