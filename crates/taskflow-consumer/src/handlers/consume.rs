use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Form,
};
use serde::Deserialize;
use std::sync::Arc;

use taskflow_core::{AppError, TaskId, TaskState, TaskType, TaskValue};
use taskflow_infra::HttpAppError;

use crate::state::AppState;

pub const TASK_PROCESSED: &str = "Task processed";

/// Raw form fields. Kept as strings so that a missing or non-integer field is
/// reported by our own validation instead of a deserializer message.
#[derive(Debug, Deserialize)]
pub struct ConsumeForm {
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    pub value: Option<String>,
}

impl ConsumeForm {
    pub fn parse(&self) -> Result<(TaskType, TaskValue), AppError> {
        let task_type = self
            .task_type
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("Missing form field 'type'".to_string()))?
            .parse::<TaskType>()?;
        let value = self
            .value
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("Missing form field 'value'".to_string()))?
            .parse::<TaskValue>()?;
        Ok((task_type, value))
    }
}

/// POST /consume
///
/// Claims the oldest received task matching `type` and `value`, simulates its
/// work and marks it done. The claim itself moves the task to `processing`.
pub async fn consume_task(
    State(state): State<Arc<AppState>>,
    form: Result<Form<ConsumeForm>, FormRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Form(form) = form?;
    let (task_type, value) = form.parse()?;

    let id = state
        .store
        .claim_one(task_type, value)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No received task with type {} and value {}",
                task_type, value
            ))
        })?;

    tracing::info!(task_id = %id, task_type = %task_type, value = %value, "Task claimed");

    // Detached so a client disconnect cannot abandon a claimed task
    let lifecycle = tokio::spawn(complete_task(state.clone(), id, task_type, value));
    match lifecycle.await {
        Ok(result) => result?,
        Err(e) => {
            return Err(AppError::Internal(format!(
                "Processing of task {} aborted: {}",
                id, e
            ))
            .into())
        }
    }

    Ok((StatusCode::OK, TASK_PROCESSED))
}

/// Everything after a successful claim: in-flight gauge, work, `done`, counters.
async fn complete_task(
    state: Arc<AppState>,
    id: TaskId,
    task_type: TaskType,
    value: TaskValue,
) -> Result<(), AppError> {
    let in_flight = state.metrics.track_processing(task_type);
    state.work.perform(task_type, value).await;

    let transition = state.store.transition(id, TaskState::Done).await;
    drop(in_flight);
    state.metrics.record_processed(task_type);

    match transition {
        Ok(0) => {
            tracing::warn!(
                task_id = %id,
                task_type = %task_type,
                "Task was no longer in processing; done transition skipped"
            );
            Ok(())
        }
        Ok(_) => {
            state.metrics.record_done(task_type, value);
            let total = state.ledger.add(task_type, value).await;
            tracing::info!(
                task_id = %id,
                task_type = %task_type,
                value = %value,
                total_value = total,
                "Total value for tasks of type {} is now {}",
                task_type,
                total
            );
            Ok(())
        }
        Err(e) => {
            tracing::warn!(
                task_id = %id,
                task_type = %task_type,
                error = %e,
                "Failed to mark task done; it remains in processing"
            );
            Err(e)
        }
    }
}
