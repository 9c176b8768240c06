use taskflow_core::{AppError, Task, TaskId, TaskState, TaskType, TaskValue, TypeTotals};

/// Trait for task store operations
/// This abstracts the storage implementation (PostgreSQL or in-memory)
///
/// Every method must be safe to call concurrently. `claim_one` and `transition`
/// are conditional updates: they never move a task backwards or skip a state.
#[async_trait::async_trait]
pub trait TaskStore: Send + Sync {
    /// Create a task in state `received`.
    async fn insert(&self, task_type: TaskType, value: TaskValue) -> Result<TaskId, AppError>;

    /// Current number of tasks in `state`, read from the store at call time.
    async fn count_by_state(&self, state: TaskState) -> Result<i64, AppError>;

    /// Atomically move the oldest `received` task matching `(task_type, value)`
    /// to `processing` and return its id. `None` when nothing matches.
    async fn claim_one(
        &self,
        task_type: TaskType,
        value: TaskValue,
    ) -> Result<Option<TaskId>, AppError>;

    /// Move `id` to `new_state` if it currently sits in `new_state.predecessor()`.
    /// Returns the number of affected tasks (0 or 1).
    async fn transition(&self, id: TaskId, new_state: TaskState) -> Result<u64, AppError>;

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, AppError>;

    /// Done-count and value sum per task type, over tasks in state `done`.
    async fn value_totals(&self) -> Result<Vec<TypeTotals>, AppError>;

    /// Readiness probe.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Resolve the state a transition into `new_state` must start from.
pub(crate) fn required_predecessor(new_state: TaskState) -> Result<TaskState, AppError> {
    new_state.predecessor().ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Tasks cannot transition into '{}'; it is only assigned on insert",
            new_state
        ))
    })
}
