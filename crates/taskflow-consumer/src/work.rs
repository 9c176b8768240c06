//! Simulated task work

use taskflow_core::{TaskType, TaskValue};

/// The work performed on a claimed task between `processing` and `done`.
#[async_trait::async_trait]
pub trait WorkSimulator: Send + Sync {
    async fn perform(&self, task_type: TaskType, value: TaskValue);
}

/// Sleeps for `value` milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepSimulator;

#[async_trait::async_trait]
impl WorkSimulator for SleepSimulator {
    async fn perform(&self, _task_type: TaskType, value: TaskValue) {
        tokio::time::sleep(value.as_duration()).await;
    }
}
