//! Per-type running value totals

use std::collections::BTreeMap;
use tokio::sync::Mutex;

use taskflow_core::{TaskType, TaskValue};

/// Running sum of completed task values, per task type.
///
/// Owned by the consumer state; `add` is the only mutation path.
#[derive(Debug, Default)]
pub struct ValueLedger {
    totals: Mutex<BTreeMap<TaskType, i64>>,
}

impl ValueLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the total for `task_type` and return the new total.
    pub async fn add(&self, task_type: TaskType, value: TaskValue) -> i64 {
        let mut totals = self.totals.lock().await;
        let total = totals.entry(task_type).or_insert(0);
        *total += i64::from(value.as_i32());
        *total
    }

    pub async fn total(&self, task_type: TaskType) -> i64 {
        self.totals
            .lock()
            .await
            .get(&task_type)
            .copied()
            .unwrap_or(0)
    }

    pub async fn snapshot(&self) -> BTreeMap<TaskType, i64> {
        self.totals.lock().await.clone()
    }
}
