use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::Mutex;

use taskflow_core::{AppError, Task, TaskId, TaskState, TaskType, TaskValue, TypeTotals};

use super::store::{required_predecessor, TaskStore};

#[derive(Default)]
struct Inner {
    next_id: i64,
    tasks: BTreeMap<TaskId, Task>,
}

/// Task store held in process memory.
///
/// Every operation runs under a single lock, which gives `claim_one` and
/// `transition` the same all-or-nothing behaviour as the SQL repository.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    inner: Mutex<Inner>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.tasks.is_empty()
    }
}

#[async_trait::async_trait]
impl TaskStore for InMemoryTaskRepository {
    async fn insert(&self, task_type: TaskType, value: TaskValue) -> Result<TaskId, AppError> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = TaskId(inner.next_id);
        let now = Utc::now();

        inner.tasks.insert(
            id,
            Task {
                id,
                task_type,
                value,
                state: TaskState::Received,
                created_at: now,
                updated_at: now,
            },
        );

        Ok(id)
    }

    async fn count_by_state(&self, state: TaskState) -> Result<i64, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.tasks.values().filter(|t| t.state == state).count() as i64)
    }

    async fn claim_one(
        &self,
        task_type: TaskType,
        value: TaskValue,
    ) -> Result<Option<TaskId>, AppError> {
        let mut inner = self.inner.lock().await;

        // BTreeMap iterates in id order, so the first hit is the oldest
        let candidate = inner.tasks.values_mut().find(|t| {
            t.state == TaskState::Received && t.task_type == task_type && t.value == value
        });

        Ok(candidate.map(|task| {
            task.state = TaskState::Processing;
            task.updated_at = Utc::now();
            task.id
        }))
    }

    async fn transition(&self, id: TaskId, new_state: TaskState) -> Result<u64, AppError> {
        let from_state = required_predecessor(new_state)?;
        let mut inner = self.inner.lock().await;

        match inner.tasks.get_mut(&id) {
            Some(task) if task.state == from_state => {
                task.state = new_state;
                task.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, AppError> {
        Ok(self.inner.lock().await.tasks.get(&id).cloned())
    }

    async fn value_totals(&self) -> Result<Vec<TypeTotals>, AppError> {
        let inner = self.inner.lock().await;
        let mut totals: BTreeMap<TaskType, TypeTotals> = BTreeMap::new();

        for task in inner.tasks.values().filter(|t| t.state == TaskState::Done) {
            let entry = totals.entry(task.task_type).or_insert(TypeTotals {
                task_type: task.task_type,
                done_count: 0,
                value_total: 0,
            });
            entry.done_count += 1;
            entry.value_total += i64::from(task.value.as_i32());
        }

        Ok(totals.into_values().collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
