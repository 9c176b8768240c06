//! Test helpers: build AppState and router over the in-memory store.

use axum::Router;
use axum_test::TestServer;
use std::collections::HashMap;
use std::sync::Arc;

use taskflow_consumer::{setup_routes, AppState, SleepSimulator, WorkSimulator};
use taskflow_core::{
    AppError, ConsumerConfig, Task, TaskId, TaskState, TaskType, TaskValue, TypeTotals,
};
use taskflow_db::{InMemoryTaskRepository, TaskStore};

/// Work that finishes immediately.
pub struct InstantWork;

#[async_trait::async_trait]
impl WorkSimulator for InstantWork {
    async fn perform(&self, _task_type: TaskType, _value: TaskValue) {}
}

/// How `DoneOverrideStore` answers a transition into `done`.
#[derive(Clone, Copy, Debug)]
pub enum DoneOutcome {
    /// Report that no row was affected and leave the task alone.
    NoRowAffected,
    /// Fail as if the database were unreachable.
    StoreError,
}

/// Delegates to the in-memory store but overrides every transition into `done`.
pub struct DoneOverrideStore {
    inner: Arc<InMemoryTaskRepository>,
    outcome: DoneOutcome,
}

impl DoneOverrideStore {
    pub fn new(inner: Arc<InMemoryTaskRepository>, outcome: DoneOutcome) -> Self {
        Self { inner, outcome }
    }
}

#[async_trait::async_trait]
impl TaskStore for DoneOverrideStore {
    async fn insert(&self, task_type: TaskType, value: TaskValue) -> Result<TaskId, AppError> {
        self.inner.insert(task_type, value).await
    }

    async fn count_by_state(&self, state: TaskState) -> Result<i64, AppError> {
        self.inner.count_by_state(state).await
    }

    async fn claim_one(
        &self,
        task_type: TaskType,
        value: TaskValue,
    ) -> Result<Option<TaskId>, AppError> {
        self.inner.claim_one(task_type, value).await
    }

    async fn transition(&self, id: TaskId, new_state: TaskState) -> Result<u64, AppError> {
        if new_state != TaskState::Done {
            return self.inner.transition(id, new_state).await;
        }
        match self.outcome {
            DoneOutcome::NoRowAffected => Ok(0),
            DoneOutcome::StoreError => Err(AppError::Internal("connection reset".to_string())),
        }
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, AppError> {
        self.inner.get_task(id).await
    }

    async fn value_totals(&self) -> Result<Vec<TypeTotals>, AppError> {
        self.inner.value_totals().await
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.inner.ping().await
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub store: Arc<InMemoryTaskRepository>,
}

impl TestApp {
    pub async fn seed(&self, task_type: i32, value: i32) -> TaskId {
        self.store
            .insert(
                TaskType::new(task_type).unwrap(),
                TaskValue::new(value).unwrap(),
            )
            .await
            .unwrap()
    }
}

pub fn test_config(rate: &str, burst: &str) -> ConsumerConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("CONSUMPTION_RATE", rate.to_string()),
        ("BURST_LIMIT", burst.to_string()),
    ]);
    ConsumerConfig::from_lookup(move |key| vars.get(key).cloned()).unwrap()
}

pub fn build_state(
    config: ConsumerConfig,
    work: Arc<dyn WorkSimulator>,
) -> (Arc<AppState>, Arc<InMemoryTaskRepository>) {
    let store = Arc::new(InMemoryTaskRepository::new());
    let state = Arc::new(AppState::new(config, store.clone(), work).unwrap());
    (state, store)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    setup_routes(state)
}

/// App with a generous limiter and real sleeping work.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config("1000", "1000"), Arc::new(SleepSimulator)).await
}

/// App whose store overrides the `done` transition with `outcome`.
pub async fn setup_test_app_with_done_outcome(outcome: DoneOutcome) -> TestApp {
    let store = Arc::new(InMemoryTaskRepository::new());
    let state = Arc::new(
        AppState::new(
            test_config("1000", "1000"),
            Arc::new(DoneOverrideStore::new(store.clone(), outcome)),
            Arc::new(InstantWork),
        )
        .unwrap(),
    );
    let server = TestServer::new(build_router(state.clone())).expect("Failed to build test server");
    TestApp {
        server,
        state,
        store,
    }
}

pub async fn setup_test_app_with(config: ConsumerConfig, work: Arc<dyn WorkSimulator>) -> TestApp {
    let (state, store) = build_state(config, work);
    let server = TestServer::new(build_router(state.clone())).expect("Failed to build test server");
    TestApp {
        server,
        state,
        store,
    }
}
