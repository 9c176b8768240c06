//! Producer loop
//!
//! One `tick` checks the backlog, creates at most one task and notifies the
//! consumer. `run` drives ticks from a timer at the configured production rate
//! until it is told to stop.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use taskflow_core::{AppError, ProducerConfig, TaskId, TaskState, TaskType, TaskValue};
use taskflow_db::TaskStore;
use taskflow_infra::ProducerMetrics;

use crate::notifier::TaskNotifier;

/// What a single production tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The backlog was at or above its bound; nothing was created.
    BacklogFull { backlog: i64 },
    Produced {
        id: TaskId,
        task_type: TaskType,
        value: TaskValue,
        /// Whether the consumer acknowledged the notification.
        notified: bool,
    },
    /// The store could not be read or written; retried on the next tick.
    Failed,
}

pub struct Producer {
    store: Arc<dyn TaskStore>,
    notifier: Arc<dyn TaskNotifier>,
    metrics: ProducerMetrics,
    max_backlog: i64,
    tick_interval: Duration,
    rng: StdRng,
}

impl Producer {
    pub fn new(
        config: &ProducerConfig,
        store: Arc<dyn TaskStore>,
        notifier: Arc<dyn TaskNotifier>,
        metrics: ProducerMetrics,
    ) -> Self {
        Self {
            store,
            notifier,
            metrics,
            max_backlog: config.max_backlog,
            tick_interval: config.tick_interval(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replace the random source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    fn draw(&mut self) -> Result<(TaskType, TaskValue), AppError> {
        let task_type = TaskType::new(self.rng.random_range(TaskType::MIN..=TaskType::MAX))?;
        let value = TaskValue::new(self.rng.random_range(TaskValue::MIN..=TaskValue::MAX))?;
        Ok((task_type, value))
    }

    /// Run one production step.
    pub async fn tick(&mut self) -> TickOutcome {
        let backlog = match self.store.count_by_state(TaskState::Received).await {
            Ok(backlog) => backlog,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read backlog, skipping tick");
                return TickOutcome::Failed;
            }
        };
        self.metrics.set_backlog(backlog);

        if backlog >= self.max_backlog {
            tracing::debug!(
                backlog,
                max_backlog = self.max_backlog,
                "Backlog full, not producing"
            );
            return TickOutcome::BacklogFull { backlog };
        }

        let (task_type, value) = match self.draw() {
            Ok(drawn) => drawn,
            Err(e) => {
                tracing::error!(error = %e, "Drew an invalid task, skipping tick");
                return TickOutcome::Failed;
            }
        };

        let id = match self.store.insert(task_type, value).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    task_type = %task_type,
                    value = %value,
                    "Failed to insert task, skipping tick"
                );
                return TickOutcome::Failed;
            }
        };
        self.metrics.record_produced(task_type);
        self.metrics.set_backlog(backlog + 1);

        tracing::info!(
            task_id = %id,
            task_type = %task_type,
            value = %value,
            backlog = backlog + 1,
            "Task produced"
        );

        let notified = match self.notifier.notify(task_type, value).await {
            Ok(()) => true,
            Err(e) => {
                self.metrics.record_notification_failed();
                tracing::warn!(
                    task_id = %id,
                    error = %e,
                    "Consumer notification failed; task stays queued"
                );
                false
            }
        };

        TickOutcome::Produced {
            id,
            task_type,
            value,
            notified,
        }
    }

    /// Tick at the production rate until `shutdown_rx` yields or its sender is dropped.
    ///
    /// Ticks that fall behind (slow store or consumer) are delayed, never bursted.
    pub async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>) {
        tracing::info!(
            max_backlog = self.max_backlog,
            tick_interval_ms = self.tick_interval.as_millis() as u64,
            "Producer started"
        );

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Producer shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        tracing::info!("Producer stopped");
    }
}
