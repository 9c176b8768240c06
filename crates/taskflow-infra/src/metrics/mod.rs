//! Prometheus metrics for the producer and the consumer
//!
//! Each service owns its registry; nothing is registered in the process-global
//! default registry. Per-type series are labelled `type` with values `0`..`9`
//! and are pre-created so a scrape shows every type from the start.

use axum::{
    http::{header, HeaderValue},
    response::IntoResponse,
};
use prometheus::{IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

use taskflow_core::{AppError, TaskType, TaskValue};

use crate::error::HttpAppError;

pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const TYPE_LABEL: &str = "type";

fn metric_error(name: &str, e: prometheus::Error) -> AppError {
    AppError::Internal(format!("Failed to set up metric {}: {}", name, e))
}

fn counter_vec(registry: &Registry, name: &str, help: &str) -> Result<IntCounterVec, AppError> {
    let counter = IntCounterVec::new(Opts::new(name, help), &[TYPE_LABEL])
        .map_err(|e| metric_error(name, e))?;
    registry
        .register(Box::new(counter.clone()))
        .map_err(|e| metric_error(name, e))?;
    Ok(counter)
}

fn gauge_vec(registry: &Registry, name: &str, help: &str) -> Result<IntGaugeVec, AppError> {
    let gauge = IntGaugeVec::new(Opts::new(name, help), &[TYPE_LABEL])
        .map_err(|e| metric_error(name, e))?;
    registry
        .register(Box::new(gauge.clone()))
        .map_err(|e| metric_error(name, e))?;
    Ok(gauge)
}

fn every_type() -> impl Iterator<Item = String> {
    (TaskType::MIN..=TaskType::MAX).map(|t| t.to_string())
}

fn counter_for(vec: &IntCounterVec, task_type: TaskType) -> Option<IntCounter> {
    let label = task_type.label();
    match vec.get_metric_with_label_values(&[label.as_str()]) {
        Ok(counter) => Some(counter),
        Err(e) => {
            tracing::error!(error = %e, task_type = %task_type, "Metric label lookup failed");
            None
        }
    }
}

fn gauge_for(vec: &IntGaugeVec, task_type: TaskType) -> Option<IntGauge> {
    let label = task_type.label();
    match vec.get_metric_with_label_values(&[label.as_str()]) {
        Ok(gauge) => Some(gauge),
        Err(e) => {
            tracing::error!(error = %e, task_type = %task_type, "Metric label lookup failed");
            None
        }
    }
}

fn render(registry: &Registry) -> Result<String, AppError> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    encoder
        .encode_to_string(&metric_families)
        .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))
}

/// Scrape response for a rendered registry.
pub fn metrics_response(
    rendered: Result<String, AppError>,
) -> Result<impl IntoResponse, HttpAppError> {
    let body = rendered?;
    Ok((
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
        )],
        body,
    ))
}

/// Producer-side metrics
#[derive(Clone)]
pub struct ProducerMetrics {
    registry: Arc<Registry>,
    tasks_produced: IntCounterVec,
    backlog: IntGauge,
    notifications_failed: IntCounter,
}

impl ProducerMetrics {
    pub fn new() -> Result<Self, AppError> {
        let registry = Registry::new();

        let tasks_produced = counter_vec(
            &registry,
            "tasks_produced_total",
            "Total number of tasks produced, by task type",
        )?;

        let backlog = IntGauge::new(
            "tasks_backlog",
            "Tasks in state received as of the last production tick",
        )
        .map_err(|e| metric_error("tasks_backlog", e))?;
        registry
            .register(Box::new(backlog.clone()))
            .map_err(|e| metric_error("tasks_backlog", e))?;

        let notifications_failed = IntCounter::new(
            "task_notifications_failed_total",
            "Consumer notifications that failed or were rejected",
        )
        .map_err(|e| metric_error("task_notifications_failed_total", e))?;
        registry
            .register(Box::new(notifications_failed.clone()))
            .map_err(|e| metric_error("task_notifications_failed_total", e))?;

        for label in every_type() {
            tasks_produced.with_label_values(&[label.as_str()]);
        }

        Ok(Self {
            registry: Arc::new(registry),
            tasks_produced,
            backlog,
            notifications_failed,
        })
    }

    pub fn record_produced(&self, task_type: TaskType) {
        if let Some(counter) = counter_for(&self.tasks_produced, task_type) {
            counter.inc();
        }
    }

    pub fn set_backlog(&self, backlog: i64) {
        self.backlog.set(backlog);
    }

    pub fn record_notification_failed(&self) {
        self.notifications_failed.inc();
    }

    pub fn produced(&self, task_type: TaskType) -> u64 {
        counter_for(&self.tasks_produced, task_type).map_or(0, |c| c.get())
    }

    pub fn backlog(&self) -> i64 {
        self.backlog.get()
    }

    pub fn notifications_failed(&self) -> u64 {
        self.notifications_failed.get()
    }

    /// Get metrics as Prometheus text format
    pub fn render(&self) -> Result<String, AppError> {
        render(&self.registry)
    }
}

/// Consumer-side metrics
#[derive(Clone)]
pub struct ConsumerMetrics {
    registry: Arc<Registry>,
    tasks_processed: IntCounterVec,
    tasks_done: IntCounterVec,
    value_per_type: IntCounterVec,
    in_processing: IntGaugeVec,
}

impl ConsumerMetrics {
    pub fn new() -> Result<Self, AppError> {
        let registry = Registry::new();

        let tasks_processed = counter_vec(
            &registry,
            "tasks_processed_total",
            "Total number of tasks whose processing completed, by task type",
        )?;
        let tasks_done = counter_vec(
            &registry,
            "tasks_done_total",
            "Total number of tasks that reached state done, by task type",
        )?;
        let value_per_type = counter_vec(
            &registry,
            "total_value_per_task_type",
            "Sum of values of completed tasks, by task type",
        )?;
        let in_processing = gauge_vec(
            &registry,
            "tasks_in_processing",
            "Tasks currently being processed by this consumer, by task type",
        )?;

        for label in every_type() {
            tasks_processed.with_label_values(&[label.as_str()]);
            tasks_done.with_label_values(&[label.as_str()]);
            value_per_type.with_label_values(&[label.as_str()]);
            in_processing.with_label_values(&[label.as_str()]);
        }

        Ok(Self {
            registry: Arc::new(registry),
            tasks_processed,
            tasks_done,
            value_per_type,
            in_processing,
        })
    }

    /// Mark a task of `task_type` as in flight until the guard is dropped.
    pub fn track_processing(&self, task_type: TaskType) -> ProcessingGuard {
        let gauge = gauge_for(&self.in_processing, task_type);
        if let Some(gauge) = &gauge {
            gauge.inc();
        }
        ProcessingGuard { gauge }
    }

    pub fn record_processed(&self, task_type: TaskType) {
        if let Some(counter) = counter_for(&self.tasks_processed, task_type) {
            counter.inc();
        }
    }

    /// Count a completed task and add its value to the per-type total.
    pub fn record_done(&self, task_type: TaskType, value: TaskValue) {
        if let Some(counter) = counter_for(&self.tasks_done, task_type) {
            counter.inc();
        }
        if let Some(counter) = counter_for(&self.value_per_type, task_type) {
            counter.inc_by(value.as_i32().max(0) as u64);
        }
    }

    pub fn processed(&self, task_type: TaskType) -> u64 {
        counter_for(&self.tasks_processed, task_type).map_or(0, |c| c.get())
    }

    pub fn done(&self, task_type: TaskType) -> u64 {
        counter_for(&self.tasks_done, task_type).map_or(0, |c| c.get())
    }

    pub fn value_total(&self, task_type: TaskType) -> u64 {
        counter_for(&self.value_per_type, task_type).map_or(0, |c| c.get())
    }

    pub fn in_processing(&self, task_type: TaskType) -> i64 {
        gauge_for(&self.in_processing, task_type).map_or(0, |g| g.get())
    }

    /// Get metrics as Prometheus text format
    pub fn render(&self) -> Result<String, AppError> {
        render(&self.registry)
    }
}

/// Decrements `tasks_in_processing` when dropped, including on early return or cancellation.
pub struct ProcessingGuard {
    gauge: Option<IntGauge>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        if let Some(gauge) = &self.gauge {
            gauge.dec();
        }
    }
}
