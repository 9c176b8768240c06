//! Taskflow Core Library
//!
//! Domain model, error types and configuration shared by the producer, the
//! consumer and the task store.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, ConsumerConfig, LogFormat, ProducerConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Task, TaskId, TaskState, TaskType, TaskValue, TypeTotals};
