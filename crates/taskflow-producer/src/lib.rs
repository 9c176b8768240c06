//! Taskflow producer
//!
//! Creates tasks while the received backlog is under its bound, at a fixed
//! rate, and notifies the consumer of each one.

pub mod notifier;
pub mod producer;
pub mod server;

pub use notifier::{HttpNotifier, TaskNotifier};
pub use producer::{Producer, TickOutcome};
pub use server::{setup_routes, ProducerState};
