//! Taskflow Database Layer
//!
//! This crate provides the task store: the `TaskStore` trait, its PostgreSQL
//! implementation and an in-memory implementation with identical semantics.
//
// Module declarations
pub mod db;

// Re-exports: store trait and implementations
pub use db::{run_migrations, setup_database, InMemoryTaskRepository, PostgresTaskRepository, TaskStore};
