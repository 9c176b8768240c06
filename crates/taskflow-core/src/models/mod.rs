pub mod task;

pub use task::{Task, TaskId, TaskState, TaskType, TaskValue, TypeTotals};
