pub mod consume;
pub mod health;
pub mod metrics;
pub mod stats;

pub use consume::{consume_task, ConsumeForm, TASK_PROCESSED};
pub use health::{liveness_check, readiness_check};
pub use metrics::metrics_handler;
pub use stats::{stats_handler, StatsResponse};
