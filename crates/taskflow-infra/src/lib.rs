//! Taskflow Infrastructure Library
//!
//! Shared infrastructure used by the producer and the consumer:
//! - Telemetry initialization
//! - Prometheus metrics
//! - Admission rate limiting
//! - Request ID and tracing middleware
//! - Error response body, health probes and server lifecycle

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub mod error;
pub mod health;
pub mod server;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{
    get_request_id, request_id_middleware, CustomMakeSpan, CustomOnResponse, RequestId,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "metrics")]
pub use metrics::{
    metrics_response, ConsumerMetrics, ProcessingGuard, ProducerMetrics, PROMETHEUS_CONTENT_TYPE,
};

#[cfg(feature = "rate-limit")]
pub use rate_limit::RateLimiter;

pub use error::{ErrorResponse, HttpAppError};
pub use health::{liveness_check, readiness_response};
pub use server::{shutdown_signal, start_server};
