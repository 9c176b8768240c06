//! Route configuration and setup.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use taskflow_infra::{request_id_middleware, CustomMakeSpan, CustomOnResponse};

use crate::handlers::{
    consume_task, liveness_check, metrics_handler, readiness_check, stats_handler,
};
use crate::middleware::admission_middleware;
use crate::state::AppState;

/// Build the consumer router. Only `/consume` sits behind the admission limiter.
pub fn setup_routes(state: Arc<AppState>) -> Router {
    let consume_routes = Router::new()
        .route("/consume", post(consume_task))
        .route_layer(from_fn_with_state(
            state.limiter.clone(),
            admission_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(CustomMakeSpan)
        .on_response(CustomOnResponse);

    Router::new()
        .merge(consume_routes)
        .route(state.config.base.metrics_endpoint.as_str(), get(metrics_handler))
        .route("/stats", get(stats_handler))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
        .with_state(state)
        .layer(trace_layer)
        .layer(from_fn(request_id_middleware))
}
