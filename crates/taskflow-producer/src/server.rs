//! Metrics and health endpoints of the producer process

use axum::{extract::State, middleware::from_fn, response::IntoResponse, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use taskflow_db::TaskStore;
use taskflow_infra::{
    liveness_check, metrics_response, readiness_response, request_id_middleware, CustomMakeSpan,
    CustomOnResponse, HttpAppError, ProducerMetrics,
};

pub struct ProducerState {
    pub store: Arc<dyn TaskStore>,
    pub metrics: ProducerMetrics,
}

pub fn setup_routes(state: Arc<ProducerState>, metrics_endpoint: &str) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(CustomMakeSpan)
        .on_response(CustomOnResponse);

    Router::new()
        .route(metrics_endpoint, get(metrics_handler))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
        .with_state(state)
        .layer(trace_layer)
        .layer(from_fn(request_id_middleware))
}

async fn metrics_handler(
    State(state): State<Arc<ProducerState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    metrics_response(state.metrics.render())
}

async fn readiness_check(State(state): State<Arc<ProducerState>>) -> impl IntoResponse {
    readiness_response(state.store.ping()).await.into_response()
}
