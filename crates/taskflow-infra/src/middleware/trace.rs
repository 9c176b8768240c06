use axum::{
    extract::MatchedPath,
    http::{Request, Response},
};
use std::time::Duration;
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::Span;

use super::request_id::RequestId;

/// Opens one `http_request` span per request, named after the matched route.
#[derive(Clone, Default)]
pub struct CustomMakeSpan;

impl<B> MakeSpan<B> for CustomMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method().as_str();
        let uri = request.uri().path();
        let path = request
            .extensions()
            .get::<MatchedPath>()
            .map(|mp| mp.as_str())
            .unwrap_or(uri);

        let span = tracing::info_span!(
            "http_request",
            http.method = %method,
            http.route = %path,
            http.target = %uri,
            http.status_code = tracing::field::Empty,
            http.user_agent = tracing::field::Empty,
            request_id = tracing::field::Empty,
        );

        if let Some(user_agent) = request
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
        {
            span.record("http.user_agent", user_agent);
        }

        if let Some(request_id) = request.extensions().get::<RequestId>() {
            span.record("request_id", request_id.0.as_str());
        }

        span
    }
}

#[derive(Clone, Default)]
pub struct CustomOnResponse;

impl<B> OnResponse<B> for CustomOnResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status().as_u16();
        span.record("http.status_code", status);

        if response.status().is_server_error() {
            tracing::error!(
                status = status,
                latency_ms = latency.as_millis() as u64,
                "request failed"
            );
        } else if response.status().is_client_error() {
            tracing::warn!(
                status = status,
                latency_ms = latency.as_millis() as u64,
                "client error"
            );
        } else {
            tracing::debug!(
                status = status,
                latency_ms = latency.as_millis() as u64,
                "finished processing request"
            );
        }
    }
}
