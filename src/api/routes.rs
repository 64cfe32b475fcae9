//! HTTP API route definitions.

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::{health, metrics, ready, AppState};
use super::vision::{capture, describe};
use crate::correlation::Correlation;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready))
        .route("/readyz", get(ready))
        .route("/metrics", get(metrics))
        // Vision endpoints
        .route("/vision/capture", post(capture))
        .route("/vision/describe", post(describe))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Per-request span; the event id is read the same way handlers read it.
fn request_span(request: &Request<Body>) -> Span {
    let correlation = Correlation::from_headers(request.headers());
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        event_id = correlation.event_id()
    )
}
