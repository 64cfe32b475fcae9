//! Lifecycle handlers: health, readiness and metrics.

use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;
use strum::{AsRefStr, Display};
use tracing::info;

use crate::correlation::Correlation;
use crate::metrics::{EndpointMetrics, EXPOSITION_CONTENT_TYPE};
use crate::SERVICE_NAME;

/// Counter keys. Alias routes share the key of their primary path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum Endpoint {
    /// `/health` and `/healthz`.
    #[strum(serialize = "/health")]
    Health,
    /// `/ready` and `/readyz`.
    #[strum(serialize = "/ready")]
    Ready,
    /// `/vision/capture`.
    #[strum(serialize = "/vision/capture")]
    VisionCapture,
    /// `/vision/describe`.
    #[strum(serialize = "/vision/describe")]
    VisionDescribe,
}

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Request counters.
    pub metrics: Arc<EndpointMetrics>,
}

impl AppState {
    /// Create new app state with an empty registry.
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(EndpointMetrics::new()))
    }

    /// Create app state around an existing registry.
    pub fn with_metrics(metrics: Arc<EndpointMetrics>) -> Self {
        Self { metrics }
    }

    /// Count one request for `endpoint`.
    pub fn record(&self, endpoint: Endpoint) {
        self.metrics.increment(endpoint.as_ref());
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether service is ready.
    pub ready: bool,
}

/// Health check handler - always returns 200.
pub async fn health(State(state): State<AppState>, correlation: Correlation) -> impl IntoResponse {
    state.record(Endpoint::Health);
    info!(
        service = SERVICE_NAME,
        event_id = correlation.event_id(),
        baton = correlation.baton(),
        "health"
    );

    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
    })
}

/// Readiness handler - always ready.
///
/// Readiness MUST be extended to reflect actual upstream dependency health
/// before production use.
pub async fn ready(State(state): State<AppState>, correlation: Correlation) -> impl IntoResponse {
    state.record(Endpoint::Ready);
    info!(
        service = SERVICE_NAME,
        event_id = correlation.event_id(),
        baton = correlation.baton(),
        ready = true,
        "ready"
    );

    Json(ReadyResponse { ready: true })
}

/// Prometheus text exposition of the request counters and uptime.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        state.metrics.render(),
    )
}
