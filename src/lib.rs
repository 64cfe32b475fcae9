//! Vision I/O service shell for the Unison orchestration mesh.
//!
//! The service exposes the lifecycle contract every mesh member shares
//! (health, readiness, metrics) and two stub vision endpoints whose response
//! envelopes downstream orchestration relies on. No image is ever captured
//! or analysed: capture returns a 1×1 placeholder PNG and describe returns a
//! fixed sentence.
//!
//! # Endpoints
//!
//! ```text
//! GET  /health, /healthz   {status:"ok", service}
//! GET  /ready, /readyz     {ready:true}
//! GET  /metrics            Prometheus text exposition
//! POST /vision/capture     {ok:true, image_url, event_id, person_id, session_id, baton, received_at}
//! POST /vision/describe    {ok:true, description, ...} | {ok:false, error, event_id}
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`correlation`]: `X-Event-ID` / `X-Context-Baton` passthrough
//! - [`metrics`]: Per-endpoint request counters
//! - [`caps`]: Startup capability report to the orchestrator
//! - [`api`]: HTTP handlers and router
//! - [`server`]: Listener lifecycle
//! - [`utils`]: Utility functions

pub mod api;
pub mod caps;
pub mod config;
pub mod correlation;
pub mod error;
pub mod metrics;
pub mod server;
pub mod utils;

pub use config::Config;
pub use error::{Result, ServiceError};

/// Name this service reports in health responses, logs and the capability
/// envelope.
pub const SERVICE_NAME: &str = "unison-io-vision";
