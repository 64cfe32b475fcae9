//! HTTP API module: lifecycle endpoints and the stub vision endpoints.

pub mod handlers;
pub mod routes;
pub mod vision;

pub use handlers::{AppState, Endpoint};
pub use routes::create_router;
