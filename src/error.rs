//! Unified error types for the vision service.

use thiserror::Error;

/// Unified error type for the vision service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to deliver the startup capability report.
#[derive(Error, Debug)]
pub enum CapsReportError {
    /// The request never produced a response (refused, timed out, DNS).
    #[error("capability report not delivered: {0}")]
    Transport(#[from] reqwest::Error),

    /// The orchestrator answered with a non-accepting status.
    #[error("orchestrator rejected capability report with status {status}")]
    Rejected {
        /// HTTP status returned by the orchestrator.
        status: u16,
    },
}

impl CapsReportError {
    /// HTTP status to report, 0 when no response arrived.
    pub fn status(&self) -> u16 {
        match self {
            Self::Transport(err) => err.status().map(|s| s.as_u16()).unwrap_or(0),
            Self::Rejected { status } => *status,
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;
