//! Startup capability report sent to the orchestrator.
//!
//! The report is a single best-effort POST. It never blocks the listener and
//! its failure never stops the service: the outcome is logged and dropped.

use std::fmt;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use reqwest::header::ACCEPT;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::CapsReportError;
use crate::SERVICE_NAME;

/// Intent tag of the capability envelope.
pub const CAPS_INTENT: &str = "caps.report";

/// Timeout applied to the whole report request.
pub const REPORT_TIMEOUT: Duration = Duration::from_secs(2);

/// Confidence attached to camera and display presence.
const DEVICE_CONFIDENCE: f64 = 0.6;

/// Presence of one device or adapter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceCapability {
    /// Whether the device is attached.
    pub present: bool,
    /// How sure the probe is, when it can tell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Capability map announced to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Capabilities {
    /// Camera presence.
    pub camera: DeviceCapability,
    /// Display presence.
    pub display: DeviceCapability,
    /// Sign-language adapter presence.
    pub sign_adapter: DeviceCapability,
    /// Brain-computer interface adapter presence.
    pub bci_adapter: DeviceCapability,
}

impl Capabilities {
    /// Probe capabilities from configuration flags.
    pub fn from_config(config: &Config) -> Self {
        Self {
            camera: DeviceCapability {
                present: config.has_camera,
                confidence: Some(DEVICE_CONFIDENCE),
            },
            display: DeviceCapability {
                present: config.has_display,
                confidence: Some(DEVICE_CONFIDENCE),
            },
            sign_adapter: DeviceCapability {
                present: config.has_sign_adapter,
                confidence: None,
            },
            bci_adapter: DeviceCapability {
                present: config.has_bci_adapter,
                confidence: None,
            },
        }
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Payload of the capability envelope.
#[derive(Debug, Clone, Serialize)]
pub struct CapsPayload {
    /// Person the report is filed under.
    pub person_id: String,
    /// Announced capabilities.
    pub caps: Capabilities,
}

/// Event envelope posted to the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityEnvelope {
    /// Creation time, ISO-8601 UTC.
    pub timestamp: String,
    /// Emitting service.
    pub source: &'static str,
    /// Always [`CAPS_INTENT`].
    pub intent: &'static str,
    /// Report body.
    pub payload: CapsPayload,
}

impl CapabilityEnvelope {
    /// Build the envelope for `config`, stamped now.
    pub fn new(config: &Config) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            source: SERVICE_NAME,
            intent: CAPS_INTENT,
            payload: CapsPayload {
                person_id: config.default_person_id.clone(),
                caps: Capabilities::from_config(config),
            },
        }
    }
}

/// Result of one report attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapsReportOutcome {
    /// The orchestrator accepted the report.
    pub ok: bool,
    /// HTTP status, 0 when the request never completed.
    pub status: u16,
}

/// Client posting the capability envelope.
#[derive(Debug, Clone)]
pub struct CapsReporter {
    http: reqwest::Client,
    url: String,
}

impl CapsReporter {
    /// Create a reporter targeting the orchestrator in `config`.
    pub fn new(config: &Config) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REPORT_TIMEOUT)
            // The orchestrator is a mesh-internal peer.
            .no_proxy()
            .build()?;

        Ok(Self {
            http,
            url: config.orchestrator_event_url(),
        })
    }

    /// POST the envelope once and return the accepted status.
    pub async fn send(&self, envelope: &CapabilityEnvelope) -> Result<u16, CapsReportError> {
        let response = self
            .http
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .json(envelope)
            .send()
            .await?;

        let status = response.status().as_u16();
        if matches!(status, 200 | 201 | 202) {
            Ok(status)
        } else {
            Err(CapsReportError::Rejected { status })
        }
    }

    /// Send the envelope and log the outcome. Never fails.
    #[instrument(skip(self, envelope), fields(url = %self.url))]
    pub async fn report(&self, envelope: &CapabilityEnvelope) -> CapsReportOutcome {
        let caps = envelope.payload.caps;

        match self.send(envelope).await {
            Ok(status) => {
                info!(service = SERVICE_NAME, ok = true, status, caps = %caps, "caps_report");
                CapsReportOutcome { ok: true, status }
            }
            Err(e) => {
                let status = e.status();
                warn!(
                    service = SERVICE_NAME,
                    ok = false,
                    status,
                    caps = %caps,
                    error = %e,
                    "caps_report"
                );
                CapsReportOutcome { ok: false, status }
            }
        }
    }
}

/// Build and send the capability report for `config`.
pub async fn report_capabilities(config: &Config) -> CapsReportOutcome {
    let envelope = CapabilityEnvelope::new(config);

    match CapsReporter::new(config) {
        Ok(reporter) => reporter.report(&envelope).await,
        Err(e) => {
            warn!(
                service = SERVICE_NAME,
                ok = false,
                status = 0u16,
                caps = %envelope.payload.caps,
                error = %e,
                "caps_report"
            );
            CapsReportOutcome { ok: false, status: 0 }
        }
    }
}

/// Fire-and-forget the capability report on a detached task.
pub fn spawn_caps_report(config: &Config) -> JoinHandle<CapsReportOutcome> {
    let config = config.clone();
    tokio::spawn(async move { report_capabilities(&config).await })
}
