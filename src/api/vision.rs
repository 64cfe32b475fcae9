//! Stub vision endpoints: capture and describe.
//!
//! Both return an envelope discriminated by `ok`. Describe reports invalid
//! input in-band with HTTP 200 and `ok: false`; callers must inspect `ok`.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::handlers::{AppState, Endpoint};
use crate::correlation::Correlation;
use crate::SERVICE_NAME;

/// 1×1 transparent PNG returned by capture.
pub const PLACEHOLDER_PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mP8Xw8AAqEBgX1Xw3wAAAAASUVORK5CYII=";

/// Description returned by describe.
pub const PLACEHOLDER_DESCRIPTION: &str = "This is a placeholder description of the image content.";

/// Prefix an accepted `image_url` must carry.
pub const IMAGE_DATA_URI_PREFIX: &str = "data:image/";

/// Error returned when `image_url` is missing or not an image data URI.
pub const INVALID_IMAGE_URL: &str = "missing or invalid 'image_url' (must be data URI)";

/// Capture request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptureRequest {
    /// Person the capture is for.
    #[serde(default)]
    pub person_id: Option<String>,
    /// Session the capture belongs to.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Describe request body.
///
/// `image_url` is kept untyped so a non-string value is a validation
/// failure rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescribeRequest {
    /// Image as a data URI.
    #[serde(default)]
    pub image_url: Option<Value>,
    /// Person the description is for.
    #[serde(default)]
    pub person_id: Option<String>,
    /// Session the description belongs to.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl DescribeRequest {
    /// The image data URI, if present and well-formed.
    pub fn image_data_uri(&self) -> Option<&str> {
        self.image_url
            .as_ref()
            .and_then(Value::as_str)
            .filter(|url| url.starts_with(IMAGE_DATA_URI_PREFIX))
    }
}

/// Capture response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResponse {
    /// Always true.
    pub ok: bool,
    /// Captured image as a data URI.
    pub image_url: String,
    /// Echoed correlation id.
    pub event_id: Option<String>,
    /// Echoed person id.
    pub person_id: Option<String>,
    /// Echoed session id.
    pub session_id: Option<String>,
    /// Echoed context baton.
    pub baton: Option<String>,
    /// Receipt time, seconds since the Unix epoch.
    pub received_at: f64,
}

/// Successful describe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeSuccess {
    /// Always true.
    pub ok: bool,
    /// Image description.
    pub description: String,
    /// Echoed correlation id.
    pub event_id: Option<String>,
    /// Echoed person id.
    pub person_id: Option<String>,
    /// Echoed session id.
    pub session_id: Option<String>,
    /// Echoed context baton.
    pub baton: Option<String>,
    /// Receipt time, seconds since the Unix epoch.
    pub received_at: f64,
}

/// Failed vision response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionFailure {
    /// Always false.
    pub ok: bool,
    /// What was wrong with the request.
    pub error: String,
    /// Echoed correlation id.
    pub event_id: Option<String>,
}

/// Describe response: fully successful or fully failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescribeResponse {
    /// `ok: true`.
    Success(DescribeSuccess),
    /// `ok: false`.
    Failure(VisionFailure),
}

impl DescribeResponse {
    /// The `ok` discriminator.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Wall-clock seconds since the Unix epoch.
fn epoch_seconds() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9
}

/// Capture handler - returns the placeholder image.
pub async fn capture(
    State(state): State<AppState>,
    correlation: Correlation,
    Json(body): Json<CaptureRequest>,
) -> Json<CaptureResponse> {
    state.record(Endpoint::VisionCapture);
    info!(
        service = SERVICE_NAME,
        event_id = correlation.event_id(),
        baton = correlation.baton(),
        person_id = body.person_id.as_deref(),
        session_id = body.session_id.as_deref(),
        "vision_capture"
    );

    Json(CaptureResponse {
        ok: true,
        image_url: PLACEHOLDER_PNG_DATA_URI.to_string(),
        event_id: correlation.event_id,
        person_id: body.person_id,
        session_id: body.session_id,
        baton: correlation.baton,
        received_at: epoch_seconds(),
    })
}

/// Describe handler - validates the data URI and returns the placeholder
/// description.
pub async fn describe(
    State(state): State<AppState>,
    correlation: Correlation,
    Json(body): Json<DescribeRequest>,
) -> Json<DescribeResponse> {
    state.record(Endpoint::VisionDescribe);

    if body.image_data_uri().is_none() {
        warn!(
            service = SERVICE_NAME,
            event_id = correlation.event_id(),
            baton = correlation.baton(),
            person_id = body.person_id.as_deref(),
            session_id = body.session_id.as_deref(),
            "vision_describe_invalid"
        );
        return Json(DescribeResponse::Failure(VisionFailure {
            ok: false,
            error: INVALID_IMAGE_URL.to_string(),
            event_id: correlation.event_id,
        }));
    }

    info!(
        service = SERVICE_NAME,
        event_id = correlation.event_id(),
        baton = correlation.baton(),
        description_len = PLACEHOLDER_DESCRIPTION.len(),
        person_id = body.person_id.as_deref(),
        session_id = body.session_id.as_deref(),
        "vision_describe"
    );

    Json(DescribeResponse::Success(DescribeSuccess {
        ok: true,
        description: PLACEHOLDER_DESCRIPTION.to_string(),
        event_id: correlation.event_id,
        person_id: body.person_id,
        session_id: body.session_id,
        baton: correlation.baton,
        received_at: epoch_seconds(),
    }))
}
