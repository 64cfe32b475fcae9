//! Request correlation headers.
//!
//! Every handler takes a [`Correlation`] extractor. Both values are opaque:
//! they are echoed into responses and log records exactly as received and
//! never parsed.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

/// Header carrying the caller's correlation id.
pub const EVENT_ID_HEADER: &str = "x-event-id";
/// Header carrying the opaque context baton.
pub const BATON_HEADER: &str = "x-context-baton";

/// Correlation values read from the inbound request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    /// Correlation id from `X-Event-ID`.
    pub event_id: Option<String>,
    /// Context baton from `X-Context-Baton`.
    pub baton: Option<String>,
}

impl Correlation {
    /// Read both headers. Lookup is case-insensitive; a value that is not
    /// valid UTF-8 is treated as absent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            event_id: header_str(headers, EVENT_ID_HEADER),
            baton: header_str(headers, BATON_HEADER),
        }
    }

    /// Correlation id as a borrowed str.
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    /// Baton as a borrowed str.
    pub fn baton(&self) -> Option<&str> {
        self.baton.as_deref()
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
        .map(str::to_owned)
}

#[async_trait]
impl<S> FromRequestParts<S> for Correlation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
