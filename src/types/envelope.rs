//! The response envelope shared by every endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiErrorBody, ReeveError, ReeveResult};

/// Envelope wrapping every Reeve API response.
///
/// On success `result` holds the payload and `error` is empty. Failed
/// envelopes never reach callers: they are turned into [`ReeveError`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the call succeeded. Absent in some responses, then true.
    #[serde(default = "default_success")]
    pub success: bool,

    /// Error description, populated only on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,

    /// The payload.
    pub result: Option<T>,

    /// HTTP status code echoed by the service, or the transport status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Server timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiResponse<T> {
    /// Creates a successful envelope around `result`.
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            error: None,
            result: Some(result),
            status_code: Some(200),
            timestamp: None,
        }
    }

    /// Returns true if the call succeeded and carried no error.
    pub fn is_success(&self) -> bool {
        self.success && self.error.is_none()
    }

    /// Returns a reference to the payload.
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Consumes the envelope, returning the payload.
    ///
    /// Fails with an API error when the envelope carried no result.
    pub fn into_result(self) -> ReeveResult<T> {
        let status = self.status_code;
        self.result
            .ok_or_else(|| ReeveError::api("Response envelope carried no result", status))
    }

    /// Maps the payload, keeping the envelope metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        self.and_then(|t| Some(f(t)))
    }

    /// Maps the payload to an optional value, keeping the envelope metadata.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Option<U>) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            error: self.error,
            result: self.result.and_then(f),
            status_code: self.status_code,
            timestamp: self.timestamp,
        }
    }

    /// Parses the server timestamp (ISO-8601 or epoch seconds).
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(super::serde_helpers::parse_timestamp)
    }
}
