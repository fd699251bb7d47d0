//! Maps raw HTTP responses onto envelopes or typed errors.

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{ApiErrorBody, ErrorKind, ReeveError, ReeveResult};
use crate::transport::HttpResponse;
use crate::types::ApiResponse;

/// Interprets response bodies as [`ApiResponse`] envelopes.
pub struct ErrorMapper;

impl ErrorMapper {
    /// Parses a response into a typed envelope, or the error it describes.
    ///
    /// The body is read as the envelope regardless of status. Non-JSON bodies
    /// are treated as `{"error": <body text>}`. A 2xx response whose envelope
    /// reports `success: false` or carries an error is an [`ErrorKind::Api`]
    /// failure, since status and envelope must agree.
    pub fn parse_envelope<T: DeserializeOwned>(
        response: &HttpResponse,
    ) -> ReeveResult<ApiResponse<T>> {
        let status = response.status;
        let body = Self::body_value(response);

        if !response.is_success() {
            return Err(Self::map_status(status, &body));
        }

        let mut envelope: ApiResponse<T> = serde_json::from_value(body).map_err(|e| {
            ReeveError::api(format!("Malformed response envelope: {e}"), Some(status))
        })?;

        if !envelope.success || envelope.error.as_ref().is_some_and(|e| !e.is_empty()) {
            let message = envelope
                .error
                .as_ref()
                .map(ApiErrorBody::message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Response envelope reported failure".to_string());

            return Err(ReeveError::Api {
                message,
                status_code: Some(status),
                error: envelope.error.take(),
            });
        }

        if envelope.status_code.is_none() {
            envelope.status_code = Some(status);
        }

        Ok(envelope)
    }

    /// Maps a non-2xx status and its body to a typed error.
    pub fn map_status(status: u16, body: &Value) -> ReeveError {
        let error = body
            .get("error")
            .cloned()
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::from_value::<ApiErrorBody>(v).ok())
            .filter(|e| !e.is_empty());

        let message = error
            .as_ref()
            .map(ApiErrorBody::message)
            .unwrap_or_else(|| Self::status_message(status));

        ReeveError::from_kind(ErrorKind::from_status(status), message, Some(status), error)
    }

    /// Returns the fallback message for a status without an error body.
    pub fn status_message(status: u16) -> String {
        match StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
        {
            Some(reason) => format!("HTTP {status} {reason}"),
            None => format!("HTTP {status} error"),
        }
    }

    fn body_value(response: &HttpResponse) -> Value {
        if response.body.is_empty() {
            return Value::Object(serde_json::Map::new());
        }

        serde_json::from_slice(&response.body).unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(&response.body).trim().to_string();
            serde_json::json!({ "error": text })
        })
    }
}
