//! Error types for the Reeve client.
//!
//! Every failure, whether it comes from the transport, from an HTTP status, or
//! from an inconsistent response envelope, surfaces as a [`ReeveError`]. The
//! service-facing variants all carry the original status code and the
//! server-supplied error body when one was available.

mod mapping;

pub use mapping::ErrorMapper;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for Reeve operations.
pub type ReeveResult<T> = Result<T, ReeveError>;

/// Error kind derived from the HTTP status of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid, missing or expired credentials, or insufficient role.
    Authentication,
    /// Malformed request payload.
    Validation,
    /// Referenced person or face does not exist.
    NotFound,
    /// Duplicate resource, such as an existing username.
    Conflict,
    /// Generic, network or otherwise unclassified failure.
    Api,
}

impl ErrorKind {
    /// Classifies an HTTP status code.
    ///
    /// Only 4xx codes are classified into specific kinds; everything else
    /// (5xx, unexpected 1xx/3xx) is [`ErrorKind::Api`].
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::Authentication,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            400..=499 => ErrorKind::Validation,
            _ => ErrorKind::Api,
        }
    }

    /// Returns a stable name for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Api => "api",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comprehensive error type for Reeve client operations.
#[derive(Debug, Error)]
pub enum ReeveError {
    /// Authentication failed (HTTP 401/403).
    #[error("Authentication failed: {}", render(.status_code, .message))]
    Authentication {
        /// Error message from the API.
        message: String,
        /// HTTP status code.
        status_code: Option<u16>,
        /// Server-supplied error body.
        error: Option<ApiErrorBody>,
    },

    /// The request was rejected as invalid (HTTP 400, 422, other 4xx), or
    /// failed client-side validation before being sent.
    #[error("Validation error: {}", render(.status_code, .message))]
    Validation {
        /// Error message describing the validation issue.
        message: String,
        /// HTTP status code, absent for client-side validation.
        status_code: Option<u16>,
        /// Server-supplied error body.
        error: Option<ApiErrorBody>,
    },

    /// The referenced resource does not exist (HTTP 404).
    #[error("Not found: {}", render(.status_code, .message))]
    NotFound {
        /// Error message from the API.
        message: String,
        /// HTTP status code.
        status_code: Option<u16>,
        /// Server-supplied error body.
        error: Option<ApiErrorBody>,
    },

    /// The resource already exists (HTTP 409).
    #[error("Conflict: {}", render(.status_code, .message))]
    Conflict {
        /// Error message from the API.
        message: String,
        /// HTTP status code.
        status_code: Option<u16>,
        /// Server-supplied error body.
        error: Option<ApiErrorBody>,
    },

    /// Server errors, network failures, malformed responses and envelopes
    /// that contradict their HTTP status.
    #[error("API error: {}", render(.status_code, .message))]
    Api {
        /// Error message.
        message: String,
        /// HTTP status code, absent for network failures.
        status_code: Option<u16>,
        /// Server-supplied error body.
        error: Option<ApiErrorBody>,
    },

    /// Client-side configuration error.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },
}

fn render(status_code: &Option<u16>, message: &str) -> String {
    match status_code {
        Some(status) => format!("[{status}] {message}"),
        None => message.to_string(),
    }
}

impl ReeveError {
    /// Builds the error variant matching `kind`.
    pub fn from_kind(
        kind: ErrorKind,
        message: impl Into<String>,
        status_code: Option<u16>,
        error: Option<ApiErrorBody>,
    ) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Authentication => ReeveError::Authentication {
                message,
                status_code,
                error,
            },
            ErrorKind::Validation => ReeveError::Validation {
                message,
                status_code,
                error,
            },
            ErrorKind::NotFound => ReeveError::NotFound {
                message,
                status_code,
                error,
            },
            ErrorKind::Conflict => ReeveError::Conflict {
                message,
                status_code,
                error,
            },
            ErrorKind::Api => ReeveError::Api {
                message,
                status_code,
                error,
            },
        }
    }

    /// Creates a client-side validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ReeveError::Validation {
            message: message.into(),
            status_code: None,
            error: None,
        }
    }

    /// Creates a generic API error.
    pub fn api(message: impl Into<String>, status_code: Option<u16>) -> Self {
        ReeveError::Api {
            message: message.into(),
            status_code,
            error: None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        ReeveError::Configuration {
            message: message.into(),
        }
    }

    /// Returns the error kind. Configuration errors report [`ErrorKind::Api`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReeveError::Authentication { .. } => ErrorKind::Authentication,
            ReeveError::Validation { .. } => ErrorKind::Validation,
            ReeveError::NotFound { .. } => ErrorKind::NotFound,
            ReeveError::Conflict { .. } => ErrorKind::Conflict,
            ReeveError::Api { .. } | ReeveError::Configuration { .. } => ErrorKind::Api,
        }
    }

    /// Returns the HTTP status code the error was derived from.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ReeveError::Authentication { status_code, .. }
            | ReeveError::Validation { status_code, .. }
            | ReeveError::NotFound { status_code, .. }
            | ReeveError::Conflict { status_code, .. }
            | ReeveError::Api { status_code, .. } => *status_code,
            ReeveError::Configuration { .. } => None,
        }
    }

    /// Returns the server-supplied error body.
    pub fn error_body(&self) -> Option<&ApiErrorBody> {
        match self {
            ReeveError::Authentication { error, .. }
            | ReeveError::Validation { error, .. }
            | ReeveError::NotFound { error, .. }
            | ReeveError::Conflict { error, .. }
            | ReeveError::Api { error, .. } => error.as_ref(),
            ReeveError::Configuration { .. } => None,
        }
    }

    /// Returns the error message without the status prefix.
    pub fn message(&self) -> &str {
        match self {
            ReeveError::Authentication { message, .. }
            | ReeveError::Validation { message, .. }
            | ReeveError::NotFound { message, .. }
            | ReeveError::Conflict { message, .. }
            | ReeveError::Api { message, .. }
            | ReeveError::Configuration { message } => message,
        }
    }

    /// Returns true for 401/403 responses, the signal to log in again.
    pub fn is_authentication(&self) -> bool {
        matches!(self, ReeveError::Authentication { .. })
    }
}

/// The `error` field of a response envelope.
///
/// The service uses several shapes: a bare string, a list of messages, or an
/// object carrying `Message` (string or list) or `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorBody {
    /// A plain error string.
    Text(String),
    /// A list of messages.
    List(Vec<serde_json::Value>),
    /// A structured error object.
    Object(serde_json::Map<String, serde_json::Value>),
}

impl ApiErrorBody {
    /// Renders a human-readable message from the body.
    pub fn message(&self) -> String {
        match self {
            ApiErrorBody::Text(text) => text.clone(),
            ApiErrorBody::List(items) => join_values(items),
            ApiErrorBody::Object(fields) => {
                if let Some(messages) = fields.get("Message") {
                    match messages {
                        serde_json::Value::Array(items) => join_values(items),
                        other => value_text(other),
                    }
                } else if let Some(message) = fields.get("message") {
                    value_text(message)
                } else {
                    serde_json::Value::Object(fields.clone()).to_string()
                }
            }
        }
    }

    /// Returns true when the body carries no information.
    pub fn is_empty(&self) -> bool {
        match self {
            ApiErrorBody::Text(text) => text.trim().is_empty(),
            ApiErrorBody::List(items) => items.is_empty(),
            ApiErrorBody::Object(fields) => fields.is_empty(),
        }
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join_values(items: &[serde_json::Value]) -> String {
    items.iter().map(value_text).collect::<Vec<_>>().join("; ")
}

impl From<TransportError> for ReeveError {
    fn from(err: TransportError) -> Self {
        ReeveError::Api {
            message: err.to_string(),
            status_code: None,
            error: None,
        }
    }
}

impl From<serde_json::Error> for ReeveError {
    fn from(err: serde_json::Error) -> Self {
        ReeveError::Api {
            message: format!("Serialization error: {err}"),
            status_code: None,
            error: None,
        }
    }
}

impl From<url::ParseError> for ReeveError {
    fn from(err: url::ParseError) -> Self {
        ReeveError::Configuration {
            message: format!("Invalid URL: {err}"),
        }
    }
}
