//! HTTP transport layer for the Reeve client.
//!
//! Provides the transport abstraction the executor sends through, and the
//! reqwest-backed implementation owning the connection pool.

mod http;

pub use self::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl, TransportSettings,
};

use std::collections::HashMap;
use std::time::Duration;

/// Multipart request for face uploads.
#[derive(Debug, Clone)]
pub struct MultipartRequest {
    /// Request path.
    pub path: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Multipart form parts.
    pub parts: Vec<MultipartPart>,
}

impl MultipartRequest {
    /// Creates a multipart POST to `path`.
    pub fn new(path: impl Into<String>, parts: Vec<MultipartPart>) -> Self {
        Self {
            path: path.into(),
            headers: HashMap::new(),
            parts,
        }
    }
}

/// A part of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartPart {
    /// Text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File field.
    File {
        /// Field name.
        name: String,
        /// File name.
        filename: String,
        /// Content type.
        content_type: String,
        /// File data.
        data: bytes::Bytes,
    },
}

impl MultipartPart {
    /// Creates a text part.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        MultipartPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        match self {
            MultipartPart::Text { name, .. } | MultipartPart::File { name, .. } => name,
        }
    }
}

/// Transport error types.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection error.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Timeout error.
    #[error("Request timed out")]
    Timeout {
        /// Timeout duration, when one was configured.
        timeout: Option<Duration>,
    },

    /// The request could not be built.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message.
        message: String,
    },

    /// Invalid response.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },
}

impl TransportError {
    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout: Option<Duration>) -> Self {
        if err.is_timeout() {
            TransportError::Timeout { timeout }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else if err.is_builder() {
            TransportError::InvalidRequest {
                message: err.to_string(),
            }
        } else {
            TransportError::InvalidResponse {
                message: err.to_string(),
            }
        }
    }
}
