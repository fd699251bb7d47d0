//! HTTP transport implementation.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tracing::instrument;

use super::{MultipartPart, MultipartRequest, TransportError};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// DELETE request.
    Delete,
}

impl HttpMethod {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// HTTP request representation.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path.
    pub path: String,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with the given method.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Creates a new GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a new POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a new PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Creates a new DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Serializes `value` as the JSON body.
    pub fn with_json<T: serde::Serialize + ?Sized>(
        mut self,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }
}

/// HTTP response representation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true if the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// HTTP transport trait.
///
/// A transport owns the connection pool. `open` and `close` bound its
/// lifetime; sending on a closed transport reopens it.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Send a multipart form request.
    async fn send_multipart(
        &self,
        request: MultipartRequest,
    ) -> Result<HttpResponse, TransportError>;

    /// Opens the connection pool if it is not open yet.
    fn open(&self) -> Result<(), TransportError>;

    /// Closes the connection pool, dropping idle connections.
    fn close(&self);

    /// Returns true while the pool is open.
    fn is_open(&self) -> bool;
}

/// Settings for the reqwest transport.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Base URL every path is joined onto.
    pub base_url: String,
    /// Overall request timeout; `None` keeps reqwest's default (no timeout).
    pub timeout: Option<Duration>,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
}

/// HTTP transport implementation using reqwest.
pub struct HttpTransportImpl {
    settings: TransportSettings,
    client: RwLock<Option<Client>>,
}

impl HttpTransportImpl {
    /// Creates a new HTTP transport. The pool is opened on first use.
    pub fn new(settings: TransportSettings) -> Self {
        Self {
            settings,
            client: RwLock::new(None),
        }
    }

    /// Builds the full URL for a path.
    fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url,
            path.trim_start_matches('/')
        )
    }

    fn build_client(&self) -> Result<Client, TransportError> {
        let mut builder = ClientBuilder::new()
            .pool_max_idle_per_host(self.settings.pool_max_idle_per_host)
            .tcp_keepalive(Duration::from_secs(60));

        if let Some(timeout) = self.settings.timeout {
            builder = builder.timeout(timeout);
        }

        builder.build().map_err(|e| TransportError::Connection {
            message: e.to_string(),
        })
    }

    /// Returns a handle to the pool, opening it if needed.
    fn client(&self) -> Result<Client, TransportError> {
        if let Some(client) = self
            .client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(client.clone());
        }

        let mut slot = self.client.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = self.build_client()?;
        tracing::debug!(base_url = %self.settings.base_url, "Opened connection pool");
        *slot = Some(client.clone());
        Ok(client)
    }

    fn apply_headers(
        mut req_builder: RequestBuilder,
        headers: &HashMap<String, String>,
    ) -> RequestBuilder {
        for (name, value) in headers {
            req_builder = req_builder.header(name, value);
        }
        req_builder
    }

    async fn execute(&self, req_builder: RequestBuilder) -> Result<HttpResponse, TransportError> {
        let timeout = self.settings.timeout;
        let response = req_builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e, timeout))?;

        Self::read_response(response, timeout).await
    }

    async fn read_response(
        response: Response,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(&e, timeout))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpTransport for HttpTransportImpl {
    #[instrument(skip(self, request), fields(method = request.method.as_str(), path = %request.path))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let client = self.client()?;
        let url = self.build_url(&request.path);

        let mut req_builder = match request.method {
            HttpMethod::Get => client.get(&url),
            HttpMethod::Post => client.post(&url),
            HttpMethod::Put => client.put(&url),
            HttpMethod::Delete => client.delete(&url),
        };

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }

        req_builder = Self::apply_headers(req_builder, &request.headers);

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        self.execute(req_builder).await
    }

    #[instrument(skip(self, request), fields(path = %request.path))]
    async fn send_multipart(
        &self,
        request: MultipartRequest,
    ) -> Result<HttpResponse, TransportError> {
        let client = self.client()?;
        let url = self.build_url(&request.path);

        let mut form = reqwest::multipart::Form::new();

        for part in request.parts {
            form = match part {
                MultipartPart::Text { name, value } => form.text(name, value),
                MultipartPart::File {
                    name,
                    filename,
                    content_type,
                    data,
                } => {
                    let part = reqwest::multipart::Part::bytes(data.to_vec())
                        .file_name(filename)
                        .mime_str(&content_type)
                        .map_err(|e| TransportError::InvalidRequest {
                            message: e.to_string(),
                        })?;
                    form.part(name, part)
                }
            };
        }

        let req_builder = client.post(&url).multipart(form);
        let req_builder = Self::apply_headers(req_builder, &request.headers);

        self.execute(req_builder).await
    }

    fn open(&self) -> Result<(), TransportError> {
        self.client().map(|_| ())
    }

    fn close(&self) {
        let closed = self
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if closed.is_some() {
            tracing::debug!(base_url = %self.settings.base_url, "Closed connection pool");
        }
    }

    fn is_open(&self) -> bool {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for HttpTransportImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportImpl")
            .field("base_url", &self.settings.base_url)
            .field("open", &self.is_open())
            .finish()
    }
}
