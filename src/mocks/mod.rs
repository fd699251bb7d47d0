//! Mock implementations for testing.
//!
//! Provides a mock transport answering by route or from a queue, plus JSON
//! fixtures shaped like Reeve responses, for testing without a server.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MultipartPart, MultipartRequest,
    TransportError,
};

/// A recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
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
    /// Multipart parts, for form requests.
    pub parts: Vec<MultipartPart>,
}

impl RecordedRequest {
    /// Returns a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Parses the body as JSON.
    pub fn body_json(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_slice(body).ok())
    }

    /// Returns a query parameter value.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the multipart parts with the given field name.
    pub fn parts_named(&self, name: &str) -> Vec<&MultipartPart> {
        self.parts.iter().filter(|p| p.name() == name).collect()
    }
}

/// A mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
    /// Delay before the response is returned.
    pub delay: Option<Duration>,
}

impl MockResponse {
    /// Creates a 200 response with a raw JSON body.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            status: 200,
            headers,
            body,
            delay: None,
        }
    }

    /// Creates a 200 response wrapping `result` in a success envelope.
    pub fn envelope(result: serde_json::Value) -> Self {
        Self::json(&serde_json::json!({
            "success": true,
            "error": null,
            "result": result,
            "statusCode": 200,
            "timestamp": "2025-10-01T10:41:40Z"
        }))
    }

    /// Creates an error response with a failure envelope.
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(&serde_json::json!({
            "success": false,
            "error": message,
            "result": null,
            "statusCode": status,
            "timestamp": "2025-10-01T10:41:40Z"
        }))
        .with_status(status)
    }

    /// Creates a response with a non-JSON body.
    pub fn text(status: u16, body: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());

        Self {
            status,
            headers,
            body: body.as_bytes().to_vec(),
            delay: None,
        }
    }

    /// Sets the status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Delays the response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type RouteKey = (&'static str, String);

fn route_key(method: HttpMethod, path: &str) -> RouteKey {
    (method.as_str(), path.trim_start_matches('/').to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock HTTP transport.
///
/// Responses are chosen in order from: the route registered for the method
/// and path (the last response of a route repeats), the FIFO queue, then the
/// default response. Without any of these the mock answers 500.
pub struct MockTransport {
    routes: Mutex<HashMap<RouteKey, VecDeque<MockResponse>>>,
    queue: Mutex<VecDeque<MockResponse>>,
    default_response: Mutex<Option<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
    open: AtomicBool,
    open_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
            default_response: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            open: AtomicBool::new(false),
            open_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
        }
    }

    /// Adds a response for `method` and `path`. Query strings are ignored.
    pub fn on(&self, method: HttpMethod, path: &str, response: MockResponse) {
        lock(&self.routes)
            .entry(route_key(method, path))
            .or_default()
            .push_back(response);
    }

    /// Queues a response for the next unrouted request.
    pub fn queue(&self, response: MockResponse) {
        lock(&self.queue).push_back(response);
    }

    /// Queues a success envelope around `result`.
    pub fn queue_envelope(&self, result: serde_json::Value) {
        self.queue(MockResponse::envelope(result));
    }

    /// Queues an error response.
    pub fn queue_error(&self, status: u16, message: &str) {
        self.queue(MockResponse::error(status, message));
    }

    /// Sets the default response.
    pub fn set_default(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Gets the requests sent to `method` and `path`.
    pub fn requests_to(&self, method: HttpMethod, path: &str) -> Vec<RecordedRequest> {
        let key = route_key(method, path);
        lock(&self.requests)
            .iter()
            .filter(|r| route_key(r.method, &r.path) == key)
            .cloned()
            .collect()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Clears recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Returns how many times `open` was called.
    pub fn open_count(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    /// Returns how many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn next_response(&self, method: HttpMethod, path: &str) -> MockResponse {
        if let Some(route) = lock(&self.routes).get_mut(&route_key(method, path)) {
            let response = if route.len() > 1 {
                route.pop_front()
            } else {
                route.front().cloned()
            };
            if let Some(response) = response {
                return response;
            }
        }

        if let Some(response) = lock(&self.queue).pop_front() {
            return response;
        }

        lock(&self.default_response)
            .clone()
            .unwrap_or_else(|| MockResponse::error(500, "No mock response configured"))
    }

    async fn respond(&self, record: RecordedRequest) -> HttpResponse {
        self.open.store(true, Ordering::SeqCst);
        let response = self.next_response(record.method, &record.path);
        lock(&self.requests).push(record);

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        HttpResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let record = RecordedRequest {
            method: request.method,
            path: request.path,
            query: request.query,
            headers: request.headers,
            body: request.body,
            parts: Vec::new(),
        };
        Ok(self.respond(record).await)
    }

    async fn send_multipart(
        &self,
        request: MultipartRequest,
    ) -> Result<HttpResponse, TransportError> {
        let record = RecordedRequest {
            method: HttpMethod::Post,
            path: request.path,
            query: Vec::new(),
            headers: request.headers,
            body: None,
            parts: request.parts,
        };
        Ok(self.respond(record).await)
    }

    fn open(&self) -> Result<(), TransportError> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("request_count", &self.request_count())
            .field("open", &self.is_open())
            .finish()
    }
}

/// JSON fixtures shaped like Reeve `result` payloads.
pub mod fixtures {
    use serde_json::{json, Value};

    /// A login result carrying `token`.
    pub fn login(token: &str) -> Value {
        json!({
            "token": token,
            "expiresAt": "2099-01-01T00:00:00Z",
            "username": "admin",
            "role": "Admin"
        })
    }

    /// A person.
    pub fn person(id: i64, firstname: &str, lastname: &str) -> Value {
        json!({
            "id": id,
            "firstname": firstname,
            "lastname": lastname,
            "createdAt": "2025-10-01T10:41:40",
            "updatedAt": null
        })
    }

    /// A face owned by `person_id`.
    pub fn face(id: i64, person_id: i64) -> Value {
        json!({
            "id": id,
            "path": format!("faces/{person_id}/{id}.jpg"),
            "personId": person_id,
            "createdAt": "2025-10-01T10:41:40Z"
        })
    }

    /// A recognition match for `person_id`.
    pub fn identify_match(name: &str, person_id: i64) -> Value {
        json!({
            "name": name,
            "thresold": 48,
            "personId": person_id,
            "score": 130,
            "isMatchFound": true,
            "attributes": {
                "age": "33",
                "gender": "Male",
                "glasses": "False"
            }
        })
    }
}
