//! Metrics collection for the Reeve client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Metrics collector interface.
pub trait MetricsCollector: Send + Sync {
    /// Records a completed request.
    fn record_request(&self, operation: &str, success: bool, duration: Duration);

    /// Records the HTTP status of a response.
    fn record_status(&self, status: u16);

    /// Records an error by kind.
    fn record_error(&self, kind: &str);

    /// Records a login.
    fn record_login(&self, success: bool);

    /// Gets current metrics.
    fn get_metrics(&self) -> RequestMetrics;

    /// Resets all metrics.
    fn reset(&self);
}

/// Request metrics snapshot.
#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    /// Total requests.
    pub total_requests: u64,
    /// Successful requests.
    pub successful_requests: u64,
    /// Failed requests.
    pub failed_requests: u64,
    /// Total latency in milliseconds.
    pub total_latency_ms: u64,
    /// Login attempts.
    pub logins: u64,
    /// Failed login attempts.
    pub failed_logins: u64,
    /// Requests per operation.
    pub operations: HashMap<String, u64>,
    /// Responses per HTTP status.
    pub status_codes: HashMap<u16, u64>,
    /// Error counts by kind.
    pub errors: HashMap<String, u64>,
}

impl RequestMetrics {
    /// Calculates average latency in milliseconds.
    pub fn average_latency_ms(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.total_requests as f64
        }
    }

    /// Calculates success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            100.0
        } else {
            (self.successful_requests as f64 / self.total_requests as f64) * 100.0
        }
    }
}

/// In-memory metrics collector.
pub struct DefaultMetricsCollector {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_latency_ms: AtomicU64,
    logins: AtomicU64,
    failed_logins: AtomicU64,
    operations: RwLock<HashMap<String, u64>>,
    status_codes: RwLock<HashMap<u16, u64>>,
    errors: RwLock<HashMap<String, u64>>,
}

impl DefaultMetricsCollector {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            logins: AtomicU64::new(0),
            failed_logins: AtomicU64::new(0),
            operations: RwLock::new(HashMap::new()),
            status_codes: RwLock::new(HashMap::new()),
            errors: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for DefaultMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector for DefaultMetricsCollector {
    fn record_request(&self, operation: &str, success: bool, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }

        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.total_latency_ms.fetch_add(millis, Ordering::Relaxed);

        if let Ok(mut ops) = self.operations.write() {
            *ops.entry(operation.to_string()).or_insert(0) += 1;
        }
    }

    fn record_status(&self, status: u16) {
        if let Ok(mut codes) = self.status_codes.write() {
            *codes.entry(status).or_insert(0) += 1;
        }
    }

    fn record_error(&self, kind: &str) {
        if let Ok(mut errors) = self.errors.write() {
            *errors.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    fn record_login(&self, success: bool) {
        self.logins.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed_logins.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn get_metrics(&self) -> RequestMetrics {
        RequestMetrics {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            total_latency_ms: self.total_latency_ms.load(Ordering::Relaxed),
            logins: self.logins.load(Ordering::Relaxed),
            failed_logins: self.failed_logins.load(Ordering::Relaxed),
            operations: self.operations.read().map(|o| o.clone()).unwrap_or_default(),
            status_codes: self.status_codes.read().map(|c| c.clone()).unwrap_or_default(),
            errors: self.errors.read().map(|e| e.clone()).unwrap_or_default(),
        }
    }

    fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.successful_requests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
        self.total_latency_ms.store(0, Ordering::Relaxed);
        self.logins.store(0, Ordering::Relaxed);
        self.failed_logins.store(0, Ordering::Relaxed);

        if let Ok(mut ops) = self.operations.write() {
            ops.clear();
        }
        if let Ok(mut codes) = self.status_codes.write() {
            codes.clear();
        }
        if let Ok(mut errors) = self.errors.write() {
            errors.clear();
        }
    }
}

impl std::fmt::Debug for DefaultMetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultMetricsCollector")
            .field("total_requests", &self.total_requests.load(Ordering::Relaxed))
            .field("failed_requests", &self.failed_requests.load(Ordering::Relaxed))
            .field("logins", &self.logins.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request() {
        let collector = DefaultMetricsCollector::new();

        collector.record_request("person.list", true, Duration::from_millis(100));
        collector.record_request("person.list", true, Duration::from_millis(200));
        collector.record_request("face.add", false, Duration::from_millis(50));

        let metrics = collector.get_metrics();
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.successful_requests, 2);
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.total_latency_ms, 350);
        assert_eq!(metrics.operations.get("person.list"), Some(&2));
        assert_eq!(metrics.operations.get("face.add"), Some(&1));
    }

    #[test]
    fn test_status_and_errors() {
        let collector = DefaultMetricsCollector::new();

        collector.record_status(200);
        collector.record_status(404);
        collector.record_status(404);
        collector.record_error("not_found");

        let metrics = collector.get_metrics();
        assert_eq!(metrics.status_codes.get(&404), Some(&2));
        assert_eq!(metrics.status_codes.get(&200), Some(&1));
        assert_eq!(metrics.errors.get("not_found"), Some(&1));
    }

    #[test]
    fn test_logins() {
        let collector = DefaultMetricsCollector::new();

        collector.record_login(true);
        collector.record_login(false);

        let metrics = collector.get_metrics();
        assert_eq!(metrics.logins, 2);
        assert_eq!(metrics.failed_logins, 1);
    }

    #[test]
    fn test_rates() {
        let collector = DefaultMetricsCollector::new();
        assert!((collector.get_metrics().success_rate() - 100.0).abs() < 0.1);

        collector.record_request("person.add", true, Duration::from_millis(100));
        collector.record_request("person.add", false, Duration::from_millis(200));

        let metrics = collector.get_metrics();
        assert!((metrics.success_rate() - 50.0).abs() < 0.1);
        assert!((metrics.average_latency_ms() - 150.0).abs() < 0.1);
    }

    #[test]
    fn test_reset() {
        let collector = DefaultMetricsCollector::new();

        collector.record_request("auth.login", true, Duration::from_millis(100));
        collector.record_status(200);
        collector.record_login(true);

        collector.reset();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.logins, 0);
        assert!(metrics.status_codes.is_empty());
        assert!(metrics.operations.is_empty());
    }
}
