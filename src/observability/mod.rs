//! Observability module for the Reeve client.
//!
//! Provides tracing setup, log redaction and metrics for API requests.

mod logging;
mod metrics;

pub use logging::{redact, LogConfig, LogFormat, LogLevel};
pub use metrics::{DefaultMetricsCollector, MetricsCollector, RequestMetrics};

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::ReeveError;

/// Observability configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    pub logging: LogConfig,
    /// Enable metrics collection.
    pub enable_metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            logging: LogConfig::default(),
            enable_metrics: true,
        }
    }
}

/// Observability facade shared by every request of one client.
pub struct Observability {
    metrics: Arc<dyn MetricsCollector>,
    config: ObservabilityConfig,
}

impl Observability {
    /// Creates a new observability facade with the in-memory collector.
    pub fn new(config: ObservabilityConfig) -> Self {
        Self {
            metrics: Arc::new(DefaultMetricsCollector::new()),
            config,
        }
    }

    /// Creates with a custom metrics collector.
    pub fn with_metrics(metrics: Arc<dyn MetricsCollector>, config: ObservabilityConfig) -> Self {
        Self { metrics, config }
    }

    /// Returns the metrics collector.
    pub fn metrics(&self) -> &Arc<dyn MetricsCollector> {
        &self.metrics
    }

    /// Returns the logging configuration.
    pub fn log_config(&self) -> &LogConfig {
        &self.config.logging
    }

    /// Records a successful request.
    pub fn record_success(&self, operation: &str, status: u16, duration: Duration) {
        if self.config.enable_metrics {
            self.metrics.record_request(operation, true, duration);
            self.metrics.record_status(status);
        }
    }

    /// Records a failed request.
    pub fn record_failure(&self, operation: &str, error: &ReeveError, duration: Duration) {
        if self.config.enable_metrics {
            self.metrics.record_request(operation, false, duration);
            self.metrics.record_error(error.kind().as_str());
            if let Some(status) = error.status_code() {
                self.metrics.record_status(status);
            }
        }
    }

    /// Records a login attempt.
    pub fn record_login(&self, success: bool) {
        if self.config.enable_metrics {
            self.metrics.record_login(success);
        }
    }
}

impl Default for Observability {
    fn default() -> Self {
        Self::new(ObservabilityConfig::default())
    }
}

impl std::fmt::Debug for Observability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observability")
            .field("config", &self.config)
            .finish()
    }
}

/// Request timer for measuring operation duration.
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    /// Starts a timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns the elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Returns the elapsed time in whole milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
