//! Request metrics collector
//!
//! Owns the request counter, the path counter and the response-time summary,
//! plus the process-level defaults once [`RequestMetrics::start`] ran. Each
//! collector has its own registry, so hosts and tests can build as many
//! isolated instances as they need.

use parking_lot::Mutex;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use super::labels::metric_name;
use super::process::{ProcessCollector, spawn_refresher};
use super::summary::{SummaryOpts, SummaryVec};
use super::traits::RequestObserver;
use crate::config::{MetricsConfig, PathLabel, validators};
use crate::errors::{ReqmeterError, Result};

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Output of [`RequestMetrics::render_metrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMetrics {
    pub body: String,
    pub content_type: &'static str,
}

pub struct RequestMetrics {
    registry: Registry,

    /// Requests by method
    requests_total: IntCounterVec,
    /// Requests by path
    paths_taken_total: IntCounterVec,
    /// Response time in milliseconds by method, path and status
    response_time: SummaryVec,

    process: Arc<ProcessCollector>,
    endpoint: String,
    excluded_paths: Vec<String>,
    path_label: PathLabel,
    collect_interval: Duration,
    started: Mutex<bool>,
}

impl RequestMetrics {
    pub fn new(config: &MetricsConfig) -> Result<Self> {
        validators::validate_metrics(config)?;

        let registry = Registry::new();
        let ns = config.namespace.as_str();

        let requests_total = IntCounterVec::new(
            Opts::new(
                metric_name(ns, "requests_total"),
                "Total number of requests by method",
            ),
            &["method"],
        )?;

        let paths_taken_total = IntCounterVec::new(
            Opts::new(
                metric_name(ns, "paths_taken_total"),
                "Total number of requests by path",
            ),
            &["path"],
        )?;

        let response_time = SummaryVec::new(
            SummaryOpts::new(
                metric_name(ns, "response_time_milliseconds"),
                "Response time in milliseconds by method, path and status",
            )
            .label_names(&["method", "path", "status"])
            .quantiles(config.quantiles.clone())
            .max_age(Duration::from_secs(config.max_age_secs))
            .age_buckets(config.age_buckets)
            .max_samples_per_bucket(config.max_samples_per_bucket),
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(paths_taken_total.clone()))?;

        let process = Arc::new(ProcessCollector::new(ns)?);

        let mut excluded_paths = vec![config.endpoint.clone()];
        for path in &config.excluded_paths {
            if !excluded_paths.contains(path) {
                excluded_paths.push(path.clone());
            }
        }

        debug!(
            namespace = %config.namespace,
            endpoint = %config.endpoint,
            excluded = ?excluded_paths,
            "Request metrics collector created"
        );

        Ok(Self {
            registry,
            requests_total,
            paths_taken_total,
            response_time,
            process,
            endpoint: config.endpoint.clone(),
            excluded_paths,
            path_label: config.path_label,
            collect_interval: Duration::from_secs(config.collect_interval_secs),
            started: Mutex::new(false),
        })
    }

    /// Collector built from the default [`MetricsConfig`].
    pub fn with_defaults() -> Result<Self> {
        Self::new(&MetricsConfig::default())
    }

    /// Count a request by method and by path.
    pub fn on_request_start(&self, method: &str, path: &str) {
        if self.is_excluded(path) {
            return;
        }
        self.requests_total.with_label_values(&[method]).inc();
        self.paths_taken_total.with_label_values(&[path]).inc();
        trace!(method, path, "Request counted");
    }

    /// Record the response time of a finished request.
    pub fn on_request_end(&self, method: &str, path: &str, status: u16, elapsed_ms: f64) {
        if self.is_excluded(path) {
            return;
        }
        let status = status.to_string();
        if let Err(e) = self
            .response_time
            .observe(&[method, path, status.as_str()], elapsed_ms)
        {
            warn!("Failed to record response time: {}", e);
        }
    }

    /// Serialize every registered metric to the text exposition format.
    pub fn render_metrics(&self) -> Result<RenderedMetrics> {
        self.process.update_uptime();

        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| ReqmeterError::encoding(format!("failed to encode metrics: {}", e)))?;

        let mut body = String::from_utf8(buffer)?;
        self.response_time.render(&mut body);

        Ok(RenderedMetrics {
            body,
            content_type: CONTENT_TYPE,
        })
    }

    /// Start collecting process-level metrics in the background.
    ///
    /// Returns `Ok(false)` when collection was already running. Must be called
    /// from within a tokio runtime.
    pub fn start(&self) -> Result<bool> {
        let mut started = self.started.lock();
        if *started {
            debug!("Process metrics collection already running");
            return Ok(false);
        }

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ReqmeterError::runtime(
                "process metrics collection must be started inside a tokio runtime",
            ));
        }

        self.process.register(&self.registry)?;
        self.process.refresh();
        spawn_refresher(Arc::downgrade(&self.process), self.collect_interval);
        *started = true;

        info!(
            interval_secs = self.collect_interval.as_secs(),
            "Process metrics collection started"
        );
        Ok(true)
    }

    pub fn is_started(&self) -> bool {
        *self.started.lock()
    }

    /// Whether requests to `path` are left out of the metrics.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|p| p == path)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn path_label(&self) -> PathLabel {
        self.path_label
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn requests_total(&self) -> &IntCounterVec {
        &self.requests_total
    }

    pub fn paths_taken_total(&self) -> &IntCounterVec {
        &self.paths_taken_total
    }

    pub fn response_time(&self) -> &SummaryVec {
        &self.response_time
    }
}

impl RequestObserver for RequestMetrics {
    fn on_request_start(&self, method: &str, path: &str) {
        RequestMetrics::on_request_start(self, method, path);
    }

    fn on_request_end(&self, method: &str, path: &str, status: u16, elapsed_ms: f64) {
        RequestMetrics::on_request_end(self, method, path, status, elapsed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_is_always_excluded() {
        let mut config = MetricsConfig::default();
        config.endpoint = "/internal/metrics".to_string();
        config.excluded_paths = vec!["/favicon.ico".to_string(), "/internal/metrics".to_string()];

        let metrics = RequestMetrics::new(&config).unwrap();
        assert!(metrics.is_excluded("/internal/metrics"));
        assert!(metrics.is_excluded("/favicon.ico"));
        assert!(!metrics.is_excluded("/metrics"));
        assert_eq!(metrics.excluded_paths.len(), 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = MetricsConfig::default();
        config.quantiles = vec![2.0];
        let err = RequestMetrics::new(&config).err().unwrap();
        assert_eq!(err.code(), "E001");
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let metrics = RequestMetrics::with_defaults().unwrap();
        let err = metrics.start().unwrap_err();
        assert_eq!(err.code(), "E005");
        assert!(!metrics.is_started());
    }

    #[test]
    fn test_empty_namespace_drops_prefix() {
        let mut config = MetricsConfig::default();
        config.namespace = String::new();
        let metrics = RequestMetrics::new(&config).unwrap();
        metrics.on_request_start("GET", "/");
        metrics.on_request_end("GET", "/", 200, 1.0);

        let body = metrics.render_metrics().unwrap().body;
        assert!(body.contains("\nrequests_total{method=\"GET\"} 1"));
        assert!(body.contains("# TYPE response_time_milliseconds summary"));
    }
}
