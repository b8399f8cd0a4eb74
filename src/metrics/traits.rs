//! RequestObserver trait for dependency injection
//!
//! The HTTP middleware only talks to this trait, so a host can plug in the
//! Prometheus-backed [`RequestMetrics`](super::RequestMetrics), a
//! [`NoopObserver`], or a test recorder.

use std::sync::Arc;

/// Hooks invoked around every HTTP request.
///
/// All methods are no-op by default, allowing partial implementation.
/// Implementations must be thread-safe (Send + Sync) and must not block.
#[allow(unused_variables)]
pub trait RequestObserver: Send + Sync {
    /// Called before the request is handed to the inner service.
    fn on_request_start(&self, method: &str, path: &str) {}

    /// Called once the inner service produced the final response.
    fn on_request_end(&self, method: &str, path: &str, status: u16, elapsed_ms: f64) {}
}

/// Observer that records nothing.
pub struct NoopObserver;

impl RequestObserver for NoopObserver {}

impl NoopObserver {
    pub fn new() -> Self {
        Self
    }

    pub fn arc() -> Arc<dyn RequestObserver> {
        Arc::new(Self::new())
    }
}

impl Default for NoopObserver {
    fn default() -> Self {
        Self::new()
    }
}
