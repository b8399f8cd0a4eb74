//! RequestMetrics collector tests
//!
//! Counting, exclusion, rendering and background collection lifecycle.

use std::sync::Arc;
use std::thread;

use reqmeter::config::MetricsConfig;
use reqmeter::metrics::{CONTENT_TYPE, RequestMetrics};

fn collector() -> RequestMetrics {
    RequestMetrics::with_defaults().expect("Failed to create collector")
}

// =============================================================================
// Counting
// =============================================================================

#[test]
fn test_single_request_scenario() {
    let metrics = collector();

    metrics.on_request_start("GET", "/foo");
    metrics.on_request_end("GET", "/foo", 200, 15.0);

    assert_eq!(metrics.requests_total().with_label_values(&["GET"]).get(), 1);
    assert_eq!(
        metrics.paths_taken_total().with_label_values(&["/foo"]).get(),
        1
    );

    let snapshot = metrics
        .response_time()
        .snapshot(&["GET", "/foo", "200"])
        .expect("series should exist");
    assert_eq!(snapshot.count, 1);
    assert!((snapshot.sum - 15.0).abs() < 1e-9);

    let body = metrics.render_metrics().unwrap().body;
    assert!(body.contains("reqmeter_requests_total{method=\"GET\"} 1"));
    assert!(body.contains("reqmeter_paths_taken_total{path=\"/foo\"} 1"));
    assert!(body.contains(
        "reqmeter_response_time_milliseconds_count{method=\"GET\",path=\"/foo\",status=\"200\"} 1"
    ));
    assert!(body.contains(
        "reqmeter_response_time_milliseconds_sum{method=\"GET\",path=\"/foo\",status=\"200\"} 15"
    ));
}

#[test]
fn test_counters_track_each_request() {
    let metrics = collector();

    for _ in 0..3 {
        metrics.on_request_start("GET", "/a");
    }
    metrics.on_request_start("POST", "/a");
    metrics.on_request_start("GET", "/b");

    assert_eq!(metrics.requests_total().with_label_values(&["GET"]).get(), 4);
    assert_eq!(metrics.requests_total().with_label_values(&["POST"]).get(), 1);
    assert_eq!(metrics.paths_taken_total().with_label_values(&["/a"]).get(), 4);
    assert_eq!(metrics.paths_taken_total().with_label_values(&["/b"]).get(), 1);
}

#[test]
fn test_distinct_status_codes_are_distinct_series() {
    let metrics = collector();

    metrics.on_request_end("GET", "/x", 200, 1.0);
    metrics.on_request_end("GET", "/x", 404, 2.0);
    metrics.on_request_end("GET", "/x", 200, 3.0);

    let ok = metrics.response_time().snapshot(&["GET", "/x", "200"]).unwrap();
    let missing = metrics.response_time().snapshot(&["GET", "/x", "404"]).unwrap();
    assert_eq!(ok.count, 2);
    assert_eq!(missing.count, 1);
    assert_eq!(metrics.response_time().series_count(), 2);
}

#[test]
fn test_concurrent_increments_are_not_lost() {
    let metrics = Arc::new(collector());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let metrics = metrics.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    metrics.on_request_start("GET", "/hot");
                    metrics.on_request_end("GET", "/hot", 200, i as f64);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        metrics.requests_total().with_label_values(&["GET"]).get(),
        4000
    );
    let snapshot = metrics
        .response_time()
        .snapshot(&["GET", "/hot", "200"])
        .unwrap();
    assert_eq!(snapshot.count, 4000);
}

// =============================================================================
// Exclusion
// =============================================================================

#[test]
fn test_scrape_endpoint_is_not_counted() {
    let metrics = collector();

    metrics.on_request_start("GET", "/metrics");
    metrics.on_request_end("GET", "/metrics", 200, 1.0);

    assert_eq!(metrics.requests_total().with_label_values(&["GET"]).get(), 0);
    assert_eq!(metrics.response_time().series_count(), 0);

    let body = metrics.render_metrics().unwrap().body;
    assert!(!body.contains("path=\"/metrics\""));
}

#[test]
fn test_oversized_window_is_rejected_at_construction() {
    let config = MetricsConfig {
        age_buckets: usize::MAX,
        ..MetricsConfig::default()
    };
    let err = RequestMetrics::new(&config).err().expect("must be rejected");
    assert_eq!(err.code(), "E001");
}

#[test]
fn test_configured_exclusions() {
    let config = MetricsConfig {
        excluded_paths: vec!["/health".to_string()],
        ..MetricsConfig::default()
    };
    let metrics = RequestMetrics::new(&config).unwrap();

    metrics.on_request_start("GET", "/health");
    metrics.on_request_start("GET", "/healthz");

    assert_eq!(metrics.requests_total().with_label_values(&["GET"]).get(), 1);
    assert!(metrics.is_excluded("/health"));
    assert!(!metrics.is_excluded("/healthz"));
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_render_before_any_request() {
    let metrics = collector();
    let rendered = metrics.render_metrics().unwrap();

    assert_eq!(rendered.content_type, CONTENT_TYPE);
    assert!(!rendered.body.contains("# TYPE reqmeter_response_time_milliseconds"));
}

#[test]
fn test_render_includes_quantiles() {
    let metrics = collector();
    for ms in 1..=100 {
        metrics.on_request_end("GET", "/q", 200, ms as f64);
    }

    let body = metrics.render_metrics().unwrap().body;
    assert!(body.contains("# TYPE reqmeter_response_time_milliseconds summary"));
    assert!(body.contains(
        "reqmeter_response_time_milliseconds{method=\"GET\",path=\"/q\",status=\"200\",quantile=\"0.5\"} 50"
    ));
    assert!(body.contains(
        "reqmeter_response_time_milliseconds{method=\"GET\",path=\"/q\",status=\"200\",quantile=\"0.99\"} 99"
    ));
}

#[test]
fn test_collectors_are_isolated() {
    let first = collector();
    let second = collector();

    first.on_request_start("GET", "/only-first");

    assert_eq!(first.requests_total().with_label_values(&["GET"]).get(), 1);
    assert_eq!(second.requests_total().with_label_values(&["GET"]).get(), 0);
}

// =============================================================================
// Process metrics lifecycle
// =============================================================================

#[tokio::test]
async fn test_start_is_idempotent() {
    let metrics = collector();

    let before = metrics.registry().gather().len();

    assert!(metrics.start().unwrap());
    let families = metrics.registry().gather().len();
    assert_eq!(families, before + 6);

    assert!(!metrics.start().unwrap());
    assert!(metrics.is_started());
    assert_eq!(metrics.registry().gather().len(), families);
}

#[tokio::test]
async fn test_started_collector_exports_process_metrics() {
    let metrics = collector();
    metrics.start().unwrap();

    let body = metrics.render_metrics().unwrap().body;
    assert!(body.contains("# TYPE process_resident_memory_bytes gauge"));
    assert!(body.contains("# TYPE process_cpu_seconds_total counter"));
    assert!(body.contains("process_start_time_seconds"));
    assert!(body.contains("reqmeter_uptime_seconds"));
    assert!(body.contains("reqmeter_runtime_lag_seconds"));
}

#[test]
fn test_unstarted_collector_has_no_process_metrics() {
    let metrics = collector();
    let body = metrics.render_metrics().unwrap().body;
    assert!(!body.contains("process_resident_memory_bytes"));
}
