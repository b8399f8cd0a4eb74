//! Reqmeter - Prometheus request metrics for HTTP services
//!
//! This library counts requests by method and path, tracks response times in
//! a sliding-window summary keyed by method, path and status, and exports
//! process-level defaults in the Prometheus text exposition format.
//!
//! # Architecture
//! - `metrics`: collector, summary engine and process metrics
//! - `api`: actix-web middleware and the metrics/health services
//! - `config`: configuration loading and validation
//! - `runtime`: server startup and one-shot commands
//! - `system`: logging initialization
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use actix_web::{App, web};
//! use reqmeter::api::middleware::RequestMetricsMiddleware;
//! use reqmeter::api::services::metrics_routes;
//! use reqmeter::metrics::RequestMetrics;
//!
//! let metrics = Arc::new(RequestMetrics::with_defaults().unwrap());
//! let data = web::Data::from(metrics.clone());
//! let app = App::new()
//!     .wrap(RequestMetricsMiddleware::from_metrics(metrics))
//!     .app_data(data)
//!     .configure(|cfg| metrics_routes(cfg, "/metrics"));
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod runtime;
pub mod system;
