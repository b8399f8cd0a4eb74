//! Server mode
//!
//! This module contains the HTTP server startup logic.
//! It builds the metrics collector, starts process metrics collection and
//! serves the metrics and health routes behind the request metrics middleware.

use actix_web::{App, HttpServer, middleware::Compress, web};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::middleware::RequestMetricsMiddleware;
use crate::api::services::{health_routes, metrics_routes};
use crate::config::AppConfig;
use crate::metrics::RequestMetrics;

/// Upper bound on actix workers regardless of configuration.
const MAX_WORKERS: usize = 32;

/// Build the collector and start background process metrics.
///
/// Must run inside a tokio runtime.
pub fn build_metrics(config: &AppConfig) -> Result<Arc<RequestMetrics>> {
    let metrics = Arc::new(RequestMetrics::new(&config.metrics)?);
    metrics.start()?;
    Ok(metrics)
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: AppConfig) -> Result<()> {
    let metrics = build_metrics(&config).map_err(|e| {
        tracing::error!("Server startup failed: {}", e);
        e
    })?;
    let metrics_data = web::Data::from(metrics.clone());

    let endpoint = config.metrics.endpoint.clone();
    let health_path = config.server.health_path.clone();

    let workers = config.server.workers.clamp(1, MAX_WORKERS);
    if workers != config.server.workers {
        warn!(
            "server.workers={} clamped to {}",
            config.server.workers, workers
        );
    }

    info!("Metrics available at: {}", endpoint);
    info!("Health check available at: {}", health_path);
    info!(
        "Path label mode: {}",
        config.metrics.path_label.as_ref()
    );

    let server = HttpServer::new(move || {
        let endpoint = endpoint.clone();
        let health_path = health_path.clone();

        App::new()
            .wrap(Compress::default())
            .wrap(RequestMetricsMiddleware::from_metrics(metrics.clone())) // 最外层，统计所有请求
            .app_data(metrics_data.clone())
            .configure(move |cfg| {
                metrics_routes(cfg, &endpoint);
                health_routes(cfg, &health_path);
            })
    })
    .workers(workers);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    server.bind(bind_address)?.run().await?;

    info!("Server stopped");
    Ok(())
}
