//! Prometheus metrics endpoint
//!
//! Exposes the collector's metrics in the text exposition format.

use actix_web::{HttpResponse, web};
use tracing::{error, trace};

use crate::metrics::RequestMetrics;

/// Metrics service handler
pub struct MetricsService;

impl MetricsService {
    /// Handle a scrape. Render failures surface as HTTP 500.
    pub async fn metrics(
        metrics: web::Data<RequestMetrics>,
    ) -> Result<HttpResponse, actix_web::Error> {
        trace!("Received metrics scrape");

        let rendered = metrics.render_metrics().map_err(|e| {
            error!("Failed to render metrics: {}", e);
            actix_web::error::ErrorInternalServerError(e)
        })?;

        Ok(HttpResponse::Ok()
            .content_type(rendered.content_type)
            .body(rendered.body))
    }
}

/// Register the scrape route at `endpoint`.
pub fn metrics_routes(cfg: &mut web::ServiceConfig, endpoint: &str) {
    cfg.route(endpoint, web::get().to(MetricsService::metrics));
}
