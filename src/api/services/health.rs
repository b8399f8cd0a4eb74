use actix_web::{HttpResponse, Responder, web};
use tracing::trace;

/// Liveness probe
pub struct HealthService;

impl HealthService {
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");
        HttpResponse::Ok().content_type("text/plain").body("ok")
    }
}

pub fn health_routes(cfg: &mut web::ServiceConfig, path: &str) {
    cfg.route(path, web::get().to(HealthService::liveness_check))
        .route(path, web::head().to(HealthService::liveness_check));
}
