//! HTTP request metrics middleware
//!
//! Calls the observer's pre hook before the inner service and the post hook
//! with the final status and elapsed time once the response is produced.
//! Register it as the outermost `wrap` so it sees every request first.

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

use crate::config::PathLabel;
use crate::metrics::{RequestMetrics, RequestObserver};

/// Path label used in pattern mode when no route matched.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Request metrics middleware factory
#[derive(Clone)]
pub struct RequestMetricsMiddleware {
    observer: Arc<dyn RequestObserver>,
    path_label: PathLabel,
}

impl RequestMetricsMiddleware {
    pub fn new(observer: Arc<dyn RequestObserver>, path_label: PathLabel) -> Self {
        Self {
            observer,
            path_label,
        }
    }

    /// Middleware feeding `metrics`, using its configured path label mode.
    pub fn from_metrics(metrics: Arc<RequestMetrics>) -> Self {
        let path_label = metrics.path_label();
        Self::new(metrics, path_label)
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestMetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestMetricsService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestMetricsService {
            service: Rc::new(service),
            observer: self.observer.clone(),
            path_label: self.path_label,
        }))
    }
}

pub struct RequestMetricsService<S> {
    service: Rc<S>,
    observer: Arc<dyn RequestObserver>,
    path_label: PathLabel,
}

impl<S, B> Service<ServiceRequest> for RequestMetricsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let observer = self.observer.clone();

        let method = method_str(req.method());
        let path = match self.path_label {
            PathLabel::Raw => req.path().to_string(),
            PathLabel::Pattern => req
                .match_pattern()
                .unwrap_or_else(|| UNMATCHED_PATH.to_string()),
        };

        observer.on_request_start(method, &path);
        let start = Instant::now();

        Box::pin(async move {
            let result = srv.call(req).await;

            let status = match &result {
                Ok(response) => response.status(),
                Err(e) => e.as_response_error().status_code(),
            };
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            observer.on_request_end(method, &path, status.as_u16(), elapsed_ms);
            trace!(
                method,
                path = %path,
                status = status.as_u16(),
                elapsed_ms,
                "Request observed"
            );

            result
        })
    }
}

/// Map HTTP method to a static string (avoids allocation).
///
/// Non-standard methods collapse into `OTHER` to bound label cardinality.
pub fn method_str(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        "PATCH" => "PATCH",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => "OTHER",
    }
}
