pub mod health;
pub mod metrics;

pub use health::{HealthService, health_routes};
pub use metrics::{MetricsService, metrics_routes};
