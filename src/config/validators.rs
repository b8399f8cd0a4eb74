//! 配置值验证模块
//!
//! 启动时校验配置，任何错误都直接返回，不做静默回退。

use super::{MetricsConfig, ScrapeConfig, ServerConfig};
use crate::errors::{ReqmeterError, Result};
use crate::metrics::labels::is_valid_metric_name;
use crate::metrics::summary::MAX_AGE_BUCKETS;

/// 验证路由路径（必须以 `/` 开头）
pub fn validate_route_path(key: &str, path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(ReqmeterError::config(format!(
            "{} must start with '/': '{}'",
            key, path
        )));
    }
    Ok(())
}

pub fn validate_server(server: &ServerConfig) -> Result<()> {
    if server.workers == 0 {
        return Err(ReqmeterError::config("server.workers must be at least 1"));
    }
    validate_route_path("server.health_path", &server.health_path)
}

pub fn validate_metrics(metrics: &MetricsConfig) -> Result<()> {
    validate_route_path("metrics.endpoint", &metrics.endpoint)?;
    for path in &metrics.excluded_paths {
        validate_route_path("metrics.excluded_paths", path)?;
    }

    // 空命名空间表示不加前缀
    if !metrics.namespace.is_empty() && !is_valid_metric_name(&metrics.namespace) {
        return Err(ReqmeterError::config(format!(
            "metrics.namespace is not a valid metric name prefix: '{}'",
            metrics.namespace
        )));
    }

    let invalid: Vec<f64> = metrics
        .quantiles
        .iter()
        .copied()
        .filter(|q| !(*q > 0.0 && *q < 1.0))
        .collect();
    if !invalid.is_empty() {
        return Err(ReqmeterError::config(format!(
            "metrics.quantiles must lie strictly between 0 and 1, got {:?}",
            invalid
        )));
    }

    if metrics.max_age_secs == 0 {
        return Err(ReqmeterError::config("metrics.max_age_secs must be positive"));
    }
    if metrics.age_buckets == 0 {
        return Err(ReqmeterError::config("metrics.age_buckets must be at least 1"));
    }
    if metrics.age_buckets > MAX_AGE_BUCKETS {
        return Err(ReqmeterError::config(format!(
            "metrics.age_buckets must be at most {}, got {}",
            MAX_AGE_BUCKETS, metrics.age_buckets
        )));
    }
    if metrics.max_samples_per_bucket == 0 {
        return Err(ReqmeterError::config(
            "metrics.max_samples_per_bucket must be at least 1",
        ));
    }
    if metrics.collect_interval_secs == 0 {
        return Err(ReqmeterError::config(
            "metrics.collect_interval_secs must be positive",
        ));
    }
    Ok(())
}

pub fn validate_scrape(scrape: &ScrapeConfig) -> Result<()> {
    if scrape.job_name.trim().is_empty() {
        return Err(ReqmeterError::config("scrape.job_name must not be empty"));
    }
    if scrape.interval_secs == 0 {
        return Err(ReqmeterError::config("scrape.interval_secs must be positive"));
    }
    Ok(())
}
