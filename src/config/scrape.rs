//! Prometheus scrape job generation
//!
//! Renders the `scrape_configs` entry a Prometheus server needs to poll this
//! host's metrics endpoint.

use serde::Serialize;

use super::AppConfig;
use crate::errors::Result;

#[derive(Debug, Serialize)]
struct PrometheusScrapeFile {
    scrape_configs: Vec<ScrapeJob>,
}

#[derive(Debug, Serialize)]
struct ScrapeJob {
    job_name: String,
    scrape_interval: String,
    metrics_path: String,
    static_configs: Vec<StaticTargets>,
}

#[derive(Debug, Serialize)]
struct StaticTargets {
    targets: Vec<String>,
}

/// Render the scrape job for `config` as Prometheus YAML.
pub fn render_scrape_job(config: &AppConfig) -> Result<String> {
    let file = PrometheusScrapeFile {
        scrape_configs: vec![ScrapeJob {
            job_name: config.scrape.job_name.clone(),
            scrape_interval: format!("{}s", config.scrape.interval_secs),
            metrics_path: config.metrics.endpoint.clone(),
            static_configs: vec![StaticTargets {
                targets: vec![config.scrape_target()],
            }],
        }],
    };
    Ok(serde_yaml::to_string(&file)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_scrape_job_defaults() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 8080;

        let yaml = render_scrape_job(&config).unwrap();
        assert!(yaml.contains("job_name: reqmeter"));
        assert!(yaml.contains("scrape_interval: 50s"));
        assert!(yaml.contains("metrics_path: /metrics"));
        assert!(yaml.contains("127.0.0.1:8080"));
    }

    #[test]
    fn test_render_scrape_job_uses_overrides() {
        let mut config = AppConfig::default();
        config.scrape.job_name = "checkout".to_string();
        config.scrape.interval_secs = 15;
        config.scrape.target = Some("checkout.svc:9100".to_string());
        config.metrics.endpoint = "/internal/metrics".to_string();

        let yaml = render_scrape_job(&config).unwrap();
        assert!(yaml.contains("job_name: checkout"));
        assert!(yaml.contains("scrape_interval: 15s"));
        assert!(yaml.contains("metrics_path: /internal/metrics"));
        assert!(yaml.contains("checkout.svc:9100"));
    }
}
