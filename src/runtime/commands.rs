//! One-shot commands: config generation, validation and scrape job output

use colored::Colorize;
use std::path::Path;

use crate::config::{AppConfig, render_scrape_job};
use crate::errors::Result;

/// Default output of `config generate`.
pub const DEFAULT_EXAMPLE_CONFIG_PATH: &str = "config.example.toml";

/// Write an example configuration file with every default spelled out.
pub fn generate_config(output_path: Option<String>) -> Result<String> {
    let path = output_path.unwrap_or_else(|| DEFAULT_EXAMPLE_CONFIG_PATH.to_string());

    if Path::new(&path).exists() {
        println!("{} {}", "Overwriting existing file:".yellow(), path.blue());
    }

    AppConfig::default().save_to_file(&path)?;
    println!(
        "  {} {}",
        "Configuration file generated successfully".green(),
        path.blue()
    );
    Ok(path)
}

/// Load the effective configuration and report the outcome.
pub fn validate_config(path: Option<&str>) -> Result<AppConfig> {
    let config = AppConfig::load(path)?;
    println!("{}", "Configuration is valid".green());
    println!(
        "  {} {}:{}",
        "server:".dimmed(),
        config.server.host,
        config.server.port
    );
    println!(
        "  {} {} ({} mode)",
        "metrics:".dimmed(),
        config.metrics.endpoint,
        config.metrics.path_label
    );
    Ok(config)
}

/// Print the Prometheus scrape job, or write it to `output`.
pub fn write_scrape_config(config: &AppConfig, output: Option<&str>) -> Result<()> {
    let yaml = render_scrape_job(config)?;
    match output {
        Some(path) => {
            std::fs::write(path, &yaml)?;
            println!("{} {}", "Scrape job written to".green(), path.blue());
        }
        None => print!("{}", yaml),
    }
    Ok(())
}
