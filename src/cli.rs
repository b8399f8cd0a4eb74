//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for reqmeter using clap's derive macros.

use clap::{Parser, Subcommand};

/// Reqmeter - Prometheus request metrics for HTTP services
#[derive(Parser)]
#[command(name = "reqmeter")]
#[command(version)]
#[command(about = "Prometheus request metrics for HTTP services", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (default: config.toml if present)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server with the metrics endpoint (default)
    Serve,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Print a Prometheus scrape job for this server
    ScrapeConfig {
        /// Write the job to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<String>,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,
    },

    /// Load and validate the effective configuration
    Validate,
}
