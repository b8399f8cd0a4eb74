//! Execution modes
//!
//! - `server`: the HTTP server with the metrics endpoint
//! - `commands`: one-shot configuration commands

pub mod commands;
pub mod server;

pub use commands::{generate_config, validate_config, write_scrape_config};
pub use server::{build_metrics, run_server};
