//! Logging system initialization
//!
//! This module provides functions to initialize the tracing/logging system
//! based on application configuration.

use std::path::{Path, PathBuf};
use tracing_appender::rolling;

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::{ReqmeterError, Result};

const DEFAULT_LOG_FILE_NAME: &str = "reqmeter.log";

/// Split a log file path into its directory and the rolling file prefix.
///
/// `logs/app.log` becomes (`logs`, `app`); a bare file name logs into `.`.
pub fn split_log_path(log_file: &str) -> (PathBuf, String) {
    let path = Path::new(log_file);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(DEFAULT_LOG_FILE_NAME);
    let prefix = filename.trim_end_matches(".log").to_string();
    (dir, prefix)
}

fn build_writer(config: &LoggingConfig) -> Result<Box<dyn std::io::Write + Send + Sync>> {
    let log_file = match config.file.as_deref() {
        Some(f) if !f.is_empty() => f,
        // 未配置文件时输出到控制台
        _ => return Ok(Box::new(std::io::stdout())),
    };

    if config.enable_rotation {
        let (dir, prefix) = split_log_path(log_file);
        let appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(prefix)
            .filename_suffix("log")
            .max_log_files(config.max_backups as usize)
            .build(dir)
            .map_err(|e| {
                ReqmeterError::file_operation(format!(
                    "failed to create rolling log appender: {}",
                    e
                ))
            })?;
        Ok(Box::new(appender))
    } else {
        // Non-rotating, append to file
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        Ok(Box::new(file))
    }
}

/// Initialize logging system based on configuration
///
/// **Note**: This should be called only once during application startup,
/// after the configuration has been loaded.
///
/// # Returns
/// * `WorkerGuard` - Must be kept alive for the duration of the program
///   to ensure non-blocking log writes are flushed
pub fn init_logging(config: &LoggingConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let writer = build_writer(config)?;
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level).map_err(|e| {
        ReqmeterError::config(format!("invalid logging.level '{}': {}", config.level, e))
    })?;

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(config.file.as_ref().is_none_or(|f| f.is_empty()));

    let installed = match config.format {
        LogFormat::Json => subscriber_builder.json().try_init(),
        LogFormat::Text => subscriber_builder.try_init(),
    };
    installed.map_err(|e| ReqmeterError::runtime(format!("failed to install logger: {}", e)))?;

    Ok(guard)
}
