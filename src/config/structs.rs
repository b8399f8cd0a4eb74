use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

use crate::errors::{ReqmeterError, Result};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀，例如 `REQMETER__SERVER__PORT=9999`
pub const ENV_PREFIX: &str = "REQMETER";

/// How the `path` label is derived from a request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PathLabel {
    /// The request path as received, e.g. `/users/42`.
    #[default]
    Raw,
    /// The matched route pattern, e.g. `/users/{id}`.
    Pattern,
}

impl std::fmt::Display for PathLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for PathLabel {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PathLabel::iter()
            .find(|v| v.as_ref().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let valid: Vec<String> =
                    PathLabel::iter().map(|v| v.as_ref().to_string()).collect();
                format!("Invalid path label mode: '{}'. Valid: {}", s, valid.join(", "))
            })
    }
}

/// 日志输出格式
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 应用配置（从 TOML 加载，启动时使用）
///
/// - server: 监听地址、端口、worker 数量
/// - logging: 日志配置
/// - metrics: 指标采集配置
/// - scrape: Prometheus 抓取任务配置
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
}

impl AppConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > 配置文件 > 默认值
    /// ENV 前缀：REQMETER，分隔符：__
    /// 显式指定的配置文件必须存在；默认的 `config.toml` 可以缺省。
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_with_env(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(path: Option<&str>, env: config::Environment) -> Result<Self> {
        use config::{Config, File};

        let file = match path {
            Some(p) => File::with_name(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                env.separator("__")
                    .list_separator(",")
                    .with_list_parse_key("metrics.excluded_paths")
                    .with_list_parse_key("metrics.quantiles")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every section, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        super::validators::validate_server(&self.server)?;
        super::validators::validate_metrics(&self.metrics)?;
        super::validators::validate_scrape(&self.scrape)?;

        if self.server.health_path == self.metrics.endpoint {
            return Err(ReqmeterError::config(format!(
                "server.health_path and metrics.endpoint must differ (both '{}')",
                self.metrics.endpoint
            )));
        }
        Ok(())
    }

    /// `host:port` the scrape job should poll.
    pub fn scrape_target(&self) -> String {
        match self.scrape.target.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("{}:{}", self.server.host, self.server.port),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 指标采集配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsConfig {
    /// Prefix for the request metrics; empty means no prefix.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Scrape endpoint. Always excluded from counting.
    #[serde(default = "default_metrics_endpoint")]
    pub endpoint: String,
    /// Additional exact paths that are not counted.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub path_label: PathLabel,
    #[serde(default = "default_quantiles")]
    pub quantiles: Vec<f64>,
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    #[serde(default = "default_age_buckets")]
    pub age_buckets: usize,
    #[serde(default = "default_max_samples_per_bucket")]
    pub max_samples_per_bucket: usize,
    /// Refresh period of the process-level metrics.
    #[serde(default = "default_collect_interval_secs")]
    pub collect_interval_secs: u64,
}

/// Prometheus 抓取任务配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeConfig {
    #[serde(default = "default_job_name")]
    pub job_name: String,
    #[serde(default = "default_scrape_interval_secs")]
    pub interval_secs: u64,
    /// `host:port` override; falls back to the server address.
    #[serde(default)]
    pub target: Option<String>,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_namespace() -> String {
    "reqmeter".to_string()
}

fn default_metrics_endpoint() -> String {
    "/metrics".to_string()
}

fn default_quantiles() -> Vec<f64> {
    vec![0.01, 0.05, 0.5, 0.9, 0.95, 0.99, 0.999]
}

fn default_max_age_secs() -> u64 {
    600
}

fn default_age_buckets() -> usize {
    5
}

fn default_max_samples_per_bucket() -> usize {
    2048
}

fn default_collect_interval_secs() -> u64 {
    10
}

fn default_job_name() -> String {
    "reqmeter".to_string()
}

fn default_scrape_interval_secs() -> u64 {
    50
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            workers: default_workers(),
            health_path: default_health_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            endpoint: default_metrics_endpoint(),
            excluded_paths: Vec::new(),
            path_label: PathLabel::default(),
            quantiles: default_quantiles(),
            max_age_secs: default_max_age_secs(),
            age_buckets: default_age_buckets(),
            max_samples_per_bucket: default_max_samples_per_bucket(),
            collect_interval_secs: default_collect_interval_secs(),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            job_name: default_job_name(),
            interval_secs: default_scrape_interval_secs(),
            target: None,
        }
    }
}
