use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReqmeterError {
    Config(String),
    MetricRegistration(String),
    InvalidLabels(String),
    Encoding(String),
    Runtime(String),
    FileOperation(String),
}

impl ReqmeterError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ReqmeterError::Config(_) => "E001",
            ReqmeterError::MetricRegistration(_) => "E002",
            ReqmeterError::InvalidLabels(_) => "E003",
            ReqmeterError::Encoding(_) => "E004",
            ReqmeterError::Runtime(_) => "E005",
            ReqmeterError::FileOperation(_) => "E006",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ReqmeterError::Config(_) => "Configuration Error",
            ReqmeterError::MetricRegistration(_) => "Metric Registration Error",
            ReqmeterError::InvalidLabels(_) => "Invalid Labels",
            ReqmeterError::Encoding(_) => "Encoding Error",
            ReqmeterError::Runtime(_) => "Runtime Error",
            ReqmeterError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ReqmeterError::Config(msg) => msg,
            ReqmeterError::MetricRegistration(msg) => msg,
            ReqmeterError::InvalidLabels(msg) => msg,
            ReqmeterError::Encoding(msg) => msg,
            ReqmeterError::Runtime(msg) => msg,
            ReqmeterError::FileOperation(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ReqmeterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ReqmeterError {}

// 便捷的构造函数
impl ReqmeterError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        ReqmeterError::Config(msg.into())
    }

    pub fn metric_registration<T: Into<String>>(msg: T) -> Self {
        ReqmeterError::MetricRegistration(msg.into())
    }

    pub fn invalid_labels<T: Into<String>>(msg: T) -> Self {
        ReqmeterError::InvalidLabels(msg.into())
    }

    pub fn encoding<T: Into<String>>(msg: T) -> Self {
        ReqmeterError::Encoding(msg.into())
    }

    pub fn runtime<T: Into<String>>(msg: T) -> Self {
        ReqmeterError::Runtime(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ReqmeterError::FileOperation(msg.into())
    }
}

impl From<prometheus::Error> for ReqmeterError {
    fn from(err: prometheus::Error) -> Self {
        match err {
            prometheus::Error::InconsistentCardinality { expect, got } => {
                ReqmeterError::InvalidLabels(format!(
                    "inconsistent label cardinality: expected {} values, got {}",
                    expect, got
                ))
            }
            other => ReqmeterError::MetricRegistration(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for ReqmeterError {
    fn from(err: config::ConfigError) -> Self {
        ReqmeterError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ReqmeterError {
    fn from(err: std::io::Error) -> Self {
        ReqmeterError::FileOperation(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for ReqmeterError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        ReqmeterError::Encoding(err.to_string())
    }
}

impl From<serde_yaml::Error> for ReqmeterError {
    fn from(err: serde_yaml::Error) -> Self {
        ReqmeterError::Encoding(err.to_string())
    }
}

impl From<toml::ser::Error> for ReqmeterError {
    fn from(err: toml::ser::Error) -> Self {
        ReqmeterError::Encoding(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReqmeterError>;
