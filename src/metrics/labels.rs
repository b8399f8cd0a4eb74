//! Label helpers shared by the exposition renderer and metric definitions.

use crate::errors::{ReqmeterError, Result};

/// Label reserved by summaries for their quantile lines.
pub const QUANTILE_LABEL: &str = "quantile";

/// Metric names follow `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Label names follow `[a-zA-Z_][a-zA-Z0-9_]*` and may not start with `__`.
pub fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Join `namespace` and `name` with an underscore; an empty namespace adds nothing.
pub fn metric_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}_{}", namespace, name)
    }
}

/// Validate the label names of one metric definition.
pub fn validate_label_names(metric: &str, names: &[String], reserved: &[&str]) -> Result<()> {
    for (i, name) in names.iter().enumerate() {
        if !is_valid_label_name(name) {
            return Err(ReqmeterError::invalid_labels(format!(
                "metric '{}' has invalid label name '{}'",
                metric, name
            )));
        }
        if reserved.contains(&name.as_str()) {
            return Err(ReqmeterError::invalid_labels(format!(
                "metric '{}' may not use reserved label '{}'",
                metric, name
            )));
        }
        if names[..i].contains(name) {
            return Err(ReqmeterError::invalid_labels(format!(
                "metric '{}' declares label '{}' twice",
                metric, name
            )));
        }
    }
    Ok(())
}

/// Escape a label value for the text exposition format.
pub fn escape_label_value(v: &str) -> String {
    v.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Format a sample value the way Prometheus parses it.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

/// Render `{k="v",...}`; empty pairs render nothing.
pub fn render_label_pairs(pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let body = pairs
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{}}}", body)
}
