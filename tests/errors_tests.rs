use reqmeter::errors::{ReqmeterError, Result};
use std::error::Error;

#[cfg(test)]
mod error_creation_tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let error = ReqmeterError::config("端口无效");

        assert!(matches!(error, ReqmeterError::Config(_)));
        assert_eq!(error.code(), "E001");
        assert!(error.to_string().contains("Configuration Error"));
        assert!(error.to_string().contains("端口无效"));
    }

    #[test]
    fn test_metric_registration_error() {
        let error = ReqmeterError::metric_registration("duplicate");

        assert!(matches!(error, ReqmeterError::MetricRegistration(_)));
        assert_eq!(error.code(), "E002");
    }

    #[test]
    fn test_invalid_labels_error() {
        let error = ReqmeterError::invalid_labels("expected 3 values");

        assert_eq!(error.code(), "E003");
        assert_eq!(error.message(), "expected 3 values");
        assert_eq!(error.error_type(), "Invalid Labels");
    }

    #[test]
    fn test_remaining_codes() {
        assert_eq!(ReqmeterError::encoding("x").code(), "E004");
        assert_eq!(ReqmeterError::runtime("x").code(), "E005");
        assert_eq!(ReqmeterError::file_operation("x").code(), "E006");
    }
}

#[cfg(test)]
mod error_conversion_tests {
    use super::*;

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let error: ReqmeterError = io.into();

        assert!(matches!(error, ReqmeterError::FileOperation(_)));
        assert!(error.message().contains("no such file"));
    }

    #[test]
    fn test_from_prometheus_cardinality_error() {
        let prom = prometheus::Error::InconsistentCardinality { expect: 1, got: 2 };
        let error: ReqmeterError = prom.into();

        assert!(matches!(error, ReqmeterError::InvalidLabels(_)));
        assert!(error.message().contains("expected 1"));
    }

    #[test]
    fn test_from_prometheus_duplicate_error() {
        let error: ReqmeterError = prometheus::Error::AlreadyReg.into();
        assert_eq!(error.code(), "E002");
    }

    #[test]
    fn test_from_utf8_error() {
        let bad = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let error: ReqmeterError = bad.into();
        assert_eq!(error.code(), "E004");
    }

    #[test]
    fn test_question_mark_propagation() {
        fn read_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here.toml")?)
        }

        let error = read_missing().unwrap_err();
        assert_eq!(error.code(), "E006");
    }
}

#[cfg(test)]
mod error_format_tests {
    use super::*;

    #[test]
    fn test_format_simple() {
        let error = ReqmeterError::runtime("no tokio runtime");
        assert_eq!(error.format_simple(), "Runtime Error: no tokio runtime");
        assert_eq!(error.to_string(), error.format_simple());
    }

    #[test]
    fn test_format_colored_contains_code() {
        let error = ReqmeterError::encoding("bad bytes");
        let colored = error.format_colored();
        assert!(colored.contains("E004"));
        assert!(colored.contains("bad bytes"));
    }

    #[test]
    fn test_is_std_error() {
        let error = ReqmeterError::config("x");
        let dyn_error: &dyn Error = &error;
        assert!(dyn_error.source().is_none());
    }
}
