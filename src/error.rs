//! Error types for drainwatch
//!
//! `AppError` covers the process and HTTP boundary and implements
//! `IntoResponse` for Axum handlers. `RecordError` covers a single drain line.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Drain token mismatch")]
    TokenMismatch,

    #[error("Method {method} not allowed on {path}")]
    BadMethod { method: String, path: String },

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::TokenMismatch | Self::BadMethod { .. } => StatusCode::BAD_REQUEST,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Metrics(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

/// Failure to turn one drain line (or one of its values) into data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("malformed record: no \" - \" delimiter between header and body")]
    MissingDelimiter,

    #[error("malformed record: header has {found} tokens, expected 6")]
    ShortHeader { found: usize },

    #[error("cannot decode {value:?} with the {decoder} decoder")]
    Decode { value: String, decoder: &'static str },
}

impl RecordError {
    /// Whether the whole line is unusable, as opposed to a single value
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MissingDelimiter | Self::ShortHeader { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_creates() {
        let err = AppError::Config("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_validation_failed_names_path() {
        let err = AppError::ConfigValidationFailed {
            path: "drainwatch.toml".to_string(),
            reason: "logs_path must start with '/'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration in drainwatch.toml: logs_path must start with '/'"
        );
    }

    #[test]
    fn test_token_mismatch_response_status() {
        let response = AppError::TokenMismatch.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_bad_method_response_status() {
        let err = AppError::BadMethod {
            method: "GET".to_string(),
            path: "/logs".to_string(),
        };
        assert_eq!(err.to_string(), "Method GET not allowed on /logs");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_metrics_error_converts_and_maps_to_500() {
        let err: AppError = prometheus::Error::Msg("boom".to_string()).into();
        assert!(matches!(err, AppError::Metrics(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_response_status() {
        let err = AppError::Internal("test".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_record_error_classification() {
        assert!(RecordError::MissingDelimiter.is_malformed());
        assert!(RecordError::ShortHeader { found: 3 }.is_malformed());
        assert!(
            !RecordError::Decode {
                value: "x".to_string(),
                decoder: "number"
            }
            .is_malformed()
        );
    }

    #[test]
    fn test_short_header_message() {
        let err = RecordError::ShortHeader { found: 5 };
        assert_eq!(
            err.to_string(),
            "malformed record: header has 5 tokens, expected 6"
        );
    }
}
