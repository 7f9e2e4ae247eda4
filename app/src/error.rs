//! Error types for commands.

use catalog_core::ConfigError;
use catalog_source::SourceError;
use catalog_store::StoreError;
use serde::Serialize;
use std::fmt;

/// Serializable error returned by every command.
#[derive(Debug, Serialize)]
pub struct CommandError {
    /// Error code for frontend handling (e.g., "LOAD_FAILED")
    pub code: String,
    /// User-friendly error message
    pub message: String,
    /// Optional debugging context
    pub details: Option<serde_json::Value>,
}

impl CommandError {
    /// Create a new command error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a command error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CommandError {}

/// Convert StoreError to CommandError for serialization.
impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Load { source_id, source } => Self::with_details(
                "LOAD_FAILED",
                format!("Failed to load catalog: {source}"),
                serde_json::json!({
                    "source": source_id,
                    "transient": source.is_transient(),
                }),
            ),
            StoreError::InvalidFilter(msg) => {
                Self::new("INVALID_FILTER", format!("Invalid filter: {msg}"))
            }
        }
    }
}

impl From<SourceError> for CommandError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::FileNotFound { path } => Self::with_details(
                "SNAPSHOT_NOT_FOUND",
                "Snapshot file does not exist",
                serde_json::json!({ "path": path }),
            ),
            SourceError::InvalidValue { field, reason } => Self::with_details(
                "INVALID_SOURCE_CONFIG",
                format!("Invalid value for {field}: {reason}"),
                serde_json::json!({ "field": field }),
            ),
            other => Self::new("SOURCE_ERROR", format!("Data source error: {other}")),
        }
    }
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => Self::with_details(
                "CONFIG_NOT_FOUND",
                "Config file does not exist",
                serde_json::json!({ "path": path }),
            ),
            other => Self::new("CONFIG_ERROR", format!("Configuration error: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_new() {
        let err = CommandError::new("TEST_CODE", "Test message");
        assert_eq!(err.code, "TEST_CODE");
        assert_eq!(err.message, "Test message");
        assert!(err.details.is_none());
        assert_eq!(err.to_string(), "TEST_CODE: Test message");
    }

    #[test]
    fn test_load_error_conversion() {
        let err: CommandError = StoreError::Load {
            source_id: "fipe".to_string(),
            source: SourceError::RateLimited {
                endpoint: "ConsultarMarcas".to_string(),
                attempts: 3,
            },
        }
        .into();

        assert_eq!(err.code, "LOAD_FAILED");
        let details = err.details.expect("details");
        assert_eq!(details["source"], "fipe");
        assert_eq!(details["transient"], true);
    }

    #[test]
    fn test_invalid_filter_conversion() {
        let err: CommandError = StoreError::InvalidFilter("min above max".to_string()).into();
        assert_eq!(err.code, "INVALID_FILTER");
        assert!(err.message.contains("min above max"));
    }

    #[test]
    fn test_snapshot_not_found_conversion() {
        let err: CommandError = SourceError::FileNotFound {
            path: "/tmp/catalog.json".to_string(),
        }
        .into();
        assert_eq!(err.code, "SNAPSHOT_NOT_FOUND");
        assert!(err.details.is_some());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: CommandError = ConfigError::InvalidValue {
            field: "filters".to_string(),
            reason: "bad".to_string(),
        }
        .into();
        assert_eq!(err.code, "CONFIG_ERROR");
    }

    #[test]
    fn test_error_serialization() {
        let err = CommandError::new("TEST_CODE", "Test message");
        let json = serde_json::to_string(&err).expect("serialize error");
        assert!(json.contains("TEST_CODE"));
        assert!(json.contains("Test message"));
    }
}
