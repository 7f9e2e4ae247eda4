//! Error types for catalog data sources.

use catalog_core::{CatalogError, ConfigError};
use thiserror::Error;

/// Errors that can occur while fetching catalog data.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Non-success HTTP status
    #[error("HTTP error from {endpoint}: status {status}, {message}")]
    Http {
        /// Endpoint name
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The API reported an error inside a successful response
    #[error("API error from {endpoint}: {message}")]
    Api {
        /// Endpoint name
        endpoint: String,
        /// Error message returned by the API
        message: String,
    },

    /// Still rate limited after every retry
    #[error("rate limited by {endpoint} after {attempts} attempts")]
    RateLimited {
        /// Endpoint name
        endpoint: String,
        /// Attempts made
        attempts: u32,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response or field parsing error
    #[error("failed to parse {what}: {message}")]
    Parse {
        /// What was being parsed
        what: String,
        /// Error message
        message: String,
    },

    /// Snapshot file does not exist
    #[error("snapshot file not found at {path}")]
    FileNotFound {
        /// Expected file path
        path: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A value the source depends on is missing or invalid
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Source could not be built from configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SourceError {
    /// Whether retrying the load later could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<SourceError> for CatalogError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Config(config) => CatalogError::Config(config),
            SourceError::Io(io) => CatalogError::Io(io),
            other => CatalogError::Source(other.to_string()),
        }
    }
}

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SourceError::RateLimited {
            endpoint: "ConsultarMarcas".to_string(),
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "rate limited by ConsultarMarcas after 3 attempts"
        );

        let err = SourceError::Http {
            endpoint: "ConsultarModelos".to_string(),
            status: 500,
            message: "Internal Server Error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP error from ConsultarModelos: status 500, Internal Server Error"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(SourceError::RateLimited {
            endpoint: "x".to_string(),
            attempts: 1
        }
        .is_transient());
        assert!(SourceError::Http {
            endpoint: "x".to_string(),
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!SourceError::Http {
            endpoint: "x".to_string(),
            status: 400,
            message: String::new()
        }
        .is_transient());
        assert!(!SourceError::FileNotFound {
            path: "a.json".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_into_catalog_error() {
        let err: CatalogError = SourceError::FileNotFound {
            path: "a.json".to_string(),
        }
        .into();
        assert!(matches!(err, CatalogError::Source(_)));

        let err: CatalogError = SourceError::Config(ConfigError::NoConfigDir).into();
        assert!(matches!(err, CatalogError::Config(_)));
    }
}
