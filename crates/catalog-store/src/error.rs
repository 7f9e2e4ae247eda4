//! Error types for the catalog store.

use catalog_core::CatalogError;
use catalog_source::SourceError;
use thiserror::Error;

/// Errors that can occur in store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A load failed; the previously loaded collections are untouched
    #[error("failed to load catalog from {source_id}: {source}")]
    Load {
        /// Source that was loading
        source_id: String,
        /// Underlying source error
        #[source]
        source: SourceError,
    },

    /// A filter value was rejected
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Load { source, .. } => source.into(),
            StoreError::InvalidFilter(reason) => CatalogError::Validation(reason),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
