//! Catalog Core - Foundation crate for the fipe-catalog workspace.
//!
//! This crate provides the domain types, error handling and configuration
//! management that the store, the data sources and the application shell
//! depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Id newtypes and catalog entities (`Vehicle`, `Brand`, `Model`, `Year`)
//!
//! # Example
//!
//! ```rust
//! use catalog_core::{AppConfig, SourceKind};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.source.kind, SourceKind::Sample);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, FilterConfig, FipeConfig, LoggingConfig, SourceConfig, SourceKind};
pub use error::{CatalogError, ConfigError, ConfigResult, Result};
pub use types::{
    Brand, BrandId, CatalogSnapshot, Model, ModelId, ReferenceTable, ReferenceTableId, Vehicle,
    Year, YearId,
};
