//! Catalog Source - where catalog data comes from.
//!
//! The store never talks to a data provider directly; it asks a
//! [`CatalogSource`] for a complete [`CatalogSnapshot`](catalog_core::CatalogSnapshot)
//! and commits it as a unit.
//!
//! # Sources
//!
//! - [`StaticSource`] - a fixed snapshot, including the built-in sample catalog
//! - [`JsonFileSource`] - a snapshot stored as JSON on disk
//! - [`FipeSource`] - the live FIPE price-table API, through [`FipeClient`]
//!
//! # Example
//!
//! ```rust
//! use catalog_source::{CatalogSource, StaticSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = StaticSource::sample();
//! let snapshot = source.fetch().await?;
//! assert_eq!(snapshot.vehicles.len(), 2);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod fipe;
pub mod source;

// Re-export commonly used types
pub use error::{Result, SourceError};
pub use fipe::{
    parse_brl_price, parse_year_code, FipeClient, FipePrice, FipeSource, FipeYear, RateLimiter,
    RequestStats,
};
pub use source::{source_from_config, CatalogSource, JsonFileSource, StaticSource};
