//! Catalog Store - the catalog's state container.
//!
//! The store holds the raw collections loaded from a
//! [`CatalogSource`](catalog_source::CatalogSource), the current search text
//! and filter selection, and computes derived views on every read:
//!
//! - the filtered vehicle list
//! - the model years present in the filtered list, most recent first
//! - the price range across all (unfiltered) vehicles
//!
//! # Example
//!
//! ```rust
//! use catalog_core::YearId;
//! use catalog_source::StaticSource;
//! use catalog_store::{CatalogStore, PriceRange};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CatalogStore::new();
//! store.load(&StaticSource::sample()).await?;
//!
//! store.set_price_range(PriceRange::new(46_000.0, 60_000.0)?);
//! let view = store.view();
//! assert_eq!(view.filtered_vehicles().len(), 1);
//! assert_eq!(view.available_years(), vec![YearId(2024)]);
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
pub mod filter;
pub mod store;

// Re-export commonly used types
pub use error::{Result, StoreError};
pub use filter::{
    available_years, filter_vehicles, price_bounds, search_haystack, FilterSelection,
    PriceBounds, PriceRange,
};
pub use store::{CatalogStore, CatalogView, LoadOutcome, LoadState, LoadTicket};
