//! Application state management.

use crate::error::CommandError;
use catalog_core::{AppConfig, FilterConfig};
use catalog_source::{source_from_config, CatalogSource};
use catalog_store::{CatalogStore, FilterSelection, PriceRange, StoreError};
use std::sync::Arc;

/// Application state shared across all commands.
pub struct AppState {
    /// Effective configuration (file, env and CLI overrides applied)
    pub config: AppConfig,

    /// The catalog store; shared so loads can run on spawned tasks
    pub store: Arc<CatalogStore>,

    /// Where `load_catalog` fetches from
    pub source: Arc<dyn CatalogSource>,
}

impl AppState {
    /// Build state with the source selected by `config.source`.
    pub fn new(config: AppConfig) -> Result<Self, CommandError> {
        let source = source_from_config(&config)?;
        Self::with_source(config, source)
    }

    /// Build state around an explicit source.
    pub fn with_source(
        config: AppConfig,
        source: Arc<dyn CatalogSource>,
    ) -> Result<Self, CommandError> {
        let filters = default_filters(&config.filters)?;
        tracing::info!(
            source = source.source_id(),
            min_price = filters.price_range.min(),
            max_price = filters.price_range.max(),
            "Application state initialized"
        );

        Ok(Self {
            config,
            store: Arc::new(CatalogStore::with_filters(filters)),
            source,
        })
    }
}

fn default_filters(config: &FilterConfig) -> Result<FilterSelection, StoreError> {
    let range = PriceRange::new(config.default_min_price, config.default_max_price)?;
    Ok(FilterSelection::with_price_range(range))
}
