//! The catalog state store.
//!
//! All state sits behind one `RwLock`. Loaded collections are held as an
//! `Arc<CatalogSnapshot>` that is swapped in a single write, so a reader sees
//! either the previous snapshot or the new one, never a mix. No lock is held
//! across an `.await`.

use crate::error::{Result, StoreError};
use crate::filter::{self, FilterSelection, PriceBounds, PriceRange};
use catalog_core::{
    Brand, BrandId, CatalogSnapshot, Model, ModelId, Vehicle, Year, YearId,
};
use catalog_source::{CatalogSource, SourceError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

/// Lifecycle of the most recently started load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadState {
    /// Nothing loaded yet
    Idle,
    /// A load is in flight; the previous collections remain visible
    Loading {
        /// Generation of the in-flight load
        generation: u64,
    },
    /// The latest load committed its snapshot
    Loaded {
        /// Generation that committed
        generation: u64,
        /// Number of vehicles committed
        vehicles: usize,
        /// Commit time
        loaded_at: DateTime<Utc>,
    },
    /// The latest load failed; the previous collections remain visible
    Failed {
        /// Generation that failed
        generation: u64,
        /// Error description
        message: String,
        /// Failure time
        failed_at: DateTime<Utc>,
    },
}

/// Result of a load that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// The snapshot was committed
    Committed {
        /// Generation that committed
        generation: u64,
        /// Number of vehicles committed
        vehicles: usize,
    },
    /// A newer load was started meanwhile; this result was discarded
    Superseded {
        /// Generation of the discarded load
        generation: u64,
        /// Generation of the newest load
        latest: u64,
    },
}

/// Proof that a load was started, redeemed by [`CatalogStore::commit_load`].
#[derive(Debug)]
#[must_use = "a started load must be committed"]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    /// Generation assigned to this load.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct StoreState {
    data: Arc<CatalogSnapshot>,
    search_query: String,
    filters: FilterSelection,
    load_state: LoadState,
    latest_generation: u64,
}

/// Catalog state container.
///
/// Holds the raw collections, the search text and the filter selection.
/// Derived views are computed on read from a [`CatalogView`].
pub struct CatalogStore {
    state: RwLock<StoreState>,
    /// Selection restored by [`CatalogStore::clear_filters`]
    default_filters: FilterSelection,
}

impl CatalogStore {
    /// Create an empty store with the default filter selection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_filters(FilterSelection::default())
    }

    /// Create an empty store whose initial (and cleared) selection is `filters`.
    #[must_use]
    pub fn with_filters(filters: FilterSelection) -> Self {
        Self {
            state: RwLock::new(StoreState {
                data: Arc::new(CatalogSnapshot::default()),
                search_query: String::new(),
                filters: filters.clone(),
                load_state: LoadState::Idle,
                latest_generation: 0,
            }),
            default_filters: filters,
        }
    }

    // Writers never leave the state half-updated, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the search text. Any string is accepted.
    pub fn set_search_query(&self, query: impl Into<String>) {
        self.write().search_query = query.into();
    }

    /// Current search text.
    #[must_use]
    pub fn search_query(&self) -> String {
        self.read().search_query.clone()
    }

    /// Current filter selection.
    #[must_use]
    pub fn filters(&self) -> FilterSelection {
        self.read().filters.clone()
    }

    /// Replace the whole filter selection.
    pub fn set_filters(&self, filters: FilterSelection) {
        self.write().filters = filters;
    }

    /// Set or unset the brand filter.
    pub fn set_brand_filter(&self, brand: Option<BrandId>) {
        self.write().filters.brand = brand;
    }

    /// Set or unset the model filter.
    pub fn set_model_filter(&self, model: Option<ModelId>) {
        self.write().filters.model = model;
    }

    /// Set or unset the year filter.
    pub fn set_year_filter(&self, year: Option<YearId>) {
        self.write().filters.year = year;
    }

    /// Replace the price range.
    pub fn set_price_range(&self, price_range: PriceRange) {
        self.write().filters.price_range = price_range;
    }

    /// Selection the store was created with.
    #[must_use]
    pub fn default_filters(&self) -> &FilterSelection {
        &self.default_filters
    }

    /// Restore the initial filter selection. The search text is kept.
    pub fn clear_filters(&self) {
        self.write().filters = self.default_filters.clone();
    }

    /// The currently committed collections.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.read().data)
    }

    /// State of the most recently started load.
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.read().load_state.clone()
    }

    /// A consistent read of data, search text and filters.
    #[must_use]
    pub fn view(&self) -> CatalogView {
        let state = self.read();
        CatalogView {
            data: Arc::clone(&state.data),
            search_query: state.search_query.clone(),
            filters: state.filters.clone(),
        }
    }

    /// Vehicles passing the current search text and filters.
    #[must_use]
    pub fn filtered_vehicles(&self) -> Vec<Vehicle> {
        self.view()
            .filtered_vehicles()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Model years of the filtered vehicles, most recent first.
    #[must_use]
    pub fn available_years(&self) -> Vec<YearId> {
        self.view().available_years()
    }

    /// Price bounds across all loaded vehicles; `None` when there are none.
    #[must_use]
    pub fn price_bounds(&self) -> Option<PriceBounds> {
        self.view().price_bounds()
    }

    /// Fetch a snapshot from `source` and commit it.
    ///
    /// While the fetch is pending the previous collections stay visible. If
    /// another load is started before this one finishes, this result is
    /// discarded and `LoadOutcome::Superseded` is returned.
    ///
    /// # Errors
    /// Returns `StoreError::Load` if this is still the newest load and the
    /// source failed. The previous collections are kept.
    pub async fn load<S>(&self, source: &S) -> Result<LoadOutcome>
    where
        S: CatalogSource + ?Sized,
    {
        let ticket = self.begin_load();
        let result = source.fetch().await;
        self.commit_load(ticket, source.source_id(), result)
    }

    /// Start a load, superseding any load still in flight.
    pub fn begin_load(&self) -> LoadTicket {
        let mut state = self.write();
        state.latest_generation += 1;
        let generation = state.latest_generation;
        state.load_state = LoadState::Loading { generation };

        info!(generation, "Catalog load started");
        LoadTicket { generation }
    }

    /// Finish a load started with [`CatalogStore::begin_load`].
    ///
    /// # Errors
    /// Returns `StoreError::Load` when `result` is an error and the ticket is
    /// still the newest load.
    pub fn commit_load(
        &self,
        ticket: LoadTicket,
        source_id: &str,
        result: std::result::Result<CatalogSnapshot, SourceError>,
    ) -> Result<LoadOutcome> {
        let mut state = self.write();
        let generation = ticket.generation;
        let latest = state.latest_generation;

        if generation != latest {
            warn!(
                generation,
                latest,
                source = source_id,
                "Discarding result of superseded catalog load"
            );
            return Ok(LoadOutcome::Superseded { generation, latest });
        }

        match result {
            Ok(snapshot) => {
                let vehicles = snapshot.vehicles.len();
                info!(
                    generation,
                    source = source_id,
                    vehicles,
                    brands = snapshot.brands.len(),
                    models = snapshot.models.len(),
                    years = snapshot.years.len(),
                    "Catalog loaded"
                );

                state.data = Arc::new(snapshot);
                state.load_state = LoadState::Loaded {
                    generation,
                    vehicles,
                    loaded_at: Utc::now(),
                };
                Ok(LoadOutcome::Committed {
                    generation,
                    vehicles,
                })
            }
            Err(source) => {
                warn!(
                    generation,
                    source = source_id,
                    error = %source,
                    "Catalog load failed, keeping previous data"
                );

                state.load_state = LoadState::Failed {
                    generation,
                    message: source.to_string(),
                    failed_at: Utc::now(),
                };
                Err(StoreError::Load {
                    source_id: source_id.to_string(),
                    source,
                })
            }
        }
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A consistent read of the store on which derived views are computed.
#[derive(Debug, Clone)]
pub struct CatalogView {
    data: Arc<CatalogSnapshot>,
    search_query: String,
    filters: FilterSelection,
}

impl CatalogView {
    /// Raw collections.
    #[must_use]
    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.data
    }

    /// Search text at the time of the read.
    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Filter selection at the time of the read.
    #[must_use]
    pub fn filters(&self) -> &FilterSelection {
        &self.filters
    }

    /// Vehicles passing the search text and filters, in load order.
    #[must_use]
    pub fn filtered_vehicles(&self) -> Vec<&Vehicle> {
        filter::filter_vehicles(&self.data, &self.search_query, &self.filters)
    }

    /// Model years present in [`CatalogView::filtered_vehicles`], most recent first.
    #[must_use]
    pub fn available_years(&self) -> Vec<YearId> {
        filter::available_years(&self.filtered_vehicles())
    }

    /// Price bounds across all vehicles, ignoring filters.
    #[must_use]
    pub fn price_bounds(&self) -> Option<PriceBounds> {
        filter::price_bounds(&self.data.vehicles)
    }

    /// Brand by id.
    #[must_use]
    pub fn brand(&self, id: BrandId) -> Option<&Brand> {
        self.data.brands.iter().find(|brand| brand.id == id)
    }

    /// Model by id.
    #[must_use]
    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.data.models.iter().find(|model| model.id == id)
    }

    /// Brand display name, if the id resolves.
    #[must_use]
    pub fn brand_name(&self, id: BrandId) -> Option<&str> {
        self.brand(id).map(|brand| brand.name.as_str())
    }

    /// Model display name, if the id resolves.
    #[must_use]
    pub fn model_name(&self, id: ModelId) -> Option<&str> {
        self.model(id).map(|model| model.name.as_str())
    }

    /// Models owned by a brand.
    #[must_use]
    pub fn models_for_brand(&self, brand: BrandId) -> Vec<&Model> {
        self.data
            .models
            .iter()
            .filter(|model| model.brand_id == brand)
            .collect()
    }

    /// Year entries owned by a model.
    #[must_use]
    pub fn years_for_model(&self, model: ModelId) -> Vec<&Year> {
        self.data
            .years
            .iter()
            .filter(|year| year.model_id == model)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_source::StaticSource;

    #[test]
    fn test_new_store_is_empty() {
        let store = CatalogStore::new();
        assert!(store.snapshot().is_empty());
        assert_eq!(store.load_state(), LoadState::Idle);
        assert!(store.search_query().is_empty());
        assert_eq!(store.filters(), FilterSelection::default());
        assert!(store.filtered_vehicles().is_empty());
        assert!(store.available_years().is_empty());
        assert_eq!(store.price_bounds(), None);
    }

    #[tokio::test]
    async fn test_load_commits_snapshot() {
        let store = CatalogStore::new();
        let outcome = store
            .load(&StaticSource::sample())
            .await
            .expect("load sample");

        assert_eq!(
            outcome,
            LoadOutcome::Committed {
                generation: 1,
                vehicles: 2
            }
        );
        assert!(matches!(
            store.load_state(),
            LoadState::Loaded {
                generation: 1,
                vehicles: 2,
                ..
            }
        ));
        assert_eq!(store.snapshot().brands.len(), 1);
    }

    #[test]
    fn test_mutations() {
        let store = CatalogStore::new();
        store.set_search_query("Corolla");
        store.set_brand_filter(Some(BrandId(1)));
        store.set_model_filter(Some(ModelId(2)));
        store.set_year_filter(Some(YearId(2024)));
        store.set_price_range(PriceRange::new(1.0, 2.0).expect("valid range"));

        let filters = store.filters();
        assert_eq!(store.search_query(), "Corolla");
        assert_eq!(filters.brand, Some(BrandId(1)));
        assert_eq!(filters.model, Some(ModelId(2)));
        assert_eq!(filters.year, Some(YearId(2024)));
        assert!((filters.price_range.max() - 2.0).abs() < f64::EPSILON);

        store.clear_filters();
        assert_eq!(store.filters(), FilterSelection::default());
        assert_eq!(store.search_query(), "Corolla");
    }

    #[test]
    fn test_clear_restores_configured_defaults() {
        let defaults =
            FilterSelection::with_price_range(PriceRange::new(10.0, 20.0).expect("valid range"));
        let store = CatalogStore::with_filters(defaults.clone());
        store.set_year_filter(Some(YearId(2020)));
        store.clear_filters();
        assert_eq!(store.filters(), defaults);
    }

    #[test]
    fn test_view_is_isolated_from_later_mutations() {
        let store = CatalogStore::new();
        let ticket = store.begin_load();
        let snapshot = CatalogSnapshot {
            vehicles: vec![Vehicle {
                brand_id: BrandId(1),
                model_id: ModelId(1),
                year_id: YearId(2024),
                reference_table_id: catalog_core::ReferenceTableId(1),
                tech_code: "X".to_string(),
                fuel: "Flex".to_string(),
                price: 10.0,
            }],
            ..CatalogSnapshot::default()
        };
        store
            .commit_load(ticket, "test", Ok(snapshot))
            .expect("commit");

        let view = store.view();
        store.set_search_query("nothing matches this");

        assert_eq!(view.filtered_vehicles().len(), 1);
        assert!(store.filtered_vehicles().is_empty());
    }

    #[tokio::test]
    async fn test_lookups() {
        let store = CatalogStore::new();
        store
            .load(&StaticSource::sample())
            .await
            .expect("load sample");

        let view = store.view();
        assert_eq!(view.brand_name(BrandId(1)), Some("Toyota"));
        assert_eq!(view.model_name(ModelId(1)), Some("Corolla"));
        assert_eq!(view.brand_name(BrandId(99)), None);
        assert_eq!(view.models_for_brand(BrandId(1)).len(), 1);
        assert!(view.models_for_brand(BrandId(2)).is_empty());
        assert_eq!(view.years_for_model(ModelId(1)).len(), 2);
    }
}
