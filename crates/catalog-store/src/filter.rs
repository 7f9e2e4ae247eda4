//! Filter selection and the pure derived-view computations.
//!
//! Everything here is a function of a snapshot plus the search/filter state,
//! so results can be recomputed on every read without caching.

use crate::error::{Result, StoreError};
use catalog_core::{Brand, BrandId, CatalogSnapshot, Model, ModelId, Vehicle, YearId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Inclusive price bounds used as a filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    /// Create a range. Both bounds are inclusive.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidFilter` if a bound is not finite or `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(StoreError::InvalidFilter(format!(
                "price bounds must be finite, got [{min}, {max}]"
            )));
        }
        if min > max {
            return Err(StoreError::InvalidFilter(format!(
                "minimum price {min} is above maximum price {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Whether `price` lies within the range. NaN never does.
    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100_000.0,
        }
    }
}

impl TryFrom<[f64; 2]> for PriceRange {
    type Error = StoreError;

    fn try_from([min, max]: [f64; 2]) -> Result<Self> {
        Self::new(min, max)
    }
}

impl From<PriceRange> for [f64; 2] {
    fn from(range: PriceRange) -> Self {
        [range.min, range.max]
    }
}

/// Minimum and maximum price across a set of vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBounds {
    /// Lowest price
    pub min: f64,
    /// Highest price
    pub max: f64,
}

/// The user's filter selection, applied conjunctively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    /// Keep only this brand
    pub brand: Option<BrandId>,
    /// Keep only this model
    pub model: Option<ModelId>,
    /// Keep only this model year
    pub year: Option<YearId>,
    /// Keep only prices inside this range
    pub price_range: PriceRange,
}

impl FilterSelection {
    /// A selection with no id filters and the given price range.
    #[must_use]
    pub fn with_price_range(price_range: PriceRange) -> Self {
        Self {
            price_range,
            ..Self::default()
        }
    }

    /// Whether `vehicle` passes the id and price filters (search excluded).
    #[must_use]
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        self.brand.map_or(true, |brand| vehicle.brand_id == brand)
            && self.model.map_or(true, |model| vehicle.model_id == model)
            && self.year.map_or(true, |year| vehicle.year_id == year)
            && self.price_range.contains(vehicle.price)
    }
}

/// Lowercased search text for a vehicle: `"{brand} {model} {year} {fuel}"`.
///
/// Unresolved brand or model names contribute an empty string.
#[must_use]
pub fn search_haystack(vehicle: &Vehicle, brand_name: Option<&str>, model_name: Option<&str>) -> String {
    format!(
        "{} {} {} {}",
        brand_name.unwrap_or_default(),
        model_name.unwrap_or_default(),
        vehicle.year_id,
        vehicle.fuel
    )
    .to_lowercase()
}

/// Vehicles that pass the search text and every filter, in snapshot order.
///
/// An empty search text matches every vehicle.
#[must_use]
pub fn filter_vehicles<'a>(
    snapshot: &'a CatalogSnapshot,
    search_query: &str,
    filters: &FilterSelection,
) -> Vec<&'a Vehicle> {
    let search = (!search_query.is_empty()).then(|| {
        (
            search_query.to_lowercase(),
            brand_names(&snapshot.brands),
            model_names(&snapshot.models),
        )
    });

    snapshot
        .vehicles
        .iter()
        .filter(|vehicle| filters.matches(vehicle))
        .filter(|vehicle| {
            search.as_ref().map_or(true, |(needle, brands, models)| {
                let haystack = search_haystack(
                    vehicle,
                    brands.get(&vehicle.brand_id).copied(),
                    models.get(&vehicle.model_id).copied(),
                );
                haystack.contains(needle.as_str())
            })
        })
        .collect()
}

/// Distinct model years of `vehicles`, most recent first.
#[must_use]
pub fn available_years(vehicles: &[&Vehicle]) -> Vec<YearId> {
    vehicles
        .iter()
        .map(|vehicle| vehicle.year_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .collect()
}

/// Lowest and highest price of `vehicles`.
///
/// NaN prices are skipped; infinite prices count. Returns `None` when no
/// price is left.
#[must_use]
pub fn price_bounds(vehicles: &[Vehicle]) -> Option<PriceBounds> {
    vehicles
        .iter()
        .map(|vehicle| vehicle.price)
        .filter(|price| !price.is_nan())
        .fold(None, |bounds, price| match bounds {
            None => Some(PriceBounds {
                min: price,
                max: price,
            }),
            Some(PriceBounds { min, max }) => Some(PriceBounds {
                min: min.min(price),
                max: max.max(price),
            }),
        })
}

// The first entry wins when ids repeat.
fn brand_names(brands: &[Brand]) -> HashMap<BrandId, &str> {
    let mut names = HashMap::with_capacity(brands.len());
    for brand in brands {
        names.entry(brand.id).or_insert(brand.name.as_str());
    }
    names
}

fn model_names(models: &[Model]) -> HashMap<ModelId, &str> {
    let mut names = HashMap::with_capacity(models.len());
    for model in models {
        names.entry(model.id).or_insert(model.name.as_str());
    }
    names
}
