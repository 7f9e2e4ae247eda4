//! Catalog commands.
//!
//! Load the catalog, adjust search and filters, and read the derived views.

use crate::error::CommandError;
use crate::state::AppState;
use catalog_core::{
    Brand, BrandId, Model, ModelId, ReferenceTable, ReferenceTableId, Vehicle, Year, YearId,
};
use catalog_store::{CatalogView, FilterSelection, LoadOutcome, LoadState, PriceBounds, PriceRange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vehicle with its brand and model names resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSummary {
    pub brand_id: BrandId,
    /// Empty when the brand id does not resolve
    pub brand_name: String,
    pub model_id: ModelId,
    /// Empty when the model id does not resolve
    pub model_name: String,
    pub year: YearId,
    pub reference_table_id: ReferenceTableId,
    pub tech_code: String,
    pub fuel: String,
    pub price: f64,
}

impl VehicleSummary {
    fn resolve(vehicle: &Vehicle, view: &CatalogView) -> Self {
        Self {
            brand_id: vehicle.brand_id,
            brand_name: view
                .brand_name(vehicle.brand_id)
                .unwrap_or_default()
                .to_string(),
            model_id: vehicle.model_id,
            model_name: view
                .model_name(vehicle.model_id)
                .unwrap_or_default()
                .to_string(),
            year: vehicle.year_id,
            reference_table_id: vehicle.reference_table_id,
            tech_code: vehicle.tech_code.clone(),
            fuel: vehicle.fuel.clone(),
            price: vehicle.price,
        }
    }
}

/// Price bounds across the whole catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRangeResponse {
    /// False when no vehicle is loaded
    pub available: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl From<Option<PriceBounds>> for PriceRangeResponse {
    fn from(bounds: Option<PriceBounds>) -> Self {
        match bounds {
            Some(PriceBounds { min, max }) => Self {
                available: true,
                min: Some(min),
                max: Some(max),
            },
            None => Self {
                available: false,
                min: None,
                max: None,
            },
        }
    }
}

/// Result of `load_catalog`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSummary {
    pub source: String,
    pub generation: u64,
    /// Vehicles committed; zero when superseded
    pub vehicles: usize,
    /// A newer load started meanwhile and this result was dropped
    pub superseded: bool,
    pub finished_at: DateTime<Utc>,
}

/// Filter values as sent by a caller. Absent price bounds fall back to the
/// configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterUpdate {
    pub brand: Option<u32>,
    pub model: Option<u32>,
    pub year: Option<u32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl FilterUpdate {
    fn into_selection(self, defaults: &FilterSelection) -> Result<FilterSelection, CommandError> {
        let price_range = PriceRange::new(
            self.min_price.unwrap_or(defaults.price_range.min()),
            self.max_price.unwrap_or(defaults.price_range.max()),
        )?;

        Ok(FilterSelection {
            brand: self.brand.map(BrandId),
            model: self.model.map(ModelId),
            year: self.year.map(YearId),
            price_range,
        })
    }
}

/// Fetch from the configured source and commit the result.
pub async fn load_catalog(state: &AppState) -> Result<LoadSummary, CommandError> {
    let outcome = state.store.load(state.source.as_ref()).await?;

    let (generation, vehicles, superseded) = match outcome {
        LoadOutcome::Committed {
            generation,
            vehicles,
        } => (generation, vehicles, false),
        LoadOutcome::Superseded { generation, .. } => (generation, 0, true),
    };

    Ok(LoadSummary {
        source: state.source.source_id().to_string(),
        generation,
        vehicles,
        superseded,
        finished_at: Utc::now(),
    })
}

/// Current load lifecycle state.
pub async fn load_status(state: &AppState) -> Result<LoadState, CommandError> {
    Ok(state.store.load_state())
}

/// Replace the search text.
pub async fn set_search_query(query: String, state: &AppState) -> Result<(), CommandError> {
    state.store.set_search_query(query);
    Ok(())
}

/// Replace the filter selection.
pub async fn set_filters(update: FilterUpdate, state: &AppState) -> Result<(), CommandError> {
    let selection = update.into_selection(state.store.default_filters())?;
    state.store.set_filters(selection);
    Ok(())
}

/// Restore the default filter selection.
pub async fn clear_filters(state: &AppState) -> Result<(), CommandError> {
    state.store.clear_filters();
    Ok(())
}

/// Vehicles passing the current search text and filters.
pub async fn list_vehicles(state: &AppState) -> Result<Vec<VehicleSummary>, CommandError> {
    let view = state.store.view();
    Ok(view
        .filtered_vehicles()
        .into_iter()
        .map(|vehicle| VehicleSummary::resolve(vehicle, &view))
        .collect())
}

/// Model years of the filtered vehicles, most recent first.
pub async fn available_years(state: &AppState) -> Result<Vec<YearId>, CommandError> {
    Ok(state.store.available_years())
}

/// Price bounds across all loaded vehicles.
pub async fn price_range(state: &AppState) -> Result<PriceRangeResponse, CommandError> {
    Ok(state.store.price_bounds().into())
}

/// All loaded brands.
pub async fn list_brands(state: &AppState) -> Result<Vec<Brand>, CommandError> {
    Ok(state.store.snapshot().brands.clone())
}

/// Loaded models, optionally restricted to one brand.
pub async fn list_models(
    brand: Option<u32>,
    state: &AppState,
) -> Result<Vec<Model>, CommandError> {
    let view = state.store.view();
    let models = match brand {
        Some(brand) => view
            .models_for_brand(BrandId(brand))
            .into_iter()
            .cloned()
            .collect(),
        None => view.snapshot().models.clone(),
    };
    Ok(models)
}

/// Year entries for a model.
pub async fn list_years(model: u32, state: &AppState) -> Result<Vec<Year>, CommandError> {
    let view = state.store.view();
    if view.model(ModelId(model)).is_none() {
        return Err(CommandError::new(
            "MODEL_NOT_FOUND",
            format!("Model {model} not found"),
        ));
    }

    Ok(view
        .years_for_model(ModelId(model))
        .into_iter()
        .cloned()
        .collect())
}

/// All loaded reference tables.
pub async fn list_reference_tables(
    state: &AppState,
) -> Result<Vec<ReferenceTable>, CommandError> {
    Ok(state.store.snapshot().reference_tables.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_range_response_from_bounds() {
        let response = PriceRangeResponse::from(Some(PriceBounds {
            min: 1.0,
            max: 2.0,
        }));
        assert!(response.available);
        assert_eq!(response.min, Some(1.0));

        let response = PriceRangeResponse::from(None);
        assert!(!response.available);
        assert_eq!(response.max, None);
    }

    #[test]
    fn test_filter_update_uses_default_bounds() {
        let defaults = FilterSelection::default();
        let selection = FilterUpdate {
            brand: Some(0),
            min_price: Some(5_000.0),
            ..FilterUpdate::default()
        }
        .into_selection(&defaults)
        .expect("valid update");

        assert_eq!(selection.brand, Some(BrandId(0)));
        assert!((selection.price_range.min() - 5_000.0).abs() < f64::EPSILON);
        assert!((selection.price_range.max() - defaults.price_range.max()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_filter_update_rejects_inverted_bounds() {
        let err = FilterUpdate {
            min_price: Some(10.0),
            max_price: Some(1.0),
            ..FilterUpdate::default()
        }
        .into_selection(&FilterSelection::default())
        .expect_err("inverted bounds");
        assert_eq!(err.code, "INVALID_FILTER");
    }
}
