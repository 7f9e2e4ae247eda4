//! Catalog entities shared across the workspace.
//!
//! Vehicles reference brands, models, years and reference tables by integer
//! id. References are not enforced: a dangling id simply fails to match when
//! looked up.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Get the raw numeric value.
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

catalog_id!(
    /// Identifier of a vehicle brand.
    BrandId
);
catalog_id!(
    /// Identifier of a vehicle model.
    ModelId
);
catalog_id!(
    /// Identifier of a model year.
    ///
    /// For FIPE data this is the model year itself (e.g. `2024`); brand-new
    /// vehicles use the FIPE placeholder `32000`.
    YearId
);
catalog_id!(
    /// Identifier of a monthly price-table edition.
    ReferenceTableId
);

/// A priced vehicle entry.
///
/// Vehicles carry no identifier of their own; identity is positional within
/// the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Brand reference
    pub brand_id: BrandId,
    /// Model reference
    pub model_id: ModelId,
    /// Year reference
    pub year_id: YearId,
    /// Price-table edition the price was taken from
    pub reference_table_id: ReferenceTableId,
    /// Technical code (FIPE code)
    pub tech_code: String,
    /// Fuel label, free text
    pub fuel: String,
    /// Price in the table's currency
    pub price: f64,
}

/// A vehicle brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    /// Brand id
    pub id: BrandId,
    /// Display name
    pub name: String,
}

/// A vehicle model, owned by a brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Model id
    pub id: ModelId,
    /// Display name
    pub name: String,
    /// Owning brand
    pub brand_id: BrandId,
}

/// A model year entry, owned by a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Year {
    /// Year id
    pub id: YearId,
    /// Description, e.g. `"2024 Gasolina"`
    pub description: String,
    /// Owning model
    pub model_id: ModelId,
}

/// A monthly price-table edition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTable {
    /// Reference table id
    pub id: ReferenceTableId,
    /// Month label, e.g. `"outubro/2024"`
    pub month: String,
}

/// Every collection of the catalog, as returned by a data source.
///
/// A snapshot is committed to the store as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSnapshot {
    /// Priced vehicles
    pub vehicles: Vec<Vehicle>,
    /// Brand lookup table
    pub brands: Vec<Brand>,
    /// Model lookup table
    pub models: Vec<Model>,
    /// Year lookup table
    pub years: Vec<Year>,
    /// Price-table editions
    pub reference_tables: Vec<ReferenceTable>,
}

impl CatalogSnapshot {
    /// Whether the snapshot holds no data at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
            && self.brands.is_empty()
            && self.models.is_empty()
            && self.years.is_empty()
            && self.reference_tables.is_empty()
    }
}
