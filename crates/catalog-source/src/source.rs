//! The data source trait and the local sources.

use crate::error::{Result, SourceError};
use crate::fipe::FipeSource;
use async_trait::async_trait;
use catalog_core::{
    AppConfig, Brand, BrandId, CatalogSnapshot, Model, ModelId, ReferenceTable,
    ReferenceTableId, SourceKind, Vehicle, Year, YearId,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A provider of complete catalog snapshots.
///
/// Implementations must be thread-safe (Send + Sync) so a source can be shared
/// with background load tasks.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every catalog collection as one unit.
    ///
    /// # Errors
    /// Returns error if the data cannot be fetched or decoded. A source never
    /// returns a partial snapshot.
    async fn fetch(&self) -> Result<CatalogSnapshot>;

    /// Get the unique identifier for this source.
    fn source_id(&self) -> &'static str;
}

/// A source returning a fixed snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    snapshot: CatalogSnapshot,
}

impl StaticSource {
    /// Create a source that always returns `snapshot`.
    #[must_use]
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self { snapshot }
    }

    /// The built-in sample catalog: two Toyota Corolla entries, 2024 and 2023.
    #[must_use]
    pub fn sample() -> Self {
        let vehicle = |year: u32, tech_code: &str, price: f64| Vehicle {
            brand_id: BrandId(1),
            model_id: ModelId(1),
            year_id: YearId(year),
            reference_table_id: ReferenceTableId(1),
            tech_code: tech_code.to_string(),
            fuel: "Gasoline".to_string(),
            price,
        };

        Self::new(CatalogSnapshot {
            vehicles: vec![
                vehicle(2024, "ABC123", 50_000.0),
                vehicle(2023, "ABC124", 45_000.0),
            ],
            brands: vec![Brand {
                id: BrandId(1),
                name: "Toyota".to_string(),
            }],
            models: vec![Model {
                id: ModelId(1),
                name: "Corolla".to_string(),
                brand_id: BrandId(1),
            }],
            years: vec![
                Year {
                    id: YearId(2024),
                    description: "2024 Gasoline".to_string(),
                    model_id: ModelId(1),
                },
                Year {
                    id: YearId(2023),
                    description: "2023 Gasoline".to_string(),
                    model_id: ModelId(1),
                },
            ],
            reference_tables: vec![ReferenceTable {
                id: ReferenceTableId(1),
                month: "janeiro/2024".to_string(),
            }],
        })
    }
}

#[async_trait]
impl CatalogSource for StaticSource {
    async fn fetch(&self) -> Result<CatalogSnapshot> {
        Ok(self.snapshot.clone())
    }

    fn source_id(&self) -> &'static str {
        "static"
    }
}

/// A source reading a JSON-encoded [`CatalogSnapshot`] from disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source for the snapshot at `path`.
    ///
    /// The file is read on every fetch, so it may be replaced between loads.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for JsonFileSource {
    async fn fetch(&self) -> Result<CatalogSnapshot> {
        debug!("Reading catalog snapshot from {}", self.path.display());

        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::FileNotFound {
                    path: self.path.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&contents)?)
    }

    fn source_id(&self) -> &'static str {
        "json-file"
    }
}

/// Build the source selected by `config.source`.
///
/// # Errors
/// Returns error if the `file` source has no snapshot path or the FIPE
/// client cannot be created.
pub fn source_from_config(config: &AppConfig) -> Result<Arc<dyn CatalogSource>> {
    match config.source.kind {
        SourceKind::Sample => Ok(Arc::new(StaticSource::sample())),
        SourceKind::File => {
            let path =
                config
                    .source
                    .snapshot_path
                    .clone()
                    .ok_or_else(|| SourceError::InvalidValue {
                        field: "source.snapshot_path".to_string(),
                        reason: "required when source.kind = \"file\"".to_string(),
                    })?;
            Ok(Arc::new(JsonFileSource::new(path)))
        }
        SourceKind::Fipe => Ok(Arc::new(FipeSource::new(&config.fipe)?)),
    }
}
