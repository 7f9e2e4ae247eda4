//! FIPE price-table data source.
//!
//! [`FipeSource`] walks the API from the latest price-table edition down to
//! individual prices and assembles one [`CatalogSnapshot`]:
//!
//! ```text
//! reference table → brands → models → model years → price per year
//! ```
//!
//! A full walk is thousands of requests; `max_brands` and
//! `max_models_per_brand` bound it.

mod api;
mod client;
mod limiter;
mod parse;

pub use client::{FipeClient, FipePrice, FipeYear};
pub use limiter::{RateLimiter, RequestStats};
pub use parse::{parse_brl_price, parse_year_code};

use crate::error::{Result, SourceError};
use crate::source::CatalogSource;
use async_trait::async_trait;
use catalog_core::{CatalogSnapshot, FipeConfig, Vehicle, Year};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, info};

/// Catalog source backed by the FIPE API.
pub struct FipeSource {
    client: FipeClient,
    max_brands: Option<usize>,
    max_models_per_brand: Option<usize>,
    max_concurrent_requests: usize,
}

impl FipeSource {
    /// Create a source from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &FipeConfig) -> Result<Self> {
        Ok(Self {
            client: FipeClient::new(config)?,
            max_brands: config.max_brands,
            max_models_per_brand: config.max_models_per_brand,
            max_concurrent_requests: config.max_concurrent_requests.max(1),
        })
    }

    /// The underlying client, e.g. to read request statistics.
    #[must_use]
    pub fn client(&self) -> &FipeClient {
        &self.client
    }
}

#[async_trait]
impl CatalogSource for FipeSource {
    async fn fetch(&self) -> Result<CatalogSnapshot> {
        let reference = self
            .client
            .reference_tables()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::InvalidValue {
                field: "reference_tables".to_string(),
                reason: "the API listed no price-table editions".to_string(),
            })?;

        info!(
            reference = %reference.id,
            month = %reference.month,
            "Fetching FIPE catalog"
        );

        let mut snapshot = CatalogSnapshot {
            reference_tables: vec![reference.clone()],
            ..CatalogSnapshot::default()
        };

        let mut brands = self.client.brands(reference.id).await?;
        if let Some(limit) = self.max_brands {
            brands.truncate(limit);
        }

        for brand in &brands {
            let mut models = self.client.models(reference.id, brand.id).await?;
            if let Some(limit) = self.max_models_per_brand {
                models.truncate(limit);
            }
            debug!(brand = %brand.name, models = models.len(), "Fetched models");

            for model in &models {
                let fipe_years = self.client.years(reference.id, brand.id, model.id).await?;

                let requests: Vec<_> = fipe_years
                    .iter()
                    .map(|year| {
                        self.client
                            .price(reference.id, brand.id, model.id, &year.code)
                    })
                    .collect();
                let prices: Vec<FipePrice> =
                    run_bounded(requests, self.max_concurrent_requests).await?;

                let mut seen_years = HashSet::new();
                for (fipe_year, price) in fipe_years.iter().zip(prices) {
                    let (year_id, _fuel_code) = parse_year_code(&fipe_year.code)?;

                    if seen_years.insert(year_id) {
                        snapshot.years.push(Year {
                            id: year_id,
                            description: fipe_year.label.clone(),
                            model_id: model.id,
                        });
                    }

                    snapshot.vehicles.push(Vehicle {
                        brand_id: brand.id,
                        model_id: model.id,
                        year_id,
                        reference_table_id: reference.id,
                        tech_code: price.fipe_code,
                        fuel: price.fuel,
                        price: price.price,
                    });
                }
            }

            snapshot.models.extend(models);
        }

        snapshot.brands = brands;

        let stats = self.client.stats();
        info!(
            vehicles = snapshot.vehicles.len(),
            brands = snapshot.brands.len(),
            models = snapshot.models.len(),
            requests = stats.total_requests,
            rate_limited = stats.rate_limited,
            "FIPE catalog fetched"
        );

        Ok(snapshot)
    }

    fn source_id(&self) -> &'static str {
        "fipe"
    }
}

/// Drive `requests` with at most `limit` in flight; results keep request order.
async fn run_bounded<T, F>(requests: Vec<F>, limit: usize) -> Result<Vec<T>>
where
    F: Future<Output = Result<T>>,
{
    stream::iter(requests)
        .buffered(limit.max(1))
        .try_collect()
        .await
}
