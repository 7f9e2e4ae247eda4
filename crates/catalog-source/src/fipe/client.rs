//! HTTP client for the FIPE price-table API.
//!
//! Every endpoint is a form-encoded `POST {base_url}/{endpoint}`. Requests go
//! through a shared [`RateLimiter`] and are retried on HTTP 429 and transport
//! errors.

use super::api::{LabeledId, ModelsResponse, PriceResponse, ReferenceTableEntry, YearEntry};
use super::limiter::{RateLimiter, RequestStats};
use super::parse::parse_brl_price;
use crate::error::{Result, SourceError};
use catalog_core::{
    Brand, BrandId, FipeConfig, Model, ModelId, ReferenceTable, ReferenceTableId,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

const REFERENCE_TABLES: &str = "ConsultarTabelaDeReferencia";
const BRANDS: &str = "ConsultarMarcas";
const MODELS: &str = "ConsultarModelos";
const MODEL_YEARS: &str = "ConsultarAnoModelo";
const PRICE: &str = "ConsultarValorComTodosParametros";

/// Request statistics are logged every this many requests.
const STATS_LOG_INTERVAL: u64 = 10;

/// A model year as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FipeYear {
    /// Year code, `<model year>-<fuel code>`
    pub code: String,
    /// Display label, e.g. `"2024 Gasolina"`
    pub label: String,
}

/// A priced vehicle as returned by the price endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct FipePrice {
    /// Parsed price
    pub price: f64,
    /// FIPE code of the vehicle
    pub fipe_code: String,
    /// Fuel label
    pub fuel: String,
}

/// FIPE API client with rate limiting, retries and request statistics.
pub struct FipeClient {
    client: Client,
    base_url: String,
    vehicle_type: u8,
    max_attempts: u32,
    retry_delay: Duration,
    limiter: RateLimiter,
    stats: Mutex<RequestStats>,
}

impl FipeClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &FipeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SourceError::InvalidValue {
                field: "fipe".to_string(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        let max_requests = usize::try_from(config.max_requests).unwrap_or(usize::MAX);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            vehicle_type: config.vehicle_type,
            max_attempts: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            limiter: RateLimiter::new(max_requests, Duration::from_secs(config.per_seconds)),
            stats: Mutex::new(RequestStats::default()),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Snapshot of the request statistics so far.
    #[must_use]
    pub fn stats(&self) -> RequestStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Price-table editions, latest first.
    pub async fn reference_tables(&self) -> Result<Vec<ReferenceTable>> {
        let entries: Vec<ReferenceTableEntry> = self.post(REFERENCE_TABLES, &[]).await?;
        Ok(entries
            .into_iter()
            .map(|entry| ReferenceTable {
                id: ReferenceTableId(entry.id),
                month: entry.month.trim().to_string(),
            })
            .collect())
    }

    /// Brands listed in a price-table edition.
    pub async fn brands(&self, reference: ReferenceTableId) -> Result<Vec<Brand>> {
        let form = [
            ("codigoTabelaReferencia", reference.to_string()),
            ("codigoTipoVeiculo", self.vehicle_type.to_string()),
        ];
        let entries: Vec<LabeledId> = self.post(BRANDS, &form).await?;
        Ok(entries
            .into_iter()
            .map(|entry| Brand {
                id: BrandId(entry.value),
                name: entry.label,
            })
            .collect())
    }

    /// Models of a brand.
    pub async fn models(&self, reference: ReferenceTableId, brand: BrandId) -> Result<Vec<Model>> {
        let form = [
            ("codigoTabelaReferencia", reference.to_string()),
            ("codigoTipoVeiculo", self.vehicle_type.to_string()),
            ("codigoMarca", brand.to_string()),
        ];
        let response: ModelsResponse = self.post(MODELS, &form).await?;
        Ok(response
            .models
            .into_iter()
            .map(|entry| Model {
                id: ModelId(entry.value),
                name: entry.label,
                brand_id: brand,
            })
            .collect())
    }

    /// Model years available for a model.
    pub async fn years(
        &self,
        reference: ReferenceTableId,
        brand: BrandId,
        model: ModelId,
    ) -> Result<Vec<FipeYear>> {
        let form = [
            ("codigoTabelaReferencia", reference.to_string()),
            ("codigoMarca", brand.to_string()),
            ("codigoTipoVeiculo", self.vehicle_type.to_string()),
            ("codigoModelo", model.to_string()),
        ];
        let entries: Vec<YearEntry> = self.post(MODEL_YEARS, &form).await?;
        Ok(entries
            .into_iter()
            .map(|entry| FipeYear {
                code: entry.value,
                label: entry.label,
            })
            .collect())
    }

    /// Price of one model year.
    ///
    /// `year_code` is the `<model year>-<fuel code>` code returned by [`FipeClient::years`].
    pub async fn price(
        &self,
        reference: ReferenceTableId,
        brand: BrandId,
        model: ModelId,
        year_code: &str,
    ) -> Result<FipePrice> {
        let (year, fuel_code) =
            year_code
                .split_once('-')
                .ok_or_else(|| SourceError::InvalidValue {
                    field: "year_code".to_string(),
                    reason: format!("'{year_code}' is not a <year>-<fuel> code"),
                })?;

        let form = [
            ("codigoTabelaReferencia", reference.to_string()),
            ("codigoMarca", brand.to_string()),
            ("codigoModelo", model.to_string()),
            ("codigoTipoVeiculo", self.vehicle_type.to_string()),
            ("anoModelo", year.to_string()),
            ("codigoTipoCombustivel", fuel_code.to_string()),
            ("tipoConsulta", "tradicional".to_string()),
        ];

        match self.post::<PriceResponse>(PRICE, &form).await? {
            PriceResponse::Price(record) => Ok(FipePrice {
                price: parse_brl_price(&record.price)?,
                fipe_code: record.fipe_code,
                fuel: record.fuel,
            }),
            PriceResponse::Error { message } => Err(SourceError::Api {
                endpoint: PRICE.to_string(),
                message,
            }),
        }
    }

    /// Send one request with rate limiting and retries, decoding the JSON body.
    ///
    /// HTTP 429 waits `(attempt + 1) * retry_delay` before the next attempt,
    /// transport errors wait `retry_delay`. Any other non-success status fails
    /// immediately.
    async fn post<T: DeserializeOwned>(&self, endpoint: &str, form: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{endpoint}", self.base_url);
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            self.limiter.acquire().await;
            self.record_attempt(endpoint);

            let delay = match self.client.post(&url).form(form).send().await {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    self.update_stats(|stats| stats.rate_limited += 1);
                    last_error = Some(SourceError::RateLimited {
                        endpoint: endpoint.to_string(),
                        attempts: attempt + 1,
                    });
                    self.retry_delay * (attempt + 1)
                }
                Ok(response) if !response.status().is_success() => {
                    self.update_stats(|stats| stats.failed += 1);
                    let status = response.status().as_u16();
                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(SourceError::Http {
                        endpoint: endpoint.to_string(),
                        status,
                        message,
                    });
                }
                Ok(response) => {
                    self.update_stats(|stats| stats.succeeded += 1);
                    let body = response.text().await?;
                    return serde_json::from_str(&body).map_err(|e| SourceError::Parse {
                        what: format!("{endpoint} response"),
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    self.update_stats(|stats| stats.failed += 1);
                    last_error = Some(SourceError::Network(e));
                    self.retry_delay
                }
            };

            if attempt + 1 < self.max_attempts {
                warn!(
                    "Request to {} failed (attempt {}/{}), retrying in {:?}...",
                    endpoint,
                    attempt + 1,
                    self.max_attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| SourceError::RateLimited {
            endpoint: endpoint.to_string(),
            attempts: self.max_attempts,
        }))
    }

    fn update_stats(&self, update: impl FnOnce(&mut RequestStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut stats);
    }

    fn record_attempt(&self, endpoint: &str) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.record_attempt(endpoint);

        if stats.total_requests % STATS_LOG_INTERVAL == 0 {
            debug!(
                total = stats.total_requests,
                succeeded = stats.succeeded,
                rate_limited = stats.rate_limited,
                failed = stats.failed,
                "FIPE request statistics"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = FipeConfig {
            base_url: "http://localhost:8080/api/veiculos/".to_string(),
            ..FipeConfig::default()
        };
        let client = FipeClient::new(&config).expect("create client");

        assert_eq!(client.base_url(), "http://localhost:8080/api/veiculos");
        assert_eq!(client.max_attempts, 3);
        assert_eq!(client.retry_delay, Duration::from_secs(2));
        assert_eq!(client.stats(), RequestStats::default());
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        let config = FipeConfig {
            max_retries: 0,
            ..FipeConfig::default()
        };
        let client = FipeClient::new(&config).expect("create client");
        assert_eq!(client.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_price_rejects_malformed_year_code() {
        let client = FipeClient::new(&FipeConfig::default()).expect("create client");
        let err = client
            .price(ReferenceTableId(1), BrandId(1), ModelId(1), "2024")
            .await
            .expect_err("code without fuel must fail");

        assert!(matches!(err, SourceError::InvalidValue { .. }));
        assert_eq!(client.stats().total_requests, 0);
    }
}
