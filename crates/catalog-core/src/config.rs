//! Configuration management for fipe-catalog.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main application configuration.
///
/// This is loaded from `~/.config/fipe-catalog/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Which data source feeds the catalog
    pub source: SourceConfig,
    /// FIPE API client settings
    pub fipe: FipeConfig,
    /// Initial filter selection
    pub filters: FilterConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error here.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `FIPE_CATALOG_SOURCE`: Override the data source (`sample`, `file`, `fipe`)
    /// - `FIPE_CATALOG_SNAPSHOT`: Override the snapshot file path
    /// - `FIPE_CATALOG_BASE_URL`: Override the FIPE API base URL
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides looked up through `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("FIPE_CATALOG_SOURCE") {
            self.source.kind = val.parse()?;
            tracing::debug!("Override source.kind from env: {}", self.source.kind);
        }

        if let Some(val) = lookup("FIPE_CATALOG_SNAPSHOT") {
            tracing::debug!("Override source.snapshot_path from env: {}", val);
            self.source.snapshot_path = Some(PathBuf::from(val));
        }

        if let Some(val) = lookup("FIPE_CATALOG_BASE_URL") {
            tracing::debug!("Override fipe.base_url from env: {}", val);
            self.fipe.base_url = val;
        }

        self.validate()
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.filters.default_min_price.is_finite()
            || !self.filters.default_max_price.is_finite()
            || self.filters.default_min_price > self.filters.default_max_price
        {
            return Err(ConfigError::InvalidValue {
                field: "filters".to_string(),
                reason: format!(
                    "default price range [{}, {}] is not a valid range",
                    self.filters.default_min_price, self.filters.default_max_price
                ),
            });
        }

        if self.fipe.max_requests == 0 || self.fipe.per_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fipe.max_requests".to_string(),
                reason: "rate limit window must allow at least one request".to_string(),
            });
        }

        if self.fipe.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fipe.max_retries".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> ConfigResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/fipe-catalog/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "fipe-catalog", "fipe-catalog")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Kind of data source feeding the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in sample data
    #[default]
    Sample,
    /// JSON snapshot file
    File,
    /// Live FIPE price-table API
    Fipe,
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sample" => Ok(Self::Sample),
            "file" => Ok(Self::File),
            "fipe" => Ok(Self::Fipe),
            other => Err(ConfigError::InvalidValue {
                field: "source.kind".to_string(),
                reason: format!("unknown source '{other}'"),
            }),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sample => "sample",
            Self::File => "file",
            Self::Fipe => "fipe",
        };
        f.write_str(name)
    }
}

/// Data source selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source kind
    pub kind: SourceKind,
    /// Snapshot file used by the `file` source
    pub snapshot_path: Option<PathBuf>,
}

/// FIPE API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FipeConfig {
    /// API base URL, endpoints are appended to it
    pub base_url: String,
    /// FIPE vehicle type: 1 = cars, 2 = motorcycles, 3 = trucks
    pub vehicle_type: u8,
    /// Requests allowed per rate-limit window
    pub max_requests: u32,
    /// Rate-limit window in seconds
    pub per_seconds: u64,
    /// Attempts per request, including the first
    pub max_retries: u32,
    /// Base retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Price lookups in flight at once
    pub max_concurrent_requests: usize,
    /// Only fetch the first N brands
    pub max_brands: Option<usize>,
    /// Only fetch the first N models of each brand
    pub max_models_per_brand: Option<usize>,
    /// User agent string
    pub user_agent: String,
}

impl Default for FipeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://veiculos.fipe.org.br/api/veiculos".to_string(),
            vehicle_type: 1,
            max_requests: 5,
            per_seconds: 10,
            max_retries: 3,
            retry_delay_ms: 2000,
            timeout_secs: 30,
            max_concurrent_requests: 2,
            max_brands: None,
            max_models_per_brand: None,
            user_agent: "fipe-catalog/0.1.0 (+https://github.com/fipe-catalog/fipe-catalog)"
                .to_string(),
        }
    }
}

/// Initial filter selection applied when the store is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Lower bound of the default price range (inclusive)
    pub default_min_price: f64,
    /// Upper bound of the default price range (inclusive)
    pub default_max_price: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_min_price: 0.0,
            default_max_price: 100_000.0,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,fipe_catalog=debug".to_string(),
        }
    }
}
