//! `fipe-catalog` command-line entry point.

use anyhow::{Context, Result};
use catalog_core::{AppConfig, SourceKind};
use clap::{Args, Parser, Subcommand};
use fipe_catalog::commands::catalog::{self, FilterUpdate, VehicleSummary};
use fipe_catalog::state::AppState;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "fipe-catalog",
    version,
    about = "Search and filter the FIPE vehicle price table"
)]
struct Cli {
    /// Data source to load from (overrides config)
    #[arg(long, value_name = "KIND")]
    source: Option<SourceKind>,

    /// Snapshot JSON file for the `file` source
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List vehicles passing the search text and filters
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Model years of the filtered vehicles, most recent first
    Years {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Lowest and highest price in the catalog
    PriceRange {
        #[arg(long)]
        json: bool,
    },
    /// List brands
    Brands {
        #[arg(long)]
        json: bool,
    },
    /// List models, optionally for one brand
    Models {
        #[arg(long)]
        brand: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Fetch from the source and write the snapshot as JSON
    Snapshot {
        #[arg(long, short, value_name = "PATH")]
        output: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Case-insensitive text matched against brand, model, year and fuel
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    brand: Option<u32>,
    #[arg(long)]
    model: Option<u32>,
    #[arg(long)]
    year: Option<u32>,
    #[arg(long)]
    min_price: Option<f64>,
    #[arg(long)]
    max_price: Option<f64>,
}

impl FilterArgs {
    async fn apply(self, state: &AppState) -> Result<()> {
        if let Some(query) = self.search {
            catalog::set_search_query(query, state).await?;
        }
        catalog::set_filters(
            FilterUpdate {
                brand: self.brand,
                model: self.model,
                year: self.year,
                min_price: self.min_price,
                max_price: self.max_price,
            },
            state,
        )
        .await?;
        Ok(())
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    config.apply_env_overrides(|key| std::env::var(key).ok())?;

    if let Some(kind) = cli.source {
        config.source.kind = kind;
    }
    if let Some(path) = &cli.snapshot {
        config.source.snapshot_path = Some(path.clone());
        // A snapshot path alone implies the file source
        if cli.source.is_none() {
            config.source.kind = SourceKind::File;
        }
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_vehicles(vehicles: &[VehicleSummary]) {
    for v in vehicles {
        println!(
            "{:<12} {:<32} {:>4}  {:<10} {:<10} R$ {:>12.2}",
            v.brand_name, v.model_name, v.year, v.fuel, v.tech_code, v.price
        );
    }
    println!("{} vehicle(s)", vehicles.len());
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    fipe_catalog::init_tracing(&config.logging.filter);
    info!("Starting fipe-catalog v{}", fipe_catalog::get_version());

    let state = AppState::new(config)?;

    if let Command::Snapshot { output } = &cli.command {
        let snapshot = state.source.fetch().await?;
        let json = serde_json::to_string_pretty(&snapshot)?;
        tokio::fs::write(output, json)
            .await
            .with_context(|| format!("failed to write snapshot to {}", output.display()))?;
        info!(
            path = %output.display(),
            vehicles = snapshot.vehicles.len(),
            "Snapshot written"
        );
        return Ok(());
    }

    let summary = catalog::load_catalog(&state).await?;
    info!(
        source = %summary.source,
        vehicles = summary.vehicles,
        "Catalog ready"
    );

    match cli.command {
        Command::List { filters, json } => {
            filters.apply(&state).await?;
            let vehicles = catalog::list_vehicles(&state).await?;
            if json {
                print_json(&vehicles)?;
            } else {
                print_vehicles(&vehicles);
            }
        }
        Command::Years { filters, json } => {
            filters.apply(&state).await?;
            let years = catalog::available_years(&state).await?;
            if json {
                print_json(&years)?;
            } else {
                for year in years {
                    println!("{year}");
                }
            }
        }
        Command::PriceRange { json } => {
            let range = catalog::price_range(&state).await?;
            if json {
                print_json(&range)?;
            } else if let (Some(min), Some(max)) = (range.min, range.max) {
                println!("R$ {min:.2} - R$ {max:.2}");
            } else {
                println!("no vehicles loaded");
            }
        }
        Command::Brands { json } => {
            let brands = catalog::list_brands(&state).await?;
            if json {
                print_json(&brands)?;
            } else {
                for brand in brands {
                    println!("{:>6}  {}", brand.id, brand.name);
                }
            }
        }
        Command::Models { brand, json } => {
            let models = catalog::list_models(brand, &state).await?;
            if json {
                print_json(&models)?;
            } else {
                for model in models {
                    println!("{:>6}  {:>6}  {}", model.id, model.brand_id, model.name);
                }
            }
        }
        Command::Snapshot { .. } => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}
