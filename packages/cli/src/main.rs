#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the street works aggregation pipeline.
//!
//! Fetches permit data per (authority x month) partition, aggregates it
//! onto the H3 hex grid, and writes GeoJSON artifacts for the map layer.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use h3o::Resolution;
use works_map_database::{AuthorityFilter, DuckDbStore, KNOWN_AUTHORITIES};
use works_map_hex::resolution::RESOLUTION_TABLE;
use works_map_hex::summary::{summarize, top_cells};
use works_map_permit_models::WorkCategory;
use works_map_pipeline::{PartitionRequest, fetch_normalized, run_and_merge};

/// Concurrent partition fetches; MotherDuck connections are not free.
const PARTITION_CONCURRENCY: usize = 4;

#[derive(Parser)]
#[command(name = "works_map", about = "Street works hex aggregation tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate permit data onto the H3 hex grid and write GeoJSON
    Aggregate {
        /// Highway authority to query (omit with --all for every authority)
        #[arg(long, conflicts_with = "all")]
        authority: Option<String>,
        /// Query all known authorities in one partition per month
        #[arg(long)]
        all: bool,
        /// Comma-separated month partitions (e.g. "05_2025,06_2025")
        #[arg(long)]
        months: String,
        /// H3 resolution (0-15); see `resolutions` for guidance
        #[arg(long, default_value_t = 9)]
        resolution: u8,
        /// Comma-separated work categories (Major, Emergency, Standard, Minor)
        #[arg(long)]
        categories: Option<String>,
        /// Output GeoJSON path
        #[arg(long, default_value = "hex_works.geojson")]
        output: PathBuf,
    },
    /// Fetch normalized permit records (points/lines) and write GeoJSON
    Records {
        /// Highway authority to query (omit with --all for every authority)
        #[arg(long, conflicts_with = "all")]
        authority: Option<String>,
        /// Query all known authorities
        #[arg(long)]
        all: bool,
        /// Month partition (e.g. "06_2025")
        #[arg(long)]
        month: String,
        /// Comma-separated work categories (Major, Emergency, Standard, Minor)
        #[arg(long)]
        categories: Option<String>,
        /// Output GeoJSON path
        #[arg(long, default_value = "works_records.geojson")]
        output: PathBuf,
    },
    /// List the known highway authorities
    Authorities,
    /// Describe the offered H3 resolution levels
    Resolutions,
}

fn parse_authority(authority: Option<String>, all: bool) -> Result<AuthorityFilter, String> {
    match (authority, all) {
        (Some(name), false) => Ok(AuthorityFilter::One(name)),
        (None, true) => Ok(AuthorityFilter::All),
        _ => Err("specify either --authority <NAME> or --all".to_string()),
    }
}

fn parse_categories(categories: Option<&str>) -> Result<BTreeSet<WorkCategory>, String> {
    let Some(categories) = categories else {
        return Ok(BTreeSet::new());
    };
    categories
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(|label| {
            label
                .parse::<WorkCategory>()
                .map_err(|_| format!("unknown work category: {label}"))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::Aggregate {
            authority,
            all,
            months,
            resolution,
            categories,
            output,
        } => {
            let authority = parse_authority(authority, all)?;
            let categories = parse_categories(categories.as_deref())?;
            let resolution = Resolution::try_from(resolution)?;

            let requests: Vec<PartitionRequest> = months
                .split(',')
                .map(str::trim)
                .filter(|month| !month.is_empty())
                .map(|month| PartitionRequest {
                    authority: authority.clone(),
                    month: month.to_string(),
                })
                .collect();
            if requests.is_empty() {
                return Err("no month partitions given".into());
            }

            let store = DuckDbStore::from_env()?;
            let merged = run_and_merge(
                &store,
                &requests,
                &categories,
                resolution,
                PARTITION_CONCURRENCY,
            )
            .await?;

            let collection = works_map_hex::geojson::feature_collection(&merged.cells);
            std::fs::write(&output, serde_json::to_string_pretty(&collection)?)?;
            log::info!(
                "Wrote {} hex cells to {}",
                merged.cells.len(),
                output.display()
            );

            let summary = summarize(&merged.cells);
            println!("Hexagons:          {}", summary.total_cells);
            println!("Total works:       {}", summary.total_works);
            println!("Avg works per hex: {:.1}", summary.mean_works_per_cell);
            println!("Max works in hex:  {}", summary.max_works);

            if !merged.cells.is_empty() {
                println!("\nMost active hexagons:");
                for cell in top_cells(&merged.cells, 10) {
                    println!(
                        "  {}  works={:<4} permits={:<4} activities={}",
                        cell.index_string(),
                        cell.work_count,
                        cell.unique_permits,
                        cell.activity_types.len()
                    );
                }
            }
        }
        Commands::Records {
            authority,
            all,
            month,
            categories,
            output,
        } => {
            let authority = parse_authority(authority, all)?;
            let categories = parse_categories(categories.as_deref())?;
            let request = PartitionRequest { authority, month };

            let store = DuckDbStore::from_env()?;
            let batch = fetch_normalized(&store, &request, &categories).await?;

            let collection = works_map_geometry::geojson::feature_collection(&batch.records);
            std::fs::write(&output, serde_json::to_string_pretty(&collection)?)?;
            log::info!(
                "Wrote {} records to {} ({} skipped)",
                batch.records.len(),
                output.display(),
                batch.skipped
            );
            println!("Records: {}", batch.records.len());
        }
        Commands::Authorities => {
            for name in KNOWN_AUTHORITIES {
                println!("{name}");
            }
        }
        Commands::Resolutions => {
            for info in RESOLUTION_TABLE {
                println!(
                    "{:>2}  ~{:>5}km edge  {}",
                    info.resolution, info.avg_edge_km, info.description
                );
            }
        }
    }

    log::info!("Done in {:.2?}", start.elapsed());
    Ok(())
}
