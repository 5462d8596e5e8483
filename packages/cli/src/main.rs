#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Field-tooling CLI over the rodovia-match libraries.
//!
//! Wraps the lookup, linear-referencing, proximity, and
//! reconciliation operations for use from scripts and the support
//! team's terminals. Record files are the JSON arrays the persistence
//! collaborator exports.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use rodovia_match_geo::{GeoPoint, proximity::sort_by_proximity};
use rodovia_match_network::cache::NetworkCache;
use rodovia_match_network::linref::interpolate_km;
use rodovia_match_network_models::{LookupConfig, ProjectionMode};
use rodovia_match_reconcile::classify::classify_all;
use rodovia_match_reconcile::export::write_export;
use rodovia_match_reconcile_models::{
    InventoryRecord, MatchConfig, MatchResult, MatchTier, NecessityRecord,
};

#[derive(Parser)]
#[command(name = "rodovia_match", about = "Highway inventory reconciliation toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the road-network dataset to a local file
    Fetch {
        /// Dataset URL
        #[arg(long)]
        url: String,
        /// Destination file
        #[arg(long)]
        out: PathBuf,
    },
    /// Find the route nearest to a coordinate
    Lookup {
        /// Road-network GeoJSON file
        #[arg(long)]
        dataset: PathBuf,
        /// Latitude in decimal degrees
        #[arg(long)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long)]
        lon: f64,
        /// Override the lookup tolerance in meters (default: 50)
        #[arg(long)]
        tolerance_m: Option<f64>,
    },
    /// Interpolate the km position of a coordinate along a route
    Km {
        /// Road-network GeoJSON file
        #[arg(long)]
        dataset: PathBuf,
        /// SNV route code (e.g. "101BRJ0010")
        #[arg(long)]
        route: String,
        /// Latitude in decimal degrees
        #[arg(long)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long)]
        lon: f64,
        /// Km marker at the start of the segment
        #[arg(long)]
        km_start: f64,
        /// Km marker at the end of the segment
        #[arg(long)]
        km_end: f64,
        /// Use true perpendicular projection instead of the legacy
        /// nearest-vertex approximation
        #[arg(long)]
        perpendicular: bool,
    },
    /// List necessities ordered by distance from a position
    Nearest {
        /// Necessity records (JSON array)
        #[arg(long)]
        necessities: PathBuf,
        /// Latitude of the current position
        #[arg(long)]
        lat: f64,
        /// Longitude of the current position
        #[arg(long)]
        lon: f64,
        /// Maximum number of rows to print
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Classify necessities against the inventory
    Classify {
        /// Necessity records (JSON array)
        #[arg(long)]
        necessities: PathBuf,
        /// Inventory records (JSON array)
        #[arg(long)]
        inventory: PathBuf,
        /// Output file for the match results (JSON array)
        #[arg(long)]
        out: PathBuf,
    },
    /// Export flagged match results as CSV for the project team
    Export {
        /// Match results (JSON array)
        #[arg(long)]
        results: PathBuf,
        /// Necessity records (JSON array)
        #[arg(long)]
        necessities: PathBuf,
        /// Inventory records (JSON array)
        #[arg(long)]
        inventory: PathBuf,
        /// Destination CSV file
        #[arg(long)]
        out: PathBuf,
    },
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { url, out } => {
            let client = rodovia_match_dataset::client()?;
            let bytes = rodovia_match_dataset::download_to_file(&client, &url, &out).await?;
            log::info!("Wrote {bytes} byte(s) to {}", out.display());
        }
        Commands::Lookup {
            dataset,
            lat,
            lon,
            tolerance_m,
        } => {
            let network = load_network(&dataset).await?;
            let config = tolerance_m.map_or_else(LookupConfig::default, LookupConfig::with_tolerance);
            let point = GeoPoint::new(lat, lon);

            match network.lookup_nearest_route(point, &config) {
                Some(result) => {
                    println!(
                        "{} {:.1}m {}",
                        result.route_code, result.distance_meters, result.confidence
                    );
                }
                None => {
                    println!("no route within {:.0}m", config.tolerance_m);
                }
            }
        }
        Commands::Km {
            dataset,
            route,
            lat,
            lon,
            km_start,
            km_end,
            perpendicular,
        } => {
            let network = load_network(&dataset).await?;
            let point = GeoPoint::new(lat, lon);

            // Routes split across several features: reference against
            // the one the point is actually on.
            let feature = network
                .features_for_route(&route)
                .filter_map(|f| f.distance_to(point).map(|d| (f, d)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(f, _)| f)
                .ok_or_else(|| format!("No feature with route code {route}"))?;

            let mode = if perpendicular {
                ProjectionMode::Perpendicular
            } else {
                ProjectionMode::NearestVertex
            };
            let km = interpolate_km(
                point,
                &feature.longest_line_points(),
                km_start,
                km_end,
                mode,
            );
            println!("km {km:.3}");
        }
        Commands::Nearest {
            necessities,
            lat,
            lon,
            limit,
        } => {
            let records: Vec<NecessityRecord> = read_json(&necessities)?;
            let total = records.len();
            let sorted = sort_by_proximity(records, GeoPoint::new(lat, lon));

            println!("{:<16} {:>10}  {:<12} KM", "ID", "DIST_M", "ELEMENT");
            println!("{}", "-".repeat(50));
            for (necessity, distance) in sorted.iter().take(limit) {
                println!(
                    "{:<16} {:>10.1}  {:<12} {:.3}",
                    necessity.id, distance, necessity.element_type, necessity.km_initial
                );
            }
            if sorted.len() < total {
                log::info!(
                    "{} necessity record(s) without coordinates were skipped",
                    total - sorted.len()
                );
            }
        }
        Commands::Classify {
            necessities,
            inventory,
            out,
        } => {
            let necessity_records: Vec<NecessityRecord> = read_json(&necessities)?;
            let inventory_records: Vec<InventoryRecord> = read_json(&inventory)?;

            let results = classify_all(
                &necessity_records,
                &inventory_records,
                &MatchConfig::default(),
                chrono::Utc::now(),
            );

            let count = |tier: MatchTier| results.iter().filter(|r| r.match_tier == tier).count();
            log::info!(
                "Classified {} necessity record(s): {} exact, {} high, {} partial, {} unmatched, {} needing review",
                results.len(),
                count(MatchTier::Exact),
                count(MatchTier::High),
                count(MatchTier::Partial),
                count(MatchTier::None),
                results.iter().filter(|r| r.requires_review()).count(),
            );

            tokio::fs::write(&out, serde_json::to_vec_pretty(&results)?).await?;
            log::info!("Wrote match results to {}", out.display());
        }
        Commands::Export {
            results,
            necessities,
            inventory,
            out,
        } => {
            let result_records: Vec<MatchResult> = read_json(&results)?;
            let necessity_records: Vec<NecessityRecord> = read_json(&necessities)?;
            let inventory_records: Vec<InventoryRecord> = read_json(&inventory)?;

            let file = std::fs::File::create(&out)?;
            let written = write_export(
                &result_records,
                &necessity_records,
                &inventory_records,
                file,
            )?;
            log::info!("Wrote {written} row(s) to {}", out.display());
        }
    }

    Ok(())
}

/// Loads a road-network GeoJSON file into a fresh cache keyed by its
/// path. One-shot commands have no session to share the cache across.
async fn load_network(
    dataset: &Path,
) -> Result<std::sync::Arc<rodovia_match_network::RoadNetwork>, Box<dyn std::error::Error>> {
    let cache = NetworkCache::new();
    let dataset_id = dataset.display().to_string();
    Ok(rodovia_match_dataset::load_from_file(&cache, &dataset_id, dataset).await?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&text)
        .map_err(|e| format!("cannot parse {}: {e}", path.display()))?)
}
