//! Confluence CLI - stream highlighting and apportionment

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use confluence_algorithms::apportionment::{
    AnalysisSession, ApportionmentParams, FetchOutcome, Normalization, WeightingFactor,
};
use confluence_algorithms::hydrology::stream_highlights;
use confluence_core::io::{read_stream_records, JsonStreamSearch};
use confluence_core::segment::{ingest, SegmentId, StreamSegment};
use confluence_core::vector::FeatureCollection;
use confluence_core::DEFAULT_SEARCH_RADIUS;
use geo_types::Coord;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "confluence")]
#[command(author, version, long_about = None)]
#[command(about = "Stream network highlighting and apportionment")]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Highlight the upstream and downstream network of a selected segment
    Highlight {
        /// Stream records (JSON array, or object with a `streams` array)
        input: PathBuf,
        /// Feature id of the selected segment
        #[arg(short, long)]
        selected: i64,
        /// Output file for the selected/upstream/downstream GeoJSON layers
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apportion demand across streams near a point of interest
    Apportion {
        /// Stream records with distances to the point of interest
        input: PathBuf,
        /// Point of interest as 'x,y'
        #[arg(short, long)]
        point: String,
        /// Search radius
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_RADIUS)]
        radius: f64,
        /// Distance exponent: 1 (linear) or 2 (squared)
        #[arg(short, long, default_value = "2")]
        weighting_factor: f64,
        /// Order candidates by distance before curation (nearest wins overlaps)
        #[arg(long)]
        sort_by_distance: bool,
        /// Keep only the first segment of each watershed code
        #[arg(long)]
        remove_overlaps: bool,
        /// Remove segments at or below --min-apportionment percent
        #[arg(long)]
        remove_low: bool,
        /// Threshold for --remove-low, in percent
        #[arg(long, default_value = "10")]
        min_apportionment: f64,
        /// Comma-separated feature ids to remove
        #[arg(long, value_delimiter = ',')]
        remove: Vec<i64>,
        /// Write export rows (JSON) to this file
        #[arg(long)]
        export: Option<PathBuf>,
        /// Write distance lines (GeoJSON) to this file
        #[arg(long)]
        lines: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_network(path: &Path) -> Result<Vec<StreamSegment>> {
    let pb = spinner("Reading streams...");
    let records = read_stream_records(path).context("Failed to read stream records")?;
    let segments = ingest(records).context("Invalid stream records")?;
    pb.finish_and_clear();
    info!("Input: {} segments", segments.len());
    Ok(segments)
}

fn parse_point(s: &str) -> Result<Coord<f64>> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        anyhow::bail!("Point must be 'x,y', got: {}", s);
    }
    let x: f64 = parts[0].trim().parse().context("Invalid x")?;
    let y: f64 = parts[1].trim().parse().context("Invalid y")?;
    Ok(Coord { x, y })
}

fn write_json(value: &serde_json::Value, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, value).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn geojson_value(collection: &FeatureCollection) -> Result<serde_json::Value> {
    serde_json::to_value(collection.to_geojson()).context("Failed to encode GeoJSON")
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn print_table(session: &AnalysisSession, normalization: Normalization) {
    let engine = session.engine();
    println!(
        "{:>8}  {:<24} {:>12} {:>10} {:>8}",
        "ID", "Name", "Reach (m)", "Dist (m)", "Demand"
    );
    for seg in engine.active() {
        println!(
            "{:>8}  {:<24} {:>12.1} {:>10.2} {:>7.2}%",
            seg.id,
            seg.name.as_deref().unwrap_or("-"),
            seg.reach_length,
            seg.distance,
            seg.apportionment
        );
    }
    match normalization {
        Normalization::Normalized { .. } => println!(
            "{} streams, weighting factor {}, total {:.2}%",
            engine.len(),
            engine.weighting_factor(),
            engine.total_apportionment()
        ),
        Normalization::Undefined => println!("No streams left to apportion"),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Highlight {
            input,
            selected,
            output,
        } => {
            let network = read_network(&input)?;
            let start = Instant::now();
            let selected_segment = network
                .iter()
                .find(|s| s.id == SegmentId(selected))
                .with_context(|| {
                    format!("No segment with id {} in {}", selected, input.display())
                })?;
            let highlights = stream_highlights(selected_segment, &network);
            let elapsed = start.elapsed();

            println!(
                "Selected {}: {} selected, {} upstream, {} downstream",
                selected,
                highlights.selected.len(),
                highlights.upstream.len(),
                highlights.downstream.len()
            );

            if let Some(output) = output {
                let mut layers = serde_json::Map::new();
                for (name, collection) in highlights.feature_collections() {
                    layers.insert(name.to_string(), geojson_value(&collection)?);
                }
                write_json(&serde_json::Value::Object(layers), &output)?;
                done("Highlights", &output, elapsed);
            }
        }

        Commands::Apportion {
            input,
            point,
            radius,
            weighting_factor,
            sort_by_distance,
            remove_overlaps,
            remove_low,
            min_apportionment,
            remove,
            export,
            lines,
        } => {
            let point = parse_point(&point)?;
            let params = ApportionmentParams {
                weighting_factor: WeightingFactor::try_from(weighting_factor)?,
                min_apportionment,
            };
            let search = JsonStreamSearch::new(&input);
            let mut session = AnalysisSession::new(&params);

            let pb = spinner("Searching nearby streams...");
            let start = Instant::now();
            let outcome = session
                .fetch(&search, point, radius)
                .context("Nearby stream search failed")?;
            pb.finish_and_clear();

            let mut normalization = match outcome {
                FetchOutcome::Loaded { count, normalization } => {
                    info!("Found {} streams within {}", count, radius);
                    normalization
                }
                FetchOutcome::Stale => anyhow::bail!("Search response was superseded"),
            };

            let engine = session.engine_mut();
            if sort_by_distance {
                engine.sort_by_distance();
            }
            if remove_overlaps {
                normalization = engine.remove_overlaps();
            }
            if remove_low {
                normalization = engine.remove_below_threshold(params.min_apportionment);
            }
            if !remove.is_empty() {
                let ids: Vec<SegmentId> = remove.into_iter().map(SegmentId).collect();
                normalization = engine.remove_selected(&ids);
            }
            let elapsed = start.elapsed();

            print_table(&session, normalization);

            if let Some(path) = export {
                let rows = serde_json::to_value(session.engine().export_rows())
                    .context("Failed to encode export rows")?;
                write_json(&rows, &path)?;
                done("Export", &path, elapsed);
            }
            if let Some(path) = lines {
                write_json(&geojson_value(&session.distance_lines())?, &path)?;
                done("Distance lines", &path, elapsed);
            }
        }
    }

    Ok(())
}
