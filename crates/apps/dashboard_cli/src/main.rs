mod headless;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dashboard::surface::{GraphicId, SketchEvent, SketchGraphic};
use dashboard::{Collaborators, Dashboard, DashboardConfig};
use formats::{load_feature_collection, parse_feature_collection, FeatureCollection};
use foundation::bounds::Extent;
use layers::query::InMemoryFeatureStore;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::headless::{HeadlessChart, HeadlessSketch, HeadlessSurface};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless population dashboard")]
struct Args {
    /// Local GeoJSON file (default: fetch the configured dataset URL)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Dataset URL, overriding DASHBOARD_DATASET_URL
    #[arg(long)]
    url: Option<String>,

    /// Switch to the 3D view before running the command
    #[arg(long)]
    scene: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the regions visible from the initial viewpoint
    List,

    /// Select regions intersecting a bbox and print the aggregate report
    Select {
        /// Bounding box: minLon,minLat,maxLon,maxLat
        #[arg(long)]
        bbox: String,
    },

    /// Navigate to a listed region and print its popup
    Open {
        /// Position in the visible list
        #[arg(long)]
        index: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = DashboardConfig::from_env()?;
    if let Some(url) = args.url {
        config.dataset_url = url;
    }

    let collection = match &args.file {
        Some(path) => load_feature_collection(path)?,
        None => fetch_collection(&config.dataset_url).await?,
    };
    info!(
        features = collection.features.len(),
        skipped = collection.skipped,
        "dataset loaded"
    );

    let store = Arc::new(InMemoryFeatureStore::new(collection.features));
    let chart = Arc::new(HeadlessChart::default());
    let dashboard = Dashboard::new(
        &config,
        store,
        Collaborators {
            view_surface: Arc::new(HeadlessSurface::default()),
            sketch: Arc::new(HeadlessSketch::default()),
            chart: chart.clone(),
        },
    );
    let _session = dashboard.start();
    if args.scene {
        dashboard.switch_view();
    }
    dashboard.results().refresh().await;

    match args.command {
        Command::List => {
            for entry in dashboard.results().entries() {
                println!("{}\t{}\t{}", entry.index, entry.feature.id, entry.label);
            }
        }
        Command::Select { bbox } => {
            let extent = parse_bbox(&bbox)?;
            let graphic = SketchGraphic {
                id: GraphicId(1),
                geometry: extent.to_polygon(),
            };
            let selection = dashboard.selection();
            if let Some(task) = selection.handle_event(&SketchEvent::started(graphic)) {
                task.await?;
            }

            let overlay = selection.overlay();
            let snapshot = dashboard.snapshot(overlay.features());
            let report = json!({
                "mode": dashboard.views().mode().label(),
                "selected": overlay.features().iter().map(|f| f.name()).collect::<Vec<_>>(),
                "totals": selection.totals(),
                "chart": chart.last_option().map(|o| o.to_json()),
                "triangles": snapshot.triangle_count(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Open { index } => {
            let popup = dashboard
                .results()
                .open_entry(index)
                .await
                .ok_or_else(|| format!("no visible region at index {index}"))?;
            println!("{}", popup.title);
            for row in popup.rows {
                println!("  {}: {}", row.label, row.value);
            }
        }
    }

    Ok(())
}

async fn fetch_collection(url: &str) -> Result<FeatureCollection, Box<dyn std::error::Error>> {
    info!(url, "fetching dataset");
    let text = reqwest::Client::new()
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(parse_feature_collection(&text)?)
}

fn parse_bbox(raw: &str) -> Result<Extent, String> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid bbox {raw:?}: {e}"))?;
    match parts.as_slice() {
        [min_lon, min_lat, max_lon, max_lat] if min_lon <= max_lon && min_lat <= max_lat => {
            Ok(Extent::new([*min_lon, *min_lat], [*max_lon, *max_lat]))
        }
        _ => Err(format!(
            "invalid bbox {raw:?}: expected minLon,minLat,maxLon,maxLat"
        )),
    }
}
