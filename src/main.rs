use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use terramesh::config::FileConfig;
use terramesh::domain::BoundingBox;
use terramesh::server::{AppState, router};
use terramesh::services::{MapFetcher, ModelGenerator, TerrainParams};

/// Fetch OpenStreetMap buildings and SRTM elevation and turn them into STL models
///
/// Examples:
///   # Run the HTTP service on the default address (127.0.0.1:5000)
///   terramesh serve
///
///   # Download building footprints for a bounding box
///   terramesh fetch-osm --bbox 7.41,43.72,7.43,43.73
///
///   # Extrude them to 15 m tall prisms
///   terramesh generate-osm --geojson static/models/osm_bbox.geojson --height 15
///
///   # Download and triangulate terrain
///   OPENTOPO_API_KEY=... terramesh fetch-terrain --bbox 7.41,43.72,7.43,43.73
///   terramesh generate-terrain --tiff static/models/elevation.tif --smooth-sigma 2
#[derive(Parser, Debug)]
#[command(name = "terramesh")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (optional, auto-searches terramesh.toml if not provided)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for downloaded data and generated models
    #[arg(long, global = true, env = "TERRAMESH_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Address to listen on
        #[arg(long, env = "TERRAMESH_BIND")]
        bind: Option<SocketAddr>,
    },
    /// Download building footprints to GeoJSON
    FetchOsm {
        /// minlon,minlat,maxlon,maxlat
        #[arg(
            long,
            conflicts_with = "place",
            required_unless_present = "place",
            allow_hyphen_values = true
        )]
        bbox: Option<BoundingBox>,

        /// Place name to geocode instead of a bounding box
        #[arg(long)]
        place: Option<String>,
    },
    /// Download an SRTM elevation GeoTIFF
    FetchTerrain {
        /// minlon,minlat,maxlon,maxlat
        #[arg(long, allow_hyphen_values = true)]
        bbox: BoundingBox,
    },
    /// Extrude GeoJSON footprints into an STL model
    GenerateOsm {
        #[arg(long)]
        geojson: PathBuf,

        /// Extrusion height in meters
        #[arg(long, default_value = "20.0")]
        height: f64,
    },
    /// Triangulate a GeoTIFF elevation raster into an STL model
    GenerateTerrain {
        #[arg(long)]
        tiff: PathBuf,

        /// Vertical scale applied to elevation values
        #[arg(long, default_value = "0.0001", allow_hyphen_values = true)]
        z_scale: f64,

        /// Keep every N-th row and column
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
        skip: u64,

        /// Gaussian smoothing sigma in samples (0 disables)
        #[arg(long, default_value = "10.0")]
        smooth_sigma: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let file_config = match &cli.config {
        Some(path) => FileConfig::from_path(path)?,
        None => FileConfig::load().unwrap_or_default(),
    }
    .with_env_overrides();
    tracing::debug!(config = ?file_config, "Resolved configuration");

    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| file_config.server.output_dir.clone());

    let command = cli.command.unwrap_or(Command::Serve { bind: None });
    match command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or(file_config.server.bind);
            let state = AppState {
                fetcher: MapFetcher::new(&output_dir, &file_config)?,
                generator: ModelGenerator::new(&output_dir)?,
            };
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime.block_on(serve(Arc::new(state), bind))
        }
        Command::FetchOsm { bbox, place } => {
            let fetcher = MapFetcher::new(&output_dir, &file_config)?;
            let spinner = create_spinner("Fetching buildings from OpenStreetMap...");
            let start = Instant::now();
            let path = match (bbox, place) {
                (Some(bbox), _) => fetcher.fetch_osm_data(&bbox),
                (None, Some(place)) => fetcher.fetch_osm_place(&place),
                (None, None) => None,
            };
            finish(spinner, path, "Failed to fetch", start)
        }
        Command::FetchTerrain { bbox } => {
            let fetcher = MapFetcher::new(&output_dir, &file_config)?;
            let spinner = create_spinner("Fetching elevation from OpenTopography...");
            let start = Instant::now();
            let path = fetcher.fetch_srtm_elevation(&bbox);
            finish(spinner, path, "Failed to fetch", start)
        }
        Command::GenerateOsm { geojson, height } => {
            if !height.is_finite() || height <= 0.0 {
                bail!("--height must be a positive number");
            }
            let generator = ModelGenerator::new(&output_dir)?;
            let spinner = create_spinner("Extruding building footprints...");
            let start = Instant::now();
            let path = generator.generate_3d_model_from_osm(&geojson, height);
            finish(spinner, path, "Failed to generate", start)
        }
        Command::GenerateTerrain {
            tiff,
            z_scale,
            skip,
            smooth_sigma,
        } => {
            if !smooth_sigma.is_finite() || smooth_sigma < 0.0 {
                bail!("--smooth-sigma must be a non-negative number");
            }
            let params = TerrainParams {
                z_scale,
                skip: usize::try_from(skip).context("--skip is too large")?,
                smooth_sigma,
            };
            let generator = ModelGenerator::new(&output_dir)?;
            let spinner = create_spinner("Triangulating terrain...");
            let start = Instant::now();
            let path = generator.generate_3d_model_from_elevation(&tiff, params);
            finish(spinner, path, "Failed to generate", start)
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(state: Arc<AppState>, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(%bind, output_dir = %state.generator.output_dir().display(), "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

fn finish(spinner: ProgressBar, path: Option<PathBuf>, failure: &str, start: Instant) -> Result<()> {
    match path {
        Some(path) => {
            spinner.finish_with_message(format!(
                "Wrote {} ({:.1}s)",
                path.display(),
                start.elapsed().as_secs_f64()
            ));
            println!("{}", path.display());
            Ok(())
        }
        None => {
            spinner.abandon_with_message(failure.to_string());
            bail!("{failure}");
        }
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
