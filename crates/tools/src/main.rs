use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use foundation::LngLat;
use gateway::HttpGateway;
use layers::InMemoryHost;
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewer::{LayerLifecycleManager, RecordingUi, ViewerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Debug helpers for the vector tile table viewer")]
struct Args {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the z/x/y tile containing a point
    Tile {
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        zoom: f64,
    },

    /// Print the MVT URL of the tile containing a point
    Url {
        schema: String,
        table: String,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        zoom: f64,
        /// Tile server root (default: TILES_TILE_BASE, then the API base)
        #[arg(long)]
        tile_base: Option<String>,
    },

    /// Load a table against the live API on an in-memory map and print what
    /// the viewer would install
    Probe {
        schema: String,
        table: String,
        /// API root (default: TILES_API_BASE or http://localhost:8000)
        #[arg(long)]
        api_base: Option<String>,
        /// Move the map here after loading, as a user pan would
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,
        #[arg(long, default_value_t = 2.0)]
        zoom: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let fallback = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ViewerConfig::from_env().context("reading TILES_* environment")?;

    match args.command {
        Command::Tile { lon, lat, zoom } => {
            let tile = tools::tile_at(lon, lat, zoom)?;
            println!("{tile}");
        }
        Command::Url {
            schema,
            table,
            lon,
            lat,
            zoom,
            tile_base,
        } => {
            if tile_base.is_some() {
                config.tile_base = tile_base;
            }
            let gateway = config.http_gateway()?;
            let tile = tools::tile_at(lon, lat, zoom)?;
            println!("{}", tools::tile_url(&gateway, &schema, &table, tile));
        }
        Command::Probe {
            schema,
            table,
            api_base,
            lon,
            lat,
            zoom,
        } => {
            if let Some(api_base) = api_base {
                config.api_base = api_base;
            }
            probe(config, &schema, &table, lon.zip(lat), zoom).await?;
        }
    }

    Ok(())
}

async fn probe(
    config: ViewerConfig,
    schema: &str,
    table: &str,
    position: Option<(f64, f64)>,
    zoom: f64,
) -> anyhow::Result<()> {
    let gateway: HttpGateway = config
        .http_gateway()
        .with_context(|| format!("invalid API base {}", config.api_base))?;
    info!(api_base = %gateway.api_base(), schema, table, "probing table");

    let mut manager = LayerLifecycleManager::new(
        InMemoryHost::default(),
        RecordingUi::new(),
        Arc::new(gateway),
        config,
    )?;
    let outcome = manager.start(schema, table).await?;

    if let Some((lon, lat)) = position {
        tools::check_position(lon, lat)?;
        tools::parse_zoom(zoom)?;
        let events = manager.host_mut().move_to(LngLat::new(lon, lat), zoom);
        for event in events {
            manager.handle_event(event).await?;
        }
    }
    manager.settle().await;

    print!("{}", tools::describe_probe(&outcome, &manager));
    for warning in &manager.ui().warnings {
        println!("  warning: {warning}");
    }

    manager.stop()?;
    Ok(())
}
