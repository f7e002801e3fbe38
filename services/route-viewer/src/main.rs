//! Route viewer.
//!
//! Loads a forecast from the forecast server, attaches a computed route and
//! plays it back, writing one PNG per frame:
//! - Wind barbs sampled at the route's current time
//! - The route track and current position on top
//! - A `frames.json` manifest with per-frame redraw statistics
//!
//! With `--describe` it only prints the forecast metadata.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use forecast_client::{ForecastCache, HttpForecastSource};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use wind_common::RouteState;

use route_viewer::{FrameWriter, ViewerConfig, ViewerSession};

#[derive(Parser, Debug)]
#[command(name = "route-viewer")]
#[command(about = "Play a computed route over forecast wind barbs")]
struct Args {
    /// Route JSON as returned by the routing service
    #[arg(long, required_unless_present = "describe")]
    route: Option<PathBuf>,

    /// Print the selected forecast's metadata as JSON and exit
    #[arg(long)]
    describe: bool,

    /// Viewer config file (YAML)
    #[arg(short, long, env = "VIEWER_CONFIG")]
    config: Option<PathBuf>,

    /// Forecast model id
    #[arg(short, long)]
    model: Option<String>,

    /// Explicit forecast file on the server
    #[arg(long)]
    file: Option<String>,

    /// Request only the u/v components
    #[arg(long)]
    reduced: bool,

    /// Forecast server endpoint
    #[arg(long, env = "FORECAST_BASE_URL")]
    base_url: Option<String>,

    /// Directory for frames
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Zoom level of the view
    #[arg(long)]
    zoom: Option<f64>,

    /// Render only this route index instead of playing the whole route
    #[arg(long)]
    frame: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn apply(&self, config: &mut ViewerConfig) {
        if let Some(model) = &self.model {
            config.forecast.model = Some(model.clone());
            config.forecast.file = None;
        }
        if let Some(file) = &self.file {
            config.forecast.file = Some(file.clone());
        }
        if self.reduced {
            config.forecast.reduced = true;
        }
        if let Some(url) = &self.base_url {
            config.client.base_url = url.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(zoom) = self.zoom {
            config.view.zoom = zoom;
        }
    }
}

fn init_tracing(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;

    let mut config = ViewerConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    info!(
        base_url = %config.client.base_url,
        selector = %config.forecast.selector()?,
        zoom = config.view.zoom,
        "Starting route viewer"
    );

    let source = HttpForecastSource::new(config.client.clone())?;
    let cache = Arc::new(ForecastCache::new(Arc::new(source)));

    if args.describe {
        let meta = cache.fetch_meta(&config.forecast.selector()?).await?;
        println!("{}", serde_json::to_string_pretty(&meta)?);
        return Ok(());
    }

    let route_path = args.route.as_deref().context("--route is required")?;
    let body = tokio::fs::read_to_string(route_path)
        .await
        .with_context(|| format!("Failed to read route {}", route_path.display()))?;
    let route = RouteState::from_json(&body).context("Invalid route")?;

    let mut session = ViewerSession::new(cache, &config)?;

    let forecast = session.attach_route(route).await?;
    info!(
        file = %forecast.meta.source,
        run_start = %forecast.meta.run_start,
        steps = forecast.meta.step_count(),
        "Forecast ready"
    );

    let mut writer = FrameWriter::create(&config.output.dir).await?;
    match args.frame {
        Some(index) => {
            session.controller_mut().set_index(index);
            session.write_current(&forecast, &mut writer).await?;
        }
        None => {
            session.play(&mut writer).await?;
        }
    }
    writer.finish().await?;

    Ok(())
}
