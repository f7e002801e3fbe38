//! Viewer configuration.
//!
//! Loaded from an optional YAML file; sections left out fall back to
//! defaults, and the forecast client and playback sections fall back to
//! their environment variables. Command-line flags are applied on top by
//! `main`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use forecast_client::ClientConfig;
use playback::PlaybackConfig;
use renderer::{BarbStyle, Rgba, WebMercatorView};
use serde::{Deserialize, Serialize};
use tracing::info;
use wind_common::Selector;

/// Which forecast to load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSection {
    /// Model id (latest run)
    pub model: Option<String>,
    /// Explicit forecast file on the server, takes precedence over `model`
    pub file: Option<String>,
    /// Request only the u/v components
    pub reduced: bool,
}

impl ForecastSection {
    pub fn selector(&self) -> Result<Selector> {
        match (&self.file, &self.model) {
            (Some(file), _) => Ok(Selector::File(file.clone())),
            (None, Some(model)) => Ok(Selector::Model(model.clone())),
            (None, None) => bail!("no forecast selected: set forecast.model or forecast.file"),
        }
    }
}

/// Track and position marker drawn over each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub track_color: Rgba,
    pub track_width: f32,
    pub marker_color: Rgba,
    pub marker_radius: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            track_color: Rgba::rgb(0, 90, 200),
            track_width: 2.0,
            marker_color: Rgba::rgb(220, 30, 30),
            marker_radius: 5.0,
        }
    }
}

/// Where and how frames are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
    pub background: Rgba,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("frames"),
            background: Rgba::rgb(255, 255, 255),
        }
    }
}

fn default_view() -> WebMercatorView {
    WebMercatorView::new(45.0, -5.0, 6.0, 1024, 768)
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub forecast: ForecastSection,
    #[serde(default = "ClientConfig::from_env")]
    pub client: ClientConfig,
    #[serde(default = "PlaybackConfig::from_env")]
    pub playback: PlaybackConfig,
    #[serde(default = "default_view")]
    pub view: WebMercatorView,
    #[serde(default)]
    pub style: BarbStyle,
    #[serde(default)]
    pub overlay: OverlayStyle,
    #[serde(default)]
    pub output: OutputSection,
}

impl ViewerConfig {
    /// Configuration from the environment only.
    pub fn from_env() -> Self {
        Self {
            forecast: ForecastSection::default(),
            client: ClientConfig::from_env(),
            playback: PlaybackConfig::from_env(),
            view: default_view(),
            style: BarbStyle::default(),
            overlay: OverlayStyle::default(),
            output: OutputSection::default(),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse viewer config")
    }

    /// Load from `path`, or from the environment when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::from_env());
        };

        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_yaml(&yaml)?;
        info!(path = %path.display(), "Loaded viewer config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.forecast.selector()?;
        if let Err(e) = self.client.validate() {
            bail!("invalid client config: {e}");
        }
        if self.view.width == 0 || self.view.height == 0 {
            bail!("view size must be non-zero");
        }
        if !(0.0..=22.0).contains(&self.view.zoom) {
            bail!("zoom {} out of range 0..=22", self.view.zoom);
        }
        Ok(())
    }
}
