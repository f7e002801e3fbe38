//! A viewing session: one forecast cache, one playback controller, one view.

use std::sync::Arc;

use anyhow::{Context, Result};
use forecast_client::{ForecastCache, LoadedForecast};
use playback::{PlaybackController, PlaybackState};
use renderer::{Canvas, MapView, PixmapCanvas, RedrawStats, Rgba, ScreenPoint, WebMercatorView, WindRenderer};
use tokio::sync::watch;
use tracing::{info, warn};
use wind_common::{RouteState, RouteTimeSnapshot, Selector};

use crate::config::{OverlayStyle, ViewerConfig};
use crate::frames::FrameWriter;

pub struct ViewerSession {
    cache: Arc<ForecastCache>,
    selector: Selector,
    reduced: bool,
    controller: PlaybackController,
    updates: watch::Receiver<Option<RouteTimeSnapshot>>,
    renderer: WindRenderer,
    view: WebMercatorView,
    overlay: OverlayStyle,
    background: Rgba,
}

impl ViewerSession {
    pub fn new(cache: Arc<ForecastCache>, config: &ViewerConfig) -> Result<Self> {
        let controller = PlaybackController::new(config.playback.clone());
        let updates = controller.subscribe();
        Ok(Self {
            cache,
            selector: config.forecast.selector()?,
            reduced: config.forecast.reduced,
            controller,
            updates,
            renderer: WindRenderer::new(config.style.clone()),
            view: config.view,
            overlay: config.overlay.clone(),
            background: config.output.background,
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController {
        &mut self.controller
    }

    /// The forecast for the current selection, loading it if needed.
    pub async fn forecast(&self) -> Result<LoadedForecast> {
        self.cache
            .ensure_loaded(&self.selector, self.reduced)
            .await?
            .context("Forecast load already in progress")
    }

    /// Attach a route, switching forecast first when the route was computed
    /// against a different file than the one cached.
    pub async fn attach_route(&mut self, route: RouteState) -> Result<LoadedForecast> {
        if let Some(file) = route.forecast_file() {
            if !self.cache.matches_file(file).await {
                info!(file, previous = %self.selector, "Route uses another forecast, reloading");
                self.selector = Selector::File(file.to_string());
                self.cache.force_reload(&self.selector, self.reduced).await?;
            }
        }

        let forecast = self.forecast().await?;
        if let Some(file) = route.forecast_file() {
            if forecast.meta.source != file {
                warn!(
                    route_file = file,
                    loaded = %forecast.meta.source,
                    "Server returned a different forecast than the route's"
                );
            }
        }

        self.controller.attach_route(route);
        Ok(forecast)
    }

    /// Render barbs for `snapshot` with the route overlay on top.
    pub fn render(
        &self,
        forecast: &LoadedForecast,
        snapshot: Option<&RouteTimeSnapshot>,
    ) -> Result<(PixmapCanvas, RedrawStats)> {
        let mut canvas = PixmapCanvas::with_background(self.view.width, self.view.height, self.background)?;
        let stats = self
            .renderer
            .redraw(&mut canvas, &self.view, &forecast.meta, &forecast.field, snapshot);
        self.draw_overlay(&mut canvas);
        Ok((canvas, stats))
    }

    fn draw_overlay<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        let Some(route) = self.controller.route() else {
            return;
        };

        let track: Vec<ScreenPoint> = route
            .points()
            .iter()
            .map(|p| self.view.project(p.lat, p.lon))
            .collect();
        canvas.stroke_polyline(&track, self.overlay.track_color, self.overlay.track_width);

        if let Some(point) = self.controller.current_point() {
            canvas.fill_circle(
                self.view.project(point.lat, point.lon),
                self.overlay.marker_radius,
                self.overlay.marker_color,
            );
        }
    }

    /// Render the current position into `writer`.
    pub async fn write_current(&mut self, forecast: &LoadedForecast, writer: &mut FrameWriter) -> Result<()> {
        let snapshot = *self.updates.borrow_and_update();
        let (canvas, stats) = self.render(forecast, snapshot.as_ref())?;
        writer
            .write(
                snapshot.map(|s| s.index),
                snapshot.map(|s| s.epoch()),
                &canvas.encode_png()?,
                stats,
            )
            .await?;
        Ok(())
    }

    /// Play the attached route to the end, writing a frame for the starting
    /// position and for every published index change.
    pub async fn play(&mut self, writer: &mut FrameWriter) -> Result<usize> {
        let forecast = self.forecast().await?;
        let before = writer.records().len();

        self.write_current(&forecast, writer).await?;
        self.controller.play();

        while self.controller.state() == PlaybackState::Playing {
            self.controller.next_tick().await;
            if self.updates.has_changed()? {
                self.write_current(&forecast, writer).await?;
            }
        }

        let frames = writer.records().len() - before;
        info!(
            frames,
            index = self.controller.index(),
            stats = ?self.cache.stats(),
            "Playback finished"
        );
        Ok(frames)
    }
}
