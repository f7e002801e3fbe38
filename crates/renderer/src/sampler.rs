//! Samples a forecast field over the visible map and draws barbs.

use std::collections::HashSet;

use forecast_client::ForecastField;
use serde::Serialize;
use tracing::debug;
use wind_common::{normalize_lon, ForecastMeta, RouteTimeSnapshot};

use crate::barbs::BarbGlyph;
use crate::canvas::Canvas;
use crate::style::BarbStyle;
use crate::view::MapView;

/// Screen bucket edge used to keep barbs from overlapping, in pixels.
pub const DEDUP_BUCKET_PX: f32 = 25.0;

/// Grid cells this far outside the view (degrees) are still considered.
pub const CULL_MARGIN_DEG: f64 = 1.0;

/// Grid stride for a zoom level: coarser when zoomed out.
pub fn stride_for_zoom(zoom: f64) -> usize {
    if zoom <= 4.0 {
        6
    } else if zoom <= 6.0 {
        4
    } else if zoom <= 8.0 {
        3
    } else {
        2
    }
}

/// What one redraw did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RedrawStats {
    /// Forecast step sampled.
    pub time_index: usize,
    pub stride: usize,
    /// Glyphs drawn (calm circles included).
    pub drawn: usize,
    /// Candidates outside the expanded view bounds.
    pub culled: usize,
    /// Candidates dropped because their screen bucket was taken.
    pub deduplicated: usize,
    /// Candidates with no finite sample.
    pub missing: usize,
}

/// Draws wind barbs for one forecast onto a canvas.
#[derive(Debug, Clone, Default)]
pub struct WindRenderer {
    style: BarbStyle,
}

impl WindRenderer {
    pub fn new(style: BarbStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &BarbStyle {
        &self.style
    }

    /// Clear the canvas and draw barbs for the time of `snapshot`, or for the
    /// run start when no route time is active.
    pub fn redraw<C, V>(
        &self,
        canvas: &mut C,
        view: &V,
        meta: &ForecastMeta,
        field: &ForecastField,
        snapshot: Option<&RouteTimeSnapshot>,
    ) -> RedrawStats
    where
        C: Canvas + ?Sized,
        V: MapView + ?Sized,
    {
        canvas.clear();

        let target = snapshot.map_or(meta.run_start, RouteTimeSnapshot::epoch);
        let time_index = meta.time_resolver().resolve_index(target);
        let stride = stride_for_zoom(view.zoom());
        let bounds = view.bounds().expand(CULL_MARGIN_DEG);
        let grid = &meta.grid;

        let mut stats = RedrawStats {
            time_index,
            stride,
            ..RedrawStats::default()
        };
        let mut used = HashSet::new();

        for lat_index in (0..grid.lat_count).step_by(stride) {
            let lat = grid.lat_at(lat_index);
            for lon_index in (0..grid.lon_count).step_by(stride) {
                let lon = normalize_lon(grid.lon_at(lon_index));
                if !bounds.contains(lon, lat) {
                    stats.culled += 1;
                    continue;
                }

                let point = view.project(lat, lon);
                let bucket = (
                    (point.x / DEDUP_BUCKET_PX).floor() as i64,
                    (point.y / DEDUP_BUCKET_PX).floor() as i64,
                );
                if !used.insert(bucket) {
                    stats.deduplicated += 1;
                    continue;
                }

                let glyph = field
                    .sample(time_index, lat_index, lon_index)
                    .and_then(|s| BarbGlyph::new(point, s.u, s.v));
                match glyph {
                    Some(glyph) => {
                        glyph.draw(canvas, &self.style);
                        stats.drawn += 1;
                    }
                    None => stats.missing += 1,
                }
            }
        }

        debug!(
            time_index = stats.time_index,
            stride = stats.stride,
            drawn = stats.drawn,
            culled = stats.culled,
            deduplicated = stats.deduplicated,
            missing = stats.missing,
            "Redrew wind barbs"
        );

        stats
    }
}
