//! Tests for the barb sampler against a recording canvas.

use chrono::Duration;
use forecast_client::{FieldDims, ForecastField};
use renderer::{Canvas, Rgba, ScreenPoint, WebMercatorView, WindRenderer};
use test_utils::{create_time_ramp_wind, create_uniform_wind, run_start, sample_meta, wind_meta};
use wind_common::{ComponentLayout, ForecastMeta, RouteTimeSnapshot};

// ============================================================================
// Helper functions
// ============================================================================

#[derive(Default)]
struct Recorder {
    clears: usize,
    lines: Vec<[ScreenPoint; 2]>,
    polygons: usize,
    circles: Vec<ScreenPoint>,
}

impl Canvas for Recorder {
    fn clear(&mut self) {
        self.clears += 1;
        self.lines.clear();
        self.polygons = 0;
        self.circles.clear();
    }

    fn stroke_polyline(&mut self, points: &[ScreenPoint], _color: Rgba, _width: f32) {
        for pair in points.windows(2) {
            self.lines.push([pair[0], pair[1]]);
        }
    }

    fn fill_polygon(&mut self, _points: &[ScreenPoint], _color: Rgba) {
        self.polygons += 1;
    }

    fn stroke_circle(&mut self, center: ScreenPoint, _radius: f32, _color: Rgba, _width: f32) {
        self.circles.push(center);
    }

    fn fill_circle(&mut self, center: ScreenPoint, _radius: f32, _color: Rgba) {
        self.circles.push(center);
    }
}

fn field(meta: &ForecastMeta, values: Vec<f32>) -> ForecastField {
    ForecastField::from_values(values, FieldDims::from_meta(meta), ComponentLayout::WIND_ONLY).unwrap()
}

/// Wide view over the 5x6 fixture grid (40..44N, 10..5W) at stride 2.
fn wide_view() -> WebMercatorView {
    WebMercatorView::new(42.0, -7.5, 9.0, 4096, 4096)
}

fn snapshot_at_hours(hours: i64) -> RouteTimeSnapshot {
    RouteTimeSnapshot {
        route_start: run_start(),
        step_duration_secs: 3600,
        index: hours as usize,
    }
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn test_draws_one_glyph_per_strided_cell() {
    let meta = wind_meta();
    let field = field(&meta, create_uniform_wind(FieldDims::from_meta(&meta), 2, 10.0, 0.0, 0.0));
    let mut canvas = Recorder::default();

    let stats = WindRenderer::default().redraw(&mut canvas, &wide_view(), &meta, &field, None);

    assert_eq!(stats.stride, 2);
    // rows 0,2,4 x columns 0,2,4
    assert_eq!(stats.drawn, 9);
    assert_eq!((stats.culled, stats.deduplicated, stats.missing), (0, 0, 0));
    assert_eq!(canvas.clears, 1);
}

#[test]
fn test_time_index_follows_snapshot() {
    let meta = wind_meta();
    let values = create_time_ramp_wind(FieldDims::from_meta(&meta), 5.0);
    let field = field(&meta, values);
    let renderer = WindRenderer::default();

    // no route time: run start, step 0, 5 m/s = 12.2 kt resolved, one barb
    let mut canvas = Recorder::default();
    let stats = renderer.redraw(&mut canvas, &wide_view(), &meta, &field, None);
    assert_eq!(stats.time_index, 0);
    assert_eq!(canvas.lines.len(), 9 * 2);

    // E + 4h resolves to step 1 (3h), 10 m/s = 21.9 kt resolved, two barbs
    let snapshot = snapshot_at_hours(4);
    let stats = renderer.redraw(&mut canvas, &wide_view(), &meta, &field, Some(&snapshot));
    assert_eq!(stats.time_index, 1);
    assert_eq!(canvas.lines.len(), 9 * 3);
    assert_eq!(canvas.clears, 2);

    // past the last step
    let snapshot = snapshot_at_hours(48);
    let stats = renderer.redraw(&mut canvas, &wide_view(), &meta, &field, Some(&snapshot));
    assert_eq!(stats.time_index, 3);
}

#[test]
fn test_calm_cells_draw_circles() {
    let meta = wind_meta();
    let field = field(&meta, create_uniform_wind(FieldDims::from_meta(&meta), 2, 0.2, 0.1, 0.0));
    let mut canvas = Recorder::default();

    let stats = WindRenderer::default().redraw(&mut canvas, &wide_view(), &meta, &field, None);

    assert_eq!(stats.drawn, 9);
    assert_eq!(canvas.circles.len(), 9);
    assert!(canvas.lines.is_empty());
}

#[test]
fn test_non_finite_samples_are_missing() {
    let meta = wind_meta();
    let field = field(
        &meta,
        create_uniform_wind(FieldDims::from_meta(&meta), 2, f32::NAN, 1.0, 0.0),
    );
    let mut canvas = Recorder::default();

    let stats = WindRenderer::default().redraw(&mut canvas, &wide_view(), &meta, &field, None);
    assert_eq!((stats.drawn, stats.missing), (0, 9));
}

// ============================================================================
// Culling and de-duplication
// ============================================================================

#[test]
fn test_far_view_culls_everything() {
    let meta = wind_meta();
    let field = field(&meta, create_uniform_wind(FieldDims::from_meta(&meta), 2, 10.0, 0.0, 0.0));
    let view = WebMercatorView::new(-30.0, 140.0, 9.0, 800, 600);
    let mut canvas = Recorder::default();

    let stats = WindRenderer::default().redraw(&mut canvas, &view, &meta, &field, None);
    assert_eq!((stats.drawn, stats.culled), (0, 9));
}

#[test]
fn test_cells_just_outside_view_are_kept() {
    // View over 42N 7.5W about 2.8 degrees wide (8.9W to 6.1W); with the
    // 1 degree margin the columns at 8W and 6W stay, 10W does not.
    let meta = wind_meta();
    let field = field(&meta, create_uniform_wind(FieldDims::from_meta(&meta), 2, 10.0, 0.0, 0.0));
    let view = WebMercatorView::new(42.0, -7.5, 9.0, 1024, 4096);
    let mut canvas = Recorder::default();

    let stats = WindRenderer::default().redraw(&mut canvas, &view, &meta, &field, None);
    assert_eq!(stats.culled, 3);
    assert_eq!(stats.drawn, 6);
}

#[test]
fn test_dense_grid_is_deduplicated() {
    // 13x13 cells at 0.1 degree: at zoom 2 the 3x3 strided candidates span
    // under 4 pixels, so they share at most four 25 px buckets.
    let mut meta = sample_meta(&[0.0], 13, 13, &["u", "v"]);
    meta.grid.lat_step = 0.1;
    meta.grid.lon_step = 0.1;
    let field = field(&meta, create_uniform_wind(FieldDims::from_meta(&meta), 2, 10.0, 0.0, 0.0));
    let view = WebMercatorView::new(40.0, -10.0, 2.0, 512, 512);
    let mut canvas = Recorder::default();

    let stats = WindRenderer::default().redraw(&mut canvas, &view, &meta, &field, None);
    assert_eq!(stats.stride, 6);
    assert_eq!(stats.drawn + stats.deduplicated, 9);
    assert!(stats.drawn <= 4);
    assert!(stats.deduplicated >= 5);
}

#[test]
fn test_snapshot_epoch() {
    let snapshot = snapshot_at_hours(4);
    assert_eq!(snapshot.epoch(), run_start() + Duration::hours(4));
}
