//! Common test fixtures: forecast metadata and routes.

use chrono::{DateTime, Duration, TimeZone, Utc};
use wind_common::{ForecastMeta, GridGeometry, RoutePoint, RouteState};

/// Run start used by all fixtures (2024-01-15T12:00:00Z).
pub fn run_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

/// Metadata for a small grid over the Bay of Biscay.
///
/// The grid starts at (40N, 10W) with 1 degree spacing.
pub fn sample_meta(steps_hours: &[f64], lat_count: usize, lon_count: usize, components: &[&str]) -> ForecastMeta {
    ForecastMeta {
        source: "gfs_2024011512.grb2".to_string(),
        run_start: run_start(),
        grid: GridGeometry {
            lat0: 40.0,
            lon0: -10.0,
            lat_step: 1.0,
            lon_step: 1.0,
            lat_count,
            lon_count,
        },
        steps_hours: steps_hours.to_vec(),
        components: components.iter().map(|s| s.to_string()).collect(),
        component_count: components.len(),
        file_size: 0,
        file_time: None,
        info: None,
    }
}

/// Four 3-hourly steps on a 5x6 grid carrying u and v.
pub fn wind_meta() -> ForecastMeta {
    sample_meta(&[0.0, 3.0, 6.0, 9.0], 5, 6, &["10u", "10v"])
}

/// A straight route with `points` points spaced `step_secs` apart,
/// starting at the fixture run start.
pub fn linear_route(points: usize, step_secs: i64) -> RouteState {
    let start = run_start();
    let track = (0..points)
        .map(|i| RoutePoint {
            lat: 44.0 + i as f64 * 0.1,
            lon: -8.0 + i as f64 * 0.1,
            time: start + Duration::seconds(step_secs * i as i64),
        })
        .collect();
    RouteState::new(start, step_secs, track).expect("fixture route is valid")
}

/// Routing service JSON for [`linear_route`]-like tracks.
pub fn route_json(points: usize, step_secs: i64, grib_file: Option<&str>) -> String {
    let start = run_start().timestamp();
    let track: Vec<String> = (0..points)
        .map(|i| {
            format!(
                "[{},{},{}]",
                44.0 + i as f64 * 0.1,
                -8.0 + i as f64 * 0.1,
                start + step_secs * i as i64
            )
        })
        .collect();
    let grib = grib_file
        .map(|f| format!(r#","gribFile":"{f}""#))
        .unwrap_or_default();
    format!(
        r#"{{"track":[{}],"startEpoch":{},"stepDuration":{}{}}}"#,
        track.join(","),
        start,
        step_secs,
        grib
    )
}
