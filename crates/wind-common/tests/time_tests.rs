//! Forecast step resolution through ForecastMeta.

use chrono::{Duration, TimeZone, Utc};
use wind_common::{ForecastMeta, GridGeometry};

fn meta_with_steps(steps: &[f64]) -> ForecastMeta {
    ForecastMeta {
        source: "arpege_2024011506.grb2".to_string(),
        run_start: Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap(),
        grid: GridGeometry {
            lat0: 30.0,
            lon0: -30.0,
            lat_step: 1.0,
            lon_step: 1.0,
            lat_count: 10,
            lon_count: 10,
        },
        steps_hours: steps.to_vec(),
        components: vec!["u".to_string(), "v".to_string()],
        component_count: 2,
        file_size: 1024,
        file_time: None,
        info: Some("test run".to_string()),
    }
}

#[test]
fn test_query_between_steps_picks_closer_step() {
    let meta = meta_with_steps(&[0.0, 3.0, 6.0, 9.0]);
    let resolver = meta.time_resolver();
    assert_eq!(resolver.resolve_index(meta.run_start + Duration::hours(4)), 1);
}

#[test]
fn test_every_step_time_resolves_to_itself() {
    let meta = meta_with_steps(&[0.0, 1.0, 2.0, 3.0, 6.0, 12.0, 24.0, 48.0]);
    let resolver = meta.time_resolver();
    for (index, hours) in meta.steps_hours.iter().enumerate() {
        let t = meta.run_start + Duration::minutes((hours * 60.0) as i64);
        assert_eq!(resolver.resolve_index(t), index, "step {index}");
    }
}

#[test]
fn test_resolution_is_monotonic() {
    let meta = meta_with_steps(&[0.0, 3.0, 6.0, 9.0, 12.0]);
    let resolver = meta.time_resolver();
    let mut last = 0;
    for minutes in (-120..(15 * 60)).step_by(7) {
        let index = resolver.resolve_index(meta.run_start + Duration::minutes(minutes));
        assert!(index >= last, "index went backwards at {minutes} min");
        last = index;
    }
    assert_eq!(last, 4);
}
