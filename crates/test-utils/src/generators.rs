//! Test data generators for synthetic forecast dumps.
//!
//! These generators create predictable, verifiable buffers laid out the way
//! the forecast server sends them (time, lat, lon, component).

use forecast_client::FieldDims;

/// Creates a dump where every float equals its own flat offset.
///
/// Makes it trivial to check that a sample at `(t, lat, lon)` reads the
/// right slot: component `c` must equal
/// `((t * lat_count + lat) * lon_count + lon) * components + c`.
///
/// # Example
///
/// ```
/// use forecast_client::FieldDims;
/// use test_utils::create_indexed_values;
///
/// let values = create_indexed_values(FieldDims::new(2, 3, 4), 2);
/// assert_eq!(values.len(), 48);
/// assert_eq!(values[47], 47.0);
/// ```
pub fn create_indexed_values(dims: FieldDims, components: usize) -> Vec<f32> {
    (0..dims.samples() * components).map(|i| i as f32).collect()
}

/// Expected value of component `c` at `(t, lat, lon)` in an indexed dump.
pub fn indexed_value(dims: FieldDims, components: usize, t: usize, lat: usize, lon: usize, c: usize) -> f32 {
    (((t * dims.lat_count + lat) * dims.lon_count + lon) * components + c) as f32
}

/// Creates a dump with the same wind vector everywhere.
///
/// Optional slots (gust, wave) are filled with `extra`.
pub fn create_uniform_wind(dims: FieldDims, components: usize, u: f32, v: f32, extra: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(dims.samples() * components);
    for _ in 0..dims.samples() {
        data.push(u);
        data.push(v);
        for _ in 2..components {
            data.push(extra);
        }
    }
    data
}

/// Creates a u/v dump whose wind speed grows with the time step.
///
/// Step `t` carries a westerly of `(t + 1) * step_speed` m/s, so tests can
/// tell which time slice was sampled.
pub fn create_time_ramp_wind(dims: FieldDims, step_speed: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(dims.samples() * 2);
    for t in 0..dims.time_steps {
        let u = (t + 1) as f32 * step_speed;
        for _ in 0..dims.lat_count * dims.lon_count {
            data.push(u);
            data.push(0.0);
        }
    }
    data
}

/// Encode floats as the little-endian body of a dump response.
pub fn encode_le(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// U/V components (m/s) for a wind of `knots` blowing FROM `from_deg`
/// (meteorological convention, 0 = north, 90 = east).
pub fn wind_from(knots: f64, from_deg: f64) -> (f32, f32) {
    let speed_ms = knots / 1.943_844;
    let rad = from_deg.to_radians();
    ((-speed_ms * rad.sin()) as f32, (-speed_ms * rad.cos()) as f32)
}
