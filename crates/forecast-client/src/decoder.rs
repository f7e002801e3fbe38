//! Decoding of binary forecast dumps into randomly addressable fields.
//!
//! A dump is a flat little-endian f32 buffer laid out time-major, then
//! latitude, then longitude, then component:
//!
//! ```text
//! offset = ((t * lat_count + lat) * lon_count + lon) * component_count
//! ```
//!
//! The components present (and their order after u, v) are announced by a
//! response header, which is authoritative for the layout.

use bytes::Buf;
use tracing::{debug, warn};
use wind_common::{ComponentLayout, ForecastMeta};

use crate::error::{ForecastError, Result};

/// Logical dimensions of a field, excluding the component axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDims {
    pub time_steps: usize,
    pub lat_count: usize,
    pub lon_count: usize,
}

impl FieldDims {
    pub fn new(time_steps: usize, lat_count: usize, lon_count: usize) -> Self {
        Self {
            time_steps,
            lat_count,
            lon_count,
        }
    }

    /// Dimensions announced by forecast metadata.
    pub fn from_meta(meta: &ForecastMeta) -> Self {
        Self::new(meta.step_count(), meta.grid.lat_count, meta.grid.lon_count)
    }

    /// Number of samples (one per time step and grid point).
    pub fn samples(&self) -> usize {
        self.time_steps * self.lat_count * self.lon_count
    }
}

impl std::fmt::Display for FieldDims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.time_steps, self.lat_count, self.lon_count)
    }
}

/// One decoded sample. Components missing from the dump read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindSample {
    pub u: f32,
    pub v: f32,
    pub gust: f32,
    pub wave: f32,
}

/// A decoded forecast field.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastField {
    values: Vec<f32>,
    dims: FieldDims,
    layout: ComponentLayout,
}

impl ForecastField {
    /// Wrap already-decoded values, checking the buffer length.
    pub fn from_values(values: Vec<f32>, dims: FieldDims, layout: ComponentLayout) -> Result<Self> {
        let expected = dims.samples() * layout.count();
        if values.len() != expected {
            return Err(ForecastError::LengthMismatch {
                expected,
                actual: values.len(),
                dims: format!("{dims}x{}", layout.count()),
            });
        }

        Ok(Self {
            values,
            dims,
            layout,
        })
    }

    /// Sample at (time step, latitude row, longitude column).
    ///
    /// Returns `None` for any out-of-range index.
    pub fn sample(&self, time_index: usize, lat_index: usize, lon_index: usize) -> Option<WindSample> {
        let dims = &self.dims;
        if time_index >= dims.time_steps || lat_index >= dims.lat_count || lon_index >= dims.lon_count {
            return None;
        }

        let stride = self.layout.count();
        let offset = ((time_index * dims.lat_count + lat_index) * dims.lon_count + lon_index) * stride;
        let packed = &self.values[offset..offset + stride];

        Some(WindSample {
            u: packed[0],
            v: packed[1],
            gust: self.layout.gust_slot().map_or(0.0, |slot| packed[slot]),
            wave: self.layout.wave_slot().map_or(0.0, |slot| packed[slot]),
        })
    }

    pub fn dims(&self) -> FieldDims {
        self.dims
    }

    pub fn layout(&self) -> ComponentLayout {
        self.layout
    }

    pub fn component_count(&self) -> usize {
        self.layout.count()
    }

    /// Raw values in storage order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Size of the decoded buffer in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<f32>()
    }
}

/// Turns dump bodies into [`ForecastField`]s for known dimensions.
#[derive(Debug, Clone, Copy)]
pub struct FieldDecoder {
    dims: FieldDims,
    expected_components: Option<usize>,
}

impl FieldDecoder {
    pub fn new(dims: FieldDims) -> Self {
        Self {
            dims,
            expected_components: None,
        }
    }

    /// Decoder for a dump of the dataset described by `meta`.
    ///
    /// A reduced dump is expected to carry only u and v.
    pub fn for_meta(meta: &ForecastMeta, reduced_components: bool) -> Self {
        let expected = if reduced_components {
            2
        } else {
            meta.component_count
        };
        Self::new(FieldDims::from_meta(meta)).expect_components(expected)
    }

    /// Component count reported out of band, checked against the header.
    pub fn expect_components(mut self, count: usize) -> Self {
        self.expected_components = Some(count);
        self
    }

    /// Decode a little-endian f32 body whose components are listed in `header`.
    pub fn decode(&self, header: &str, body: &[u8]) -> Result<ForecastField> {
        let layout = ComponentLayout::parse_header(header);

        if let Some(expected) = self.expected_components {
            if expected != layout.count() {
                warn!(
                    expected = expected,
                    header_count = layout.count(),
                    header = header,
                    "Component count differs from metadata, using header layout"
                );
            }
        }

        if body.len() % 4 != 0 {
            return Err(ForecastError::decode(format!(
                "body length {} is not a multiple of 4",
                body.len()
            )));
        }

        let expected = self.dims.samples() * layout.count();
        let actual = body.len() / 4;
        if actual != expected {
            return Err(ForecastError::LengthMismatch {
                expected,
                actual,
                dims: format!("{}x{}", self.dims, layout.count()),
            });
        }

        let mut buf = body;
        let mut values = Vec::with_capacity(actual);
        while buf.has_remaining() {
            values.push(buf.get_f32_le());
        }

        debug!(
            dims = %self.dims,
            components = layout.count(),
            bytes = body.len(),
            "Decoded forecast field"
        );

        ForecastField::from_values(values, self.dims, layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_wind_only() {
        let dims = FieldDims::new(1, 1, 2);
        let body = encode(&[1.0, 2.0, 3.0, 4.0]);
        let field = FieldDecoder::new(dims).decode("u,v", &body).unwrap();

        assert_eq!(field.component_count(), 2);
        let s = field.sample(0, 0, 1).unwrap();
        assert_eq!((s.u, s.v, s.gust, s.wave), (3.0, 4.0, 0.0, 0.0));
    }

    #[test]
    fn test_decode_with_wave_before_gust() {
        let dims = FieldDims::new(1, 1, 1);
        let body = encode(&[1.0, 2.0, 7.5, 12.0]);
        let field = FieldDecoder::new(dims).decode("u,v,wave,gust", &body).unwrap();

        let s = field.sample(0, 0, 0).unwrap();
        assert_eq!(s.wave, 7.5);
        assert_eq!(s.gust, 12.0);
    }

    #[test]
    fn test_length_mismatch_is_fatal() {
        let dims = FieldDims::new(2, 2, 2);
        let body = encode(&vec![0.0; 15]);
        let err = FieldDecoder::new(dims).decode("u,v", &body).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::LengthMismatch {
                expected: 16,
                actual: 15,
                ..
            }
        ));
    }

    #[test]
    fn test_partial_float_is_fatal() {
        let dims = FieldDims::new(1, 1, 1);
        let mut body = encode(&[1.0, 2.0]);
        body.push(0);
        assert!(matches!(
            FieldDecoder::new(dims).decode("u,v", &body),
            Err(ForecastError::Decode(_))
        ));
    }

    #[test]
    fn test_header_wins_over_expected_count() {
        let dims = FieldDims::new(1, 1, 1);
        let body = encode(&[1.0, 2.0, 3.0]);
        let field = FieldDecoder::new(dims)
            .expect_components(4)
            .decode("u,v,gust", &body)
            .unwrap();
        assert_eq!(field.component_count(), 3);
        assert_eq!(field.sample(0, 0, 0).unwrap().gust, 3.0);
    }

    #[test]
    fn test_out_of_range_sample() {
        let dims = FieldDims::new(1, 2, 2);
        let field = FieldDecoder::new(dims).decode("u,v", &encode(&[0.0; 8])).unwrap();
        assert!(field.sample(1, 0, 0).is_none());
        assert!(field.sample(0, 2, 0).is_none());
        assert!(field.sample(0, 0, 2).is_none());
        assert!(field.sample(0, 1, 1).is_some());
    }
}
