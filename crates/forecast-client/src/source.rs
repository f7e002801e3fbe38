//! The forecast server seam and its wire formats.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;
use wind_common::{ForecastMeta, GridGeometry, Selector};

use crate::error::{ForecastError, Result};

/// Body and component header of a dump response.
#[derive(Debug, Clone)]
pub struct DumpResponse {
    /// Value of the components header, if the server sent one.
    pub components: Option<String>,
    /// Raw little-endian f32 buffer.
    pub body: Bytes,
}

/// Access to forecast metadata and binary dumps.
///
/// Implemented over HTTP by [`crate::HttpForecastSource`]; tests inject fakes.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch and parse the metadata of the selected dataset.
    async fn fetch_meta(&self, selector: &Selector) -> Result<ForecastMeta>;

    /// Fetch the binary dump of the selected dataset.
    async fn fetch_dump(&self, selector: &Selector, reduced_components: bool) -> Result<DumpResponse>;
}

/// Metadata response as serialized by the forecast server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaResponse {
    pub epoch_start: Option<i64>,
    pub top_lat: Option<f64>,
    pub bottom_lat: Option<f64>,
    pub left_lon: Option<f64>,
    pub right_lon: Option<f64>,
    pub lat_step: Option<f64>,
    pub lon_step: Option<f64>,
    pub n_lat: Option<usize>,
    pub n_lon: Option<usize>,
    pub time_stamps: Option<Vec<f64>>,
    pub short_names: Option<Vec<String>>,
    pub nb_short_names: Option<usize>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub file_time: Option<i64>,
    pub info: Option<String>,
    #[serde(rename = "_Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| ForecastError::protocol(format!("metadata missing '{field}'")))
}

impl MetaResponse {
    /// Convert the wire form into [`ForecastMeta`].
    ///
    /// Grid origin is the (bottom, left) corner. Invariants are checked
    /// separately by [`ForecastMeta::validate`].
    pub fn into_meta(self) -> Result<ForecastMeta> {
        if let Some(error) = self.error.filter(|e| !e.trim().is_empty()) {
            return Err(ForecastError::Server(error));
        }

        let epoch = required(self.epoch_start, "epochStart")?;
        let run_start = DateTime::from_timestamp(epoch, 0)
            .ok_or_else(|| ForecastError::protocol(format!("bad epochStart {epoch}")))?;

        let bottom_lat = required(self.bottom_lat, "bottomLat")?;
        let left_lon = required(self.left_lon, "leftLon")?;
        let lat_step = required(self.lat_step, "latStep")?.abs();
        let lon_step = required(self.lon_step, "lonStep")?.abs();
        let lat_count = required(self.n_lat, "nLat")?;
        let lon_count = required(self.n_lon, "nLon")?;
        let steps_hours = required(self.time_stamps, "timeStamps")?;
        let components = required(self.short_names, "shortNames")?;
        let source = required(self.file_name, "fileName")?;

        let component_count = match self.nb_short_names {
            Some(count) => count,
            None => {
                warn!(
                    file = %source,
                    "Metadata has no component count, using short name list"
                );
                components.len()
            }
        };

        Ok(ForecastMeta {
            source,
            run_start,
            grid: GridGeometry {
                lat0: bottom_lat,
                lon0: left_lon,
                lat_step,
                lon_step,
                lat_count,
                lon_count,
            },
            steps_hours,
            components,
            component_count,
            file_size: self.file_size.unwrap_or(0),
            file_time: self.file_time.and_then(|t| DateTime::from_timestamp(t, 0)),
            info: self.info,
        })
    }
}

impl From<&ForecastMeta> for MetaResponse {
    fn from(meta: &ForecastMeta) -> Self {
        let bounds = meta.grid.bounds();
        Self {
            epoch_start: Some(meta.run_start.timestamp()),
            top_lat: Some(bounds.max_lat),
            bottom_lat: Some(bounds.min_lat),
            left_lon: Some(bounds.min_lon),
            right_lon: Some(bounds.max_lon),
            lat_step: Some(meta.grid.lat_step),
            lon_step: Some(meta.grid.lon_step),
            n_lat: Some(meta.grid.lat_count),
            n_lon: Some(meta.grid.lon_count),
            time_stamps: Some(meta.steps_hours.clone()),
            short_names: Some(meta.components.clone()),
            nb_short_names: Some(meta.component_count),
            file_name: Some(meta.source.clone()),
            file_size: Some(meta.file_size),
            file_time: meta.file_time.map(|t| t.timestamp()),
            info: meta.info.clone(),
            error: None,
        }
    }
}

/// Parse a metadata response body.
pub fn parse_meta(body: &[u8]) -> Result<ForecastMeta> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ForecastError::protocol("empty metadata response"));
    }

    let response: MetaResponse = serde_json::from_slice(body)?;
    response.into_meta()
}
