//! Computed routes and the time snapshot published during playback.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{WindError, WindResult};

/// Longest accepted spacing between route points (31 days).
pub const MAX_STEP_DURATION_SECS: i64 = 31 * 24 * 3600;

/// `start + index * step_secs`, or `None` past chrono's range.
fn time_at(start: DateTime<Utc>, step_secs: i64, index: usize) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(index).ok()?.checked_mul(step_secs)?;
    start.checked_add_signed(TimeDelta::try_seconds(secs)?)
}

/// One point of a computed track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
    pub time: DateTime<Utc>,
}

/// Track point as sent by the routing service: `[lat, lon, epoch_seconds]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint(pub f64, pub f64, pub i64);

/// Raw response of a route computation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    #[serde(default)]
    pub track: Option<Vec<TrackPoint>>,
    /// Route start, epoch seconds.
    #[serde(default)]
    pub start_epoch: Option<i64>,
    /// Seconds between consecutive track points.
    #[serde(default)]
    pub step_duration: Option<i64>,
    /// Forecast file the route was computed against.
    #[serde(default)]
    pub grib_file: Option<String>,
}

/// A route attached to the playback controller.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteState {
    start: DateTime<Utc>,
    step_duration_secs: i64,
    points: Vec<RoutePoint>,
    forecast_file: Option<String>,
}

impl RouteState {
    pub fn new(
        start: DateTime<Utc>,
        step_duration_secs: i64,
        points: Vec<RoutePoint>,
    ) -> WindResult<Self> {
        if points.is_empty() {
            return Err(WindError::invalid_route("route has no points"));
        }
        if !(1..=MAX_STEP_DURATION_SECS).contains(&step_duration_secs) {
            return Err(WindError::invalid_route(format!(
                "step duration must be within 1..={MAX_STEP_DURATION_SECS}s, got {step_duration_secs}s"
            )));
        }
        if time_at(start, step_duration_secs, points.len() - 1).is_none() {
            return Err(WindError::invalid_route(format!(
                "{} steps of {step_duration_secs}s from {start} leave the supported time range",
                points.len()
            )));
        }

        Ok(Self {
            start,
            step_duration_secs,
            points,
            forecast_file: None,
        })
    }

    /// Build a route from a routing service response.
    ///
    /// The track is mandatory. A missing start falls back to the first point's
    /// time and a missing step duration to the spacing of the first two points;
    /// both cases are logged.
    pub fn from_response(response: RouteResponse) -> WindResult<Self> {
        let track = match response.track {
            Some(track) if !track.is_empty() => track,
            _ => return Err(WindError::invalid_route("response carries no track")),
        };

        let points = track
            .iter()
            .map(|&TrackPoint(lat, lon, epoch)| {
                DateTime::from_timestamp(epoch, 0)
                    .map(|time| RoutePoint { lat, lon, time })
                    .ok_or_else(|| WindError::invalid_route(format!("bad epoch {epoch}")))
            })
            .collect::<WindResult<Vec<_>>>()?;

        let start = match response.start_epoch {
            Some(epoch) => DateTime::from_timestamp(epoch, 0)
                .ok_or_else(|| WindError::invalid_route(format!("bad start epoch {epoch}")))?,
            None => {
                warn!("Route response has no start epoch, using first track point");
                points[0].time
            }
        };

        let step_duration_secs = match response.step_duration {
            Some(secs) => secs,
            None => {
                let derived = match points.as_slice() {
                    [a, b, ..] => (b.time - a.time).num_seconds(),
                    _ => 0,
                };
                warn!(
                    derived_secs = derived,
                    "Route response has no step duration, deriving from track"
                );
                // A single-point track has nothing to step through.
                derived.max(1)
            }
        };

        let mut route = Self::new(start, step_duration_secs, points)?;
        route.forecast_file = response.grib_file;
        Ok(route)
    }

    /// Parse a routing service JSON body.
    pub fn from_json(body: &str) -> WindResult<Self> {
        Self::from_response(serde_json::from_str(body)?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn step_duration_secs(&self) -> i64 {
        self.step_duration_secs
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&RoutePoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: a route holds at least one point.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.points.len() - 1
    }

    /// Forecast file the routing service used, when it reported one.
    pub fn forecast_file(&self) -> Option<&str> {
        self.forecast_file.as_deref()
    }

    /// Snapshot for a playback position.
    pub fn snapshot(&self, index: usize) -> RouteTimeSnapshot {
        RouteTimeSnapshot {
            route_start: self.start,
            step_duration_secs: self.step_duration_secs,
            index,
        }
    }
}

/// Route time state published by playback and consumed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTimeSnapshot {
    pub route_start: DateTime<Utc>,
    pub step_duration_secs: i64,
    pub index: usize,
}

impl RouteTimeSnapshot {
    /// Absolute time at the snapshot's index.
    ///
    /// Saturates at the latest representable time; snapshots taken from a
    /// [`RouteState`] never reach it.
    pub fn epoch(&self) -> DateTime<Utc> {
        time_at(self.route_start, self.step_duration_secs, self.index)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
