//! Forecast metadata: grid geometry, forecast steps and component layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bbox::BoundingBox;
use crate::error::{WindError, WindResult};
use crate::time::TimeIndexResolver;

/// A physical quantity carried by a forecast dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    /// Eastward wind (m/s)
    U,
    /// Northward wind (m/s)
    V,
    /// Wind gust (m/s)
    Gust,
    /// Significant wave height (m)
    Wave,
}

impl Component {
    /// Map a short name as used by forecast servers to a component.
    ///
    /// Accepts both bare names (`u`, `gust`, `wave`) and GRIB-style names
    /// (`10u`, `ugrd`, `gst`, `swh`, `htsgw`). Anything else is unknown.
    pub fn from_short_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "u" | "10u" | "u10" | "100u" | "ugrd" | "uwnd" | "ugrd10m" => Some(Component::U),
            "v" | "10v" | "v10" | "100v" | "vgrd" | "vwnd" | "vgrd10m" => Some(Component::V),
            "gust" | "gst" | "10fg" | "fg10" | "i10fg" => Some(Component::Gust),
            "wave" | "swh" | "htsgw" | "wh" => Some(Component::Wave),
            _ => None,
        }
    }
}

/// Slot assignment of the optional components inside one packed sample.
///
/// U and V always occupy slots 0 and 1; gust and wave follow in the order the
/// source listed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentLayout {
    gust: Option<usize>,
    wave: Option<usize>,
}

impl ComponentLayout {
    /// Layout of a dump carrying only U and V.
    pub const WIND_ONLY: ComponentLayout = ComponentLayout {
        gust: None,
        wave: None,
    };

    /// Build a layout from an ordered list of short names.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut layout = Self::WIND_ONLY;
        for name in names {
            match Component::from_short_name(name) {
                Some(Component::Gust) if layout.gust.is_none() => {
                    layout.gust = Some(layout.count());
                }
                Some(Component::Wave) if layout.wave.is_none() => {
                    layout.wave = Some(layout.count());
                }
                Some(_) => {}
                None => debug!(name = name, "Ignoring unrecognized component short name"),
            }
        }
        layout
    }

    /// Parse a component header such as `"u,v,gust"` or `"10u 10v swh"`.
    pub fn parse_header(header: &str) -> Self {
        Self::from_names(
            header
                .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                .filter(|s| !s.is_empty()),
        )
    }

    /// Number of floats per packed sample (2 to 4).
    pub fn count(&self) -> usize {
        2 + usize::from(self.gust.is_some()) + usize::from(self.wave.is_some())
    }

    pub fn gust_slot(&self) -> Option<usize> {
        self.gust
    }

    pub fn wave_slot(&self) -> Option<usize> {
        self.wave
    }
}

/// Regular lat/lon grid. Index (0, 0) is the bottom-left corner and both
/// steps are positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub lat0: f64,
    pub lon0: f64,
    pub lat_step: f64,
    pub lon_step: f64,
    pub lat_count: usize,
    pub lon_count: usize,
}

impl GridGeometry {
    /// Latitude of row `i`.
    pub fn lat_at(&self, i: usize) -> f64 {
        self.lat0 + i as f64 * self.lat_step
    }

    /// Longitude of column `j`, as stored by the source (not normalized).
    pub fn lon_at(&self, j: usize) -> f64 {
        self.lon0 + j as f64 * self.lon_step
    }

    /// Geographic extent covered by the grid points.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            self.lon0,
            self.lat0,
            self.lon_at(self.lon_count.saturating_sub(1)),
            self.lat_at(self.lat_count.saturating_sub(1)),
        )
    }
}

/// Description of one forecast dataset as reported by the metadata endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMeta {
    /// Resolved file name on the server (the dataset identity).
    pub source: String,
    /// Model run start.
    pub run_start: DateTime<Utc>,
    pub grid: GridGeometry,
    /// Forecast offsets in hours from `run_start`, strictly increasing.
    pub steps_hours: Vec<f64>,
    /// Component short names in server order.
    pub components: Vec<String>,
    /// Component count as reported by the server.
    pub component_count: usize,
    pub file_size: u64,
    pub file_time: Option<DateTime<Utc>>,
    pub info: Option<String>,
}

impl ForecastMeta {
    /// Check the structural invariants of the metadata.
    pub fn validate(&self) -> WindResult<()> {
        if self.grid.lat_count == 0 || self.grid.lon_count == 0 {
            return Err(WindError::invalid_meta(format!(
                "empty grid {}x{}",
                self.grid.lat_count, self.grid.lon_count
            )));
        }

        if !(self.grid.lat_step > 0.0 && self.grid.lon_step > 0.0) {
            return Err(WindError::invalid_meta(format!(
                "grid steps must be positive (lat {}, lon {})",
                self.grid.lat_step, self.grid.lon_step
            )));
        }

        if self.steps_hours.is_empty() {
            return Err(WindError::invalid_meta("no forecast steps"));
        }

        if let Some(pair) = self.steps_hours.windows(2).find(|w| w[1] <= w[0]) {
            return Err(WindError::invalid_meta(format!(
                "forecast steps not strictly increasing at {} -> {}",
                pair[0], pair[1]
            )));
        }

        let recognized = self.recognized_components();
        if !recognized.contains(&Component::U) || !recognized.contains(&Component::V) {
            return Err(WindError::invalid_meta(format!(
                "wind components missing from {:?}",
                self.components
            )));
        }
        if !(2..=4).contains(&recognized.len()) {
            return Err(WindError::invalid_meta(format!(
                "expected 2 to 4 components, found {}",
                recognized.len()
            )));
        }

        Ok(())
    }

    /// Distinct recognized components, in server order.
    pub fn recognized_components(&self) -> Vec<Component> {
        let mut found = Vec::with_capacity(4);
        for component in self.components.iter().filter_map(|n| Component::from_short_name(n)) {
            if !found.contains(&component) {
                found.push(component);
            }
        }
        found
    }

    /// Layout implied by the metadata component list.
    pub fn layout(&self) -> ComponentLayout {
        ComponentLayout::from_names(self.components.iter().map(String::as_str))
    }

    pub fn step_count(&self) -> usize {
        self.steps_hours.len()
    }

    /// Resolver mapping absolute times onto this forecast's steps.
    pub fn time_resolver(&self) -> TimeIndexResolver<'_> {
        TimeIndexResolver::new(self.run_start, &self.steps_hours)
    }
}
