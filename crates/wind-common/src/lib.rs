//! Common types and utilities shared across the wind playback crates.

pub mod bbox;
pub mod error;
pub mod meta;
pub mod route;
pub mod selector;
pub mod time;

pub use bbox::{normalize_lon, BoundingBox};
pub use error::{WindError, WindResult};
pub use meta::{Component, ComponentLayout, ForecastMeta, GridGeometry};
pub use route::{RoutePoint, RouteResponse, RouteState, RouteTimeSnapshot, TrackPoint};
pub use selector::{CacheKey, Selector};
pub use time::{hours_since, TimeIndexResolver};
