//! Map viewport: geographic bounds, zoom, and lat/lon to pixel projection.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use wind_common::BoundingBox;

/// Pixels per tile edge at zoom 0.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator square.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// A point in screen pixels, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, `None` for a zero vector.
    pub fn normalized(&self) -> Option<Self> {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            Some(Self::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    /// Rotated a quarter turn clockwise on screen.
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.y, self.x)
    }
}

impl Add for ScreenPoint {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for ScreenPoint {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for ScreenPoint {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// What the renderer needs to know about the host map.
pub trait MapView {
    /// Geographic bounds currently visible.
    fn bounds(&self) -> BoundingBox;

    /// Current zoom level.
    fn zoom(&self) -> f64;

    /// Project a geographic point to screen pixels.
    fn project(&self, lat: f64, lon: f64) -> ScreenPoint;
}

/// A Web Mercator (EPSG:3857) view centered on a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WebMercatorView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    pub width: u32,
    pub height: u32,
}

impl WebMercatorView {
    pub fn new(center_lat: f64, center_lon: f64, zoom: f64, width: u32, height: u32) -> Self {
        Self {
            center_lat,
            center_lon,
            zoom,
            width,
            height,
        }
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    /// Position in world pixels (origin at 180W, MAX_MERCATOR_LAT).
    fn to_world(&self, lat: f64, lon: f64) -> (f64, f64) {
        let size = self.world_size();
        let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
        let x = (lon + 180.0) / 360.0 * size;
        let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * size;
        (x, y)
    }

    fn from_world(&self, x: f64, y: f64) -> (f64, f64) {
        let size = self.world_size();
        let lon = x / size * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y / size)).sinh().atan().to_degrees();
        (lat, lon)
    }

    fn origin(&self) -> (f64, f64) {
        let (cx, cy) = self.to_world(self.center_lat, self.center_lon);
        (cx - self.width as f64 / 2.0, cy - self.height as f64 / 2.0)
    }

    /// Inverse of [`MapView::project`].
    pub fn unproject(&self, point: ScreenPoint) -> (f64, f64) {
        let (ox, oy) = self.origin();
        self.from_world(ox + point.x as f64, oy + point.y as f64)
    }
}

impl MapView for WebMercatorView {
    fn bounds(&self) -> BoundingBox {
        let (max_lat, min_lon) = self.unproject(ScreenPoint::new(0.0, 0.0));
        let (min_lat, max_lon) = self.unproject(ScreenPoint::new(self.width as f32, self.height as f32));
        BoundingBox::new(
            min_lon.max(-180.0),
            min_lat.max(-MAX_MERCATOR_LAT),
            max_lon.min(180.0),
            max_lat.min(MAX_MERCATOR_LAT),
        )
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn project(&self, lat: f64, lon: f64) -> ScreenPoint {
        let (x, y) = self.to_world(lat, lon);
        let (ox, oy) = self.origin();
        ScreenPoint::new((x - ox) as f32, (y - oy) as f32)
    }
}
