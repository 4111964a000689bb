//! Geographic and pixel-space value types.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Longitude/latitude pair in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    #[inline]
    pub fn to_point(self) -> Point2<f64> {
        Point2::new(self.lon, self.lat)
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self::new(lon, lat)
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self::new(lon, lat)
    }
}

/// Image-space position, `y` growing downward.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn to_point(self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    #[inline]
    pub fn distance_squared(&self, other: &PixelPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl From<Point2<f64>> for PixelPoint {
    fn from(p: Point2<f64>) -> Self {
        Self::new(p.x, p.y)
    }
}

/// Integer pixel rectangle `[left, right) x [top, bottom)`.
///
/// Right and bottom are exclusive, matching the usual image crop convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl PixelBoundingBox {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn from_array([left, top, right, bottom]: [i32; 4]) -> Self {
        Self::new(left, top, right, bottom)
    }

    pub const fn to_array(&self) -> [i32; 4] {
        [self.left, self.top, self.right, self.bottom]
    }

    /// Horizontal span; widened so that any pair of `i32` edges fits.
    #[inline]
    pub fn width(&self) -> i64 {
        self.right as i64 - self.left as i64
    }

    #[inline]
    pub fn height(&self) -> i64 {
        self.bottom as i64 - self.top as i64
    }

    /// A box is valid when it encloses at least one pixel.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.right > self.left && self.bottom > self.top
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Overlap with a `width x height` image as `(x0, y0, x1, y1)` in
    /// `usize`, or `None` when nothing of the box lies inside the image.
    pub fn clamp_to_image(
        &self,
        width: usize,
        height: usize,
    ) -> Option<(usize, usize, usize, usize)> {
        let w = i64::try_from(width).ok()?;
        let h = i64::try_from(height).ok()?;
        let x0 = (self.left as i64).clamp(0, w);
        let y0 = (self.top as i64).clamp(0, h);
        let x1 = (self.right as i64).clamp(0, w);
        let y1 = (self.bottom as i64).clamp(0, h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    /// Tight box around integer pixel positions, `None` for an empty slice.
    pub fn enclosing(points: &[PixelPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut min_x = first.x;
        let mut min_y = first.y;
        let mut max_x = first.x;
        let mut max_y = first.y;
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(
            min_x.floor() as i32,
            min_y.floor() as i32,
            max_x.floor() as i32 + 1,
            max_y.floor() as i32 + 1,
        ))
    }
}

/// Extent of a set of geographic points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl GeoBoundingBox {
    pub const fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        }
    }

    pub const fn from_array([lon_min, lat_min, lon_max, lat_max]: [f64; 4]) -> Self {
        Self::new(lon_min, lat_min, lon_max, lat_max)
    }

    pub const fn to_array(&self) -> [f64; 4] {
        [self.lon_min, self.lat_min, self.lon_max, self.lat_max]
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn enclosing(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bb = Self::new(first.lon, first.lat, first.lon, first.lat);
        for p in &points[1..] {
            bb.lon_min = bb.lon_min.min(p.lon);
            bb.lat_min = bb.lat_min.min(p.lat);
            bb.lon_max = bb.lon_max.max(p.lon);
            bb.lat_max = bb.lat_max.max(p.lat);
        }
        Some(bb)
    }
}
