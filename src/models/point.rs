//! Point type.

use serde::{Deserialize, Serialize};

/// A 2D request or anchor location.
///
/// Planar providers read `x`/`y` directly. The great-circle provider treats
/// `x` as longitude and `y` as latitude, in degrees. A point is identified by
/// its index in the slice handed to the pipeline.
///
/// # Examples
///
/// ```
/// use u_shuttle::models::Point;
///
/// let p = Point::new(3.0, 4.0);
/// assert_eq!(p.x(), 3.0);
/// assert!((p.planar_distance(&Point::new(0.0, 0.0)) - 5.0).abs() < 1e-10);
///
/// let seoul = Point::lat_lon(37.5665, 126.9780);
/// assert_eq!(seoul.lat(), 37.5665);
/// assert_eq!(seoul.lon(), 126.9780);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a planar point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates a geographic point from latitude and longitude in degrees.
    pub fn lat_lon(lat: f64, lon: f64) -> Self {
        Self { x: lon, y: lat }
    }

    /// X-coordinate (longitude for geographic points).
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y-coordinate (latitude for geographic points).
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.y
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.x
    }

    /// Returns `true` if both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point.
    pub fn planar_distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}
