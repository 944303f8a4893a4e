//! Distance providers: planar and great-circle.

use serde::{Deserialize, Serialize};

use super::DistanceMatrix;
use crate::error::{Result, RoutingError};
use crate::models::Point;

/// Mean earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Computes pairwise distances between points.
///
/// Implementations must be symmetric and return zero for identical points.
/// [`build`](DistanceProvider::build) validates coordinates and fills a
/// [`DistanceMatrix`].
pub trait DistanceProvider: Send + Sync {
    /// Distance between two points.
    fn distance(&self, a: &Point, b: &Point) -> f64;

    /// Builds the N×N matrix for `points`.
    ///
    /// Fails with [`RoutingError::InvalidInput`] on non-finite coordinates.
    fn build(&self, points: &[Point]) -> Result<DistanceMatrix> {
        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            return Err(RoutingError::invalid(format!(
                "point {i} has non-finite coordinates"
            )));
        }
        Ok(DistanceMatrix::from_fn(points.len(), |i, j| {
            self.distance(&points[i], &points[j])
        }))
    }
}

/// Straight-line distance in coordinate units.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl DistanceProvider for Euclidean {
    fn distance(&self, a: &Point, b: &Point) -> f64 {
        a.planar_distance(b)
    }
}

/// Great-circle distance in kilometres; points are read as latitude/longitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceProvider for Haversine {
    fn distance(&self, a: &Point, b: &Point) -> f64 {
        let (lat1, lat2) = (a.lat().to_radians(), b.lat().to_radians());
        let dlat = lat2 - lat1;
        let dlon = (b.lon() - a.lon()).to_radians();
        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
    }
}

/// Configuration-level choice of distance provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Planar Euclidean distance.
    #[default]
    Planar,
    /// Haversine great-circle distance (km).
    GreatCircle,
}

impl DistanceProvider for Metric {
    fn distance(&self, a: &Point, b: &Point) -> f64 {
        match self {
            Self::Planar => Euclidean.distance(a, b),
            Self::GreatCircle => Haversine.distance(a, b),
        }
    }
}

/// Builds a planar distance matrix, validating coordinates.
///
/// # Examples
///
/// ```
/// use u_shuttle::distance::build_distance_matrix;
/// use u_shuttle::models::Point;
///
/// let dm = build_distance_matrix(&[Point::new(0.0, 0.0), Point::new(0.0, 2.0)]).unwrap();
/// assert_eq!(dm.get(1, 0), 2.0);
/// assert!(build_distance_matrix(&[]).unwrap().is_empty());
/// ```
pub fn build_distance_matrix(points: &[Point]) -> Result<DistanceMatrix> {
    Euclidean.build(points)
}
