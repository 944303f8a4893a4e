//! Route construction and improvement for one cluster.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{Improvement, RouteConfig};
use crate::constructive::nearest_neighbor_tour;
use crate::distance::DistanceMatrix;
use crate::error::{Result, RoutingError};
use crate::local_search::{tabu_improve, tour_length, two_opt_improve};
use crate::models::{ImprovementStats, Route, TourEnd};

/// Builds the route for vehicle 0. See [`build_vehicle_route`].
///
/// # Examples
///
/// ```
/// use u_shuttle::distance::DistanceMatrix;
/// use u_shuttle::models::Point;
/// use u_shuttle::routing::{build_route, RouteConfig};
///
/// let points = vec![
///     Point::new(0.0, 0.0),
///     Point::new(2.0, 0.0),
///     Point::new(1.0, 0.0),
///     Point::new(3.0, 0.0),
/// ];
/// let dm = DistanceMatrix::from_points(&points);
///
/// let route = build_route(&[1, 2, 3], &dm, 0, &RouteConfig::default()).unwrap();
/// assert_eq!(route.stops(), &[0, 2, 1, 3]);
/// assert!((route.length() - 6.0).abs() < 1e-10);
/// ```
pub fn build_route(
    cluster_points: &[usize],
    distances: &DistanceMatrix,
    depot: usize,
    config: &RouteConfig,
) -> Result<Route> {
    build_vehicle_route(0, cluster_points, distances, depot, None, config)
}

/// Sequences `cluster_points` starting at `depot`.
///
/// The returned stops start at the depot and contain every cluster point
/// exactly once; a depot listed among the cluster points is not repeated.
/// An empty cluster yields an empty route.
///
/// With a `destination`, the route ends there whatever
/// [`RouteConfig::closed`] says, and the stop order is optimized for the path
/// depot → stops → destination. A destination equal to the depot makes a
/// round trip.
///
/// # Errors
///
/// - [`RoutingError::DimensionMismatch`] if any index is outside the matrix
/// - [`RoutingError::InvalidInput`] if a cluster point is listed twice, or
///   the destination is also a cluster point other than the depot
///
/// # Examples
///
/// ```
/// use u_shuttle::distance::DistanceMatrix;
/// use u_shuttle::models::{Point, TourEnd};
/// use u_shuttle::routing::{build_vehicle_route, RouteConfig};
///
/// let dm = DistanceMatrix::from_points(&[
///     Point::new(0.0, 0.0),
///     Point::new(1.0, 0.0),
///     Point::new(-1.0, 0.0),
///     Point::new(10.0, 0.0),
/// ]);
///
/// let route = build_vehicle_route(0, &[0, 1, 2], &dm, 0, Some(3), &RouteConfig::default()).unwrap();
/// assert_eq!(route.stops(), &[0, 2, 1]);
/// assert_eq!(route.end(), TourEnd::At(3));
/// assert!((route.length() - 12.0).abs() < 1e-10);
/// ```
pub fn build_vehicle_route(
    vehicle_id: usize,
    cluster_points: &[usize],
    distances: &DistanceMatrix,
    depot: usize,
    destination: Option<usize>,
    config: &RouteConfig,
) -> Result<Route> {
    distances.check_indices(&[depot])?;
    distances.check_indices(cluster_points)?;
    if let Some(dest) = destination {
        distances.check_indices(&[dest])?;
    }

    let mut seen = HashSet::with_capacity(cluster_points.len());
    if let Some(&dup) = cluster_points.iter().find(|&&p| !seen.insert(p)) {
        return Err(RoutingError::invalid(format!(
            "point {dup} appears twice in cluster"
        )));
    }

    let end = match destination {
        Some(dest) if dest == depot => TourEnd::Depot,
        Some(dest) if seen.contains(&dest) => {
            return Err(RoutingError::invalid(format!(
                "destination {dest} is also a cluster point"
            )));
        }
        Some(dest) => TourEnd::At(dest),
        None => TourEnd::closed(config.closed),
    };

    if cluster_points.is_empty() {
        return Ok(Route::empty(vehicle_id));
    }

    let depot_is_request = seen.contains(&depot);
    let tour = nearest_neighbor_tour(depot, cluster_points, distances);
    let construction_length = tour_length(&tour, distances, end);

    let (stops, length, stats) = match config.improvement {
        Improvement::None => (tour, construction_length, None),
        Improvement::TwoOpt => {
            let out = two_opt_improve(&tour, distances, end, config.max_passes);
            let stats = ImprovementStats {
                construction_length,
                passes: out.passes,
                converged: out.converged,
            };
            (out.tour, out.length, Some(stats))
        }
        Improvement::Tabu { iterations, tenure } => {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(vehicle_id as u64));
            let out = tabu_improve(&tour, distances, end, iterations, tenure, &mut rng);
            let stats = ImprovementStats {
                construction_length,
                passes: out.iterations,
                converged: out.converged,
            };
            (out.tour, out.length, Some(stats))
        }
    };

    let mut route = Route::new(vehicle_id, stops, false, length)
        .with_end(end)
        .with_depot_request(depot_is_request);
    if let Some(stats) = stats {
        route = route.with_improvement(stats);
    }
    Ok(route)
}
