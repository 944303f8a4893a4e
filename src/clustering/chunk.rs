//! Centre-distance chunk splitting.
//!
//! A cheap alternative to k-medoids for one-centre scenarios: requests are
//! ordered (optionally by distance to the centre) and cut into consecutive
//! capacity-sized groups, one per vehicle, up to a fleet limit.

use serde::{Deserialize, Serialize};

use super::CAPACITY_TOLERANCE;
use crate::distance::DistanceMatrix;
use crate::error::{Result, RoutingError};

/// Order in which requests are packed into vehicles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkOrder {
    /// Keep the caller's order.
    Input,
    /// Nearest-to-centre first (stable for ties).
    #[default]
    CenterDistance,
}

/// Vehicle groups produced by [`split_by_center_distance`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkSplit {
    /// Request indices per vehicle, in packing order.
    pub groups: Vec<Vec<usize>>,
    /// Requests that fit no vehicle: demand above capacity, or fleet exhausted.
    pub unassigned: Vec<usize>,
}

/// Packs `requests` into at most `max_vehicles` groups of at most `capacity`.
///
/// A group is closed when the next request would overflow it. Requests
/// whose own demand exceeds capacity are reported as unassigned, as are
/// all requests left once the fleet is used up.
///
/// # Examples
///
/// ```
/// use u_shuttle::clustering::{split_by_center_distance, ChunkOrder};
/// use u_shuttle::distance::DistanceMatrix;
/// use u_shuttle::models::Point;
///
/// let points = vec![
///     Point::new(0.0, 0.0), // centre
///     Point::new(3.0, 0.0),
///     Point::new(1.0, 0.0),
///     Point::new(2.0, 0.0),
/// ];
/// let dm = DistanceMatrix::from_points(&points);
/// let split = split_by_center_distance(
///     &dm, 0, &[1, 2, 3], &[0.0, 1.0, 1.0, 1.0], 2.0, 5, ChunkOrder::CenterDistance,
/// ).unwrap();
/// assert_eq!(split.groups, vec![vec![2, 3], vec![1]]);
/// assert!(split.unassigned.is_empty());
/// ```
pub fn split_by_center_distance(
    distances: &DistanceMatrix,
    center: usize,
    requests: &[usize],
    demands: &[f64],
    capacity: f64,
    max_vehicles: usize,
    order: ChunkOrder,
) -> Result<ChunkSplit> {
    distances.check_indices(&[center])?;
    distances.check_indices(requests)?;
    super::validate_demands(demands, distances.size())?;
    if !capacity.is_finite() || capacity <= 0.0 {
        return Err(RoutingError::invalid(format!(
            "capacity must be positive, got {capacity}"
        )));
    }

    let mut ordered = requests.to_vec();
    if order == ChunkOrder::CenterDistance {
        ordered.sort_by(|&a, &b| distances.get(center, a).total_cmp(&distances.get(center, b)));
    }

    let mut split = ChunkSplit::default();
    let mut current: Vec<usize> = Vec::new();
    let mut load = 0.0;

    for r in ordered {
        let demand = demands[r];
        if demand > capacity + CAPACITY_TOLERANCE {
            split.unassigned.push(r);
            continue;
        }
        if load + demand > capacity + CAPACITY_TOLERANCE && !current.is_empty() {
            split.groups.push(std::mem::take(&mut current));
            load = 0.0;
        }
        if split.groups.len() >= max_vehicles {
            split.unassigned.push(r);
            continue;
        }
        current.push(r);
        load += demand;
    }
    if !current.is_empty() {
        split.groups.push(current);
    }

    Ok(split)
}
