//! Nearest-neighbor tour construction.
//!
//! Builds a single tour greedily: starting from the depot, always visit the
//! nearest unvisited point. Ties go to the lowest point index.
//!
//! # Complexity
//!
//! O(n²) where n = number of points.
//!
//! # Reference
//!
//! This is the simplest constructive heuristic for the TSP. While tour
//! quality is typically 15-25% above optimal, it is a fast, deterministic
//! starting point for local search.

use crate::distance::DistanceMatrix;

/// Constructs a tour over `points` starting at `depot`.
///
/// The returned sequence starts with `depot` followed by every other entry
/// of `points` exactly once. The depot is skipped if it appears in `points`.
///
/// # Examples
///
/// ```
/// use u_shuttle::models::Point;
/// use u_shuttle::distance::DistanceMatrix;
/// use u_shuttle::constructive::nearest_neighbor_tour;
///
/// let points = vec![
///     Point::new(0.0, 0.0),
///     Point::new(3.0, 0.0),
///     Point::new(1.0, 0.0),
///     Point::new(2.0, 0.0),
/// ];
/// let dm = DistanceMatrix::from_points(&points);
///
/// assert_eq!(nearest_neighbor_tour(0, &[1, 2, 3], &dm), vec![0, 2, 3, 1]);
/// ```
pub fn nearest_neighbor_tour(depot: usize, points: &[usize], distances: &DistanceMatrix) -> Vec<usize> {
    let mut remaining: Vec<usize> = points.iter().copied().filter(|&p| p != depot).collect();
    remaining.sort_unstable();

    let mut tour = Vec::with_capacity(remaining.len() + 1);
    tour.push(depot);
    let mut current = depot;

    // `remaining` stays sorted, so the first nearest candidate is the lowest index.
    while let Some(next) = distances.nearest_neighbor(current, &remaining) {
        if let Some(pos) = remaining.iter().position(|&p| p == next) {
            remaining.remove(pos);
        }
        tour.push(next);
        current = next;
    }

    tour
}
