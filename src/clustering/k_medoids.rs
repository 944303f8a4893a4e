//! Alternating k-medoids search.
//!
//! # Algorithm
//!
//! 1. Seed k medoids by sampling point indices without replacement.
//! 2. Assign every point to its nearest medoid (ties: lowest cluster id).
//! 3. Replace each medoid by the member minimizing the summed distance to
//!    the other members, exactly, over all members.
//! 4. Repeat 2-3 until no medoid moves or `max_iter` rounds have run.
//!
//! Capacity is ignored here; see [`repair_capacity`](super::repair_capacity).
//!
//! # Complexity
//!
//! O(n·k) per assignment, O(Σ m_c²) per update where m_c is cluster size.
//!
//! # Reference
//!
//! Park, H.-S. & Jun, C.-H. (2009). "A simple and fast algorithm for
//! K-medoids clustering", *Expert Systems with Applications* 36(2), 3336-3341.

use rand::seq::index;
use rand::Rng;

use crate::distance::DistanceMatrix;

/// Outcome of the unconstrained medoid search.
#[derive(Debug, Clone, PartialEq)]
pub struct MedoidSearch {
    /// Medoid point index per cluster id.
    pub medoids: Vec<usize>,
    /// Cluster id per point index.
    pub assignment: Vec<usize>,
    /// Update rounds performed.
    pub iterations: usize,
    /// `true` if medoids settled before the cap.
    pub converged: bool,
}

/// Runs k-medoids on a precomputed matrix.
///
/// Requires `1 <= k <= distances.size()`. Initial medoids are sorted
/// ascending so that cluster ids follow medoid order.
pub fn k_medoids<R: Rng>(
    distances: &DistanceMatrix,
    k: usize,
    max_iter: usize,
    rng: &mut R,
) -> MedoidSearch {
    let n = distances.size();
    let mut medoids = index::sample(rng, n, k).into_vec();
    medoids.sort_unstable();

    let mut assignment = assign_nearest(distances, &medoids);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iter {
        iterations += 1;
        let updated = update_medoids(distances, &medoids, &assignment);
        if updated == medoids {
            converged = true;
            break;
        }
        medoids = updated;
        assignment = assign_nearest(distances, &medoids);
    }

    MedoidSearch {
        medoids,
        assignment,
        iterations,
        converged,
    }
}

/// Assigns every point to its nearest medoid, ignoring capacity.
///
/// Medoids always own themselves, even when another medoid sits at the
/// same location.
pub fn assign_nearest(distances: &DistanceMatrix, medoids: &[usize]) -> Vec<usize> {
    let mut assignment: Vec<usize> = (0..distances.size())
        .map(|p| nearest_cluster(distances, medoids, p))
        .collect();
    for (c, &m) in medoids.iter().enumerate() {
        assignment[m] = c;
    }
    assignment
}

/// Cluster id whose medoid is nearest to `point`; ties go to the lowest id.
fn nearest_cluster(distances: &DistanceMatrix, medoids: &[usize], point: usize) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (c, &m) in medoids.iter().enumerate() {
        let d = distances.get(point, m);
        if d < best_d {
            best = c;
            best_d = d;
        }
    }
    best
}

/// Picks the cost-minimizing member of each cluster as its new medoid.
///
/// The current medoid is only replaced by a strictly cheaper member, which
/// keeps the loop from cycling between equal-cost candidates.
fn update_medoids(distances: &DistanceMatrix, medoids: &[usize], assignment: &[usize]) -> Vec<usize> {
    let mut members = vec![Vec::new(); medoids.len()];
    for (p, &c) in assignment.iter().enumerate() {
        members[c].push(p);
    }

    medoids
        .iter()
        .zip(&members)
        .map(|(&current, group)| {
            let cost = |candidate: usize| -> f64 {
                group.iter().map(|&o| distances.get(candidate, o)).sum()
            };
            let mut best = current;
            let mut best_cost = cost(current);
            for &candidate in group {
                if candidate == current {
                    continue;
                }
                let c = cost(candidate);
                if c < best_cost {
                    best = candidate;
                    best_cost = c;
                }
            }
            best
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_blobs() -> DistanceMatrix {
        DistanceMatrix::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(0.5, 0.0),
            Point::new(0.0, 0.5),
            Point::new(10.0, 10.0),
            Point::new(10.5, 10.0),
            Point::new(10.0, 10.5),
        ])
    }

    #[test]
    fn test_separates_blobs() {
        let dm = two_blobs();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let search = k_medoids(&dm, 2, 20, &mut rng);
            assert!(search.converged);
            let a = &search.assignment;
            assert_eq!(a[0], a[1]);
            assert_eq!(a[0], a[2]);
            assert_eq!(a[3], a[4]);
            assert_eq!(a[3], a[5]);
            assert_ne!(a[0], a[3]);
        }
    }

    #[test]
    fn test_medoid_is_central_member() {
        let dm = DistanceMatrix::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let search = k_medoids(&dm, 1, 10, &mut rng);
        assert_eq!(search.medoids, vec![1]);
        assert_eq!(search.assignment, vec![0, 0, 0]);
    }

    #[test]
    fn test_zero_iterations_keeps_seed() {
        let dm = two_blobs();
        let mut rng = StdRng::seed_from_u64(3);
        let search = k_medoids(&dm, 2, 0, &mut rng);
        assert_eq!(search.iterations, 0);
        assert!(!search.converged);
        assert_eq!(search.assignment.len(), 6);
    }

    #[test]
    fn test_assign_nearest_ties_lowest_cluster() {
        // Point 1 is equidistant from medoids 0 and 2.
        let dm = DistanceMatrix::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
        ]);
        assert_eq!(assign_nearest(&dm, &[0, 2]), vec![0, 0, 1]);
        assert_eq!(assign_nearest(&dm, &[2, 0]), vec![1, 0, 0]);
    }

    #[test]
    fn test_coincident_medoids_own_themselves() {
        let dm = DistanceMatrix::from_points(&[Point::new(1.0, 1.0), Point::new(1.0, 1.0)]);
        assert_eq!(assign_nearest(&dm, &[0, 1]), vec![0, 1]);
    }
}
