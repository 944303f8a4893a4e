//! Capacity-aware correction of a cluster assignment.
//!
//! # Algorithm
//!
//! Clusters are scanned once in ascending medoid index. Inside an
//! over-capacity cluster, non-medoid members are taken farthest-from-medoid
//! first (ties: lowest point index) and each is moved to the cluster with
//! room for its demand whose medoid is nearest to the point. Moving stops as
//! soon as the cluster fits. Members that cannot move anywhere are handled by
//! the configured [`ResidualPolicy`].

use serde::{Deserialize, Serialize};

use super::k_medoids::assign_nearest;
use super::{cluster_loads, validate_demands, CAPACITY_TOLERANCE};
use crate::distance::{build_distance_matrix, DistanceMatrix};
use crate::error::{Result, RoutingError};
use crate::models::{ClusterOutcome, Point};

/// What to do with points that fit no cluster after repair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidualPolicy {
    /// Leave the point in its over-capacity cluster and report it.
    #[default]
    KeepInPlace,
    /// Move the point to the cluster whose resulting overload is smallest,
    /// when that beats the overload of staying.
    LeastOverloaded,
    /// Open a new cluster with the point as its medoid. Later residual
    /// points join opened clusters while they have room.
    OpenCluster,
}

/// Assignment after capacity repair.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityRepair {
    /// Medoids; longer than the input under [`ResidualPolicy::OpenCluster`].
    pub medoids: Vec<usize>,
    /// Cluster id per point.
    pub assignment: Vec<usize>,
    /// Summed demand per cluster.
    pub loads: Vec<f64>,
    /// Clusters still over capacity.
    pub outcome: ClusterOutcome,
}

/// Repairs `assignment` so that cluster loads fit `capacity` where possible.
///
/// `medoids[c]` must belong to cluster `c` in `assignment`. Medoids are never
/// moved. The result is fully deterministic.
pub fn repair_capacity(
    distances: &DistanceMatrix,
    demands: &[f64],
    medoids: &[usize],
    assignment: &[usize],
    capacity: f64,
    policy: ResidualPolicy,
) -> CapacityRepair {
    let mut medoids = medoids.to_vec();
    let mut assignment = assignment.to_vec();
    let mut loads = cluster_loads(&assignment, demands, medoids.len());
    let fits = |load: f64| load <= capacity + CAPACITY_TOLERANCE;

    let mut order: Vec<usize> = (0..medoids.len()).collect();
    order.sort_by_key(|&c| medoids[c]);

    for c in order {
        if fits(loads[c]) {
            continue;
        }
        let medoid = medoids[c];
        let mut candidates: Vec<usize> = (0..assignment.len())
            .filter(|&p| assignment[p] == c && p != medoid)
            .collect();
        candidates.sort_by(|&a, &b| {
            distances
                .get(b, medoid)
                .total_cmp(&distances.get(a, medoid))
                .then(a.cmp(&b))
        });

        let mut stuck = Vec::new();
        for p in candidates {
            if fits(loads[c]) {
                break;
            }
            match nearest_with_room(distances, &medoids, &loads, c, p, demands[p], capacity) {
                Some(dest) => move_point(&mut assignment, &mut loads, demands, p, c, dest),
                None => stuck.push(p),
            }
        }

        for p in stuck {
            if fits(loads[c]) {
                break;
            }
            match policy {
                ResidualPolicy::KeepInPlace => {}
                ResidualPolicy::LeastOverloaded => {
                    if let Some(dest) = least_overloaded(&loads, c, demands[p], capacity) {
                        move_point(&mut assignment, &mut loads, demands, p, c, dest);
                    }
                }
                ResidualPolicy::OpenCluster => {
                    let dest = nearest_with_room(
                        distances, &medoids, &loads, c, p, demands[p], capacity,
                    )
                    .unwrap_or_else(|| {
                        medoids.push(p);
                        loads.push(0.0);
                        medoids.len() - 1
                    });
                    move_point(&mut assignment, &mut loads, demands, p, c, dest);
                }
            }
        }
    }

    let over_capacity: Vec<usize> = (0..loads.len()).filter(|&c| !fits(loads[c])).collect();
    let outcome = if over_capacity.is_empty() {
        ClusterOutcome::Feasible
    } else {
        ClusterOutcome::PartiallyInfeasible { over_capacity }
    };

    CapacityRepair {
        medoids,
        assignment,
        loads,
        outcome,
    }
}

/// Cluster (other than `from`) with room for `demand` whose medoid is
/// nearest to `point`; ties go to the lowest id.
fn nearest_with_room(
    distances: &DistanceMatrix,
    medoids: &[usize],
    loads: &[f64],
    from: usize,
    point: usize,
    demand: f64,
    capacity: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (c, &m) in medoids.iter().enumerate() {
        if c == from || loads[c] + demand > capacity + CAPACITY_TOLERANCE {
            continue;
        }
        let d = distances.get(point, m);
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((c, d)),
        }
    }
    best.map(|(c, _)| c)
}

/// Destination minimizing the resulting overload, if it is strictly smaller
/// than the overload of staying in `from`.
fn least_overloaded(loads: &[f64], from: usize, demand: f64, capacity: f64) -> Option<usize> {
    let staying = loads[from] - capacity;
    let mut best: Option<(usize, f64)> = None;
    for (c, &load) in loads.iter().enumerate() {
        if c == from {
            continue;
        }
        let overload = load + demand - capacity;
        match best {
            Some((_, bo)) if overload >= bo => {}
            _ => best = Some((c, overload)),
        }
    }
    best.filter(|&(_, overload)| overload < staying - CAPACITY_TOLERANCE)
        .map(|(c, _)| c)
}

fn move_point(
    assignment: &mut [usize],
    loads: &mut [f64],
    demands: &[f64],
    point: usize,
    from: usize,
    to: usize,
) {
    assignment[point] = to;
    loads[from] -= demands[point];
    loads[to] += demands[point];
}

/// Assigns points to the given medoids, then repairs capacity.
///
/// Distances are planar; see [`assign_with_capacity_matrix`] for any other
/// metric. Points that cannot be placed feasibly go to the least-overloaded
/// cluster ([`ResidualPolicy::LeastOverloaded`]) rather than being dropped.
/// Callers must check [`cluster_loads`] against `capacity` afterwards.
///
/// # Examples
///
/// ```
/// use u_shuttle::clustering::assign_with_capacity;
/// use u_shuttle::models::Point;
///
/// let points = vec![
///     Point::new(0.0, 0.0),
///     Point::new(1.0, 0.0),
///     Point::new(2.0, 0.0),
///     Point::new(10.0, 0.0),
/// ];
/// // Medoid 0 would take points 1 and 2, exceeding capacity 2.
/// let assignment = assign_with_capacity(&points, &[0, 3], &[1.0; 4], 2.0).unwrap();
/// assert_eq!(assignment, vec![0, 0, 1, 1]);
/// ```
pub fn assign_with_capacity(
    points: &[Point],
    medoids: &[usize],
    demands: &[f64],
    capacity: f64,
) -> Result<Vec<usize>> {
    validate_demands(demands, points.len())?;
    let distances = build_distance_matrix(points)?;
    assign_with_capacity_matrix(&distances, medoids, demands, capacity)
}

/// [`assign_with_capacity`] on a precomputed matrix, so a clustering built
/// with [`Metric::GreatCircle`](crate::distance::Metric::GreatCircle) is
/// repaired under the same metric.
///
/// # Errors
///
/// - [`RoutingError::DimensionMismatch`] if `demands` or a medoid does not fit the matrix
/// - [`RoutingError::InvalidInput`] for a non-finite capacity, a negative
///   demand, no medoids, or a medoid listed twice
pub fn assign_with_capacity_matrix(
    distances: &DistanceMatrix,
    medoids: &[usize],
    demands: &[f64],
    capacity: f64,
) -> Result<Vec<usize>> {
    let n = distances.size();
    validate_demands(demands, n)?;
    if !capacity.is_finite() {
        return Err(RoutingError::invalid(format!("capacity {capacity} is not finite")));
    }
    if n == 0 {
        return Ok(Vec::new());
    }
    if medoids.is_empty() {
        return Err(RoutingError::invalid("at least one medoid is required"));
    }
    distances.check_indices(medoids)?;
    let mut seen = vec![false; n];
    for &m in medoids {
        if std::mem::replace(&mut seen[m], true) {
            return Err(RoutingError::invalid(format!("medoid {m} listed twice")));
        }
    }

    let assignment = assign_nearest(distances, medoids);
    let repair = repair_capacity(
        distances,
        demands,
        medoids,
        &assignment,
        capacity,
        ResidualPolicy::LeastOverloaded,
    );
    Ok(repair.assignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> (Vec<Point>, DistanceMatrix) {
        let points: Vec<Point> = (0..n).map(|i| Point::new(i as f64, 0.0)).collect();
        let dm = DistanceMatrix::from_points(&points);
        (points, dm)
    }

    #[test]
    fn test_feasible_untouched() {
        let (_, dm) = line(4);
        let r = repair_capacity(&dm, &[1.0; 4], &[0, 3], &[0, 0, 1, 1], 2.0, ResidualPolicy::KeepInPlace);
        assert_eq!(r.assignment, vec![0, 0, 1, 1]);
        assert!(r.outcome.is_feasible());
        assert_eq!(r.loads, vec![2.0, 2.0]);
    }

    #[test]
    fn test_moves_farthest_member_first() {
        let (_, dm) = line(5);
        // Cluster 0 = {0,1,2,3} with medoid 0, cluster 1 = {4}.
        let r = repair_capacity(
            &dm,
            &[1.0; 5],
            &[0, 4],
            &[0, 0, 0, 0, 1],
            3.0,
            ResidualPolicy::KeepInPlace,
        );
        assert_eq!(r.assignment, vec![0, 0, 0, 1, 1]);
        assert!(r.outcome.is_feasible());
    }

    #[test]
    fn test_skips_members_that_do_not_fit() {
        let (_, dm) = line(4);
        // Point 3 (demand 5) cannot fit in cluster 1, point 2 can.
        let demands = [0.0, 1.0, 1.0, 5.0];
        let r = repair_capacity(&dm, &demands, &[0, 1], &[0, 1, 0, 0], 5.0, ResidualPolicy::KeepInPlace);
        assert_eq!(r.assignment, vec![0, 1, 1, 0]);
        assert!(r.outcome.is_feasible());
    }

    #[test]
    fn test_keep_in_place_reports() {
        let (_, dm) = line(4);
        let r = repair_capacity(&dm, &[1.0; 4], &[0, 3], &[0, 0, 0, 1], 1.0, ResidualPolicy::KeepInPlace);
        assert_eq!(r.assignment, vec![0, 0, 0, 1]);
        assert_eq!(
            r.outcome,
            ClusterOutcome::PartiallyInfeasible {
                over_capacity: vec![0]
            }
        );
    }

    #[test]
    fn test_least_overloaded_balances() {
        let (_, dm) = line(4);
        // Cluster 0 load 3, cluster 1 load 1, capacity 1: moving point 2
        // gives overload 1 in cluster 1 versus overload 2 when staying.
        let r = repair_capacity(&dm, &[1.0; 4], &[0, 3], &[0, 0, 0, 1], 1.0, ResidualPolicy::LeastOverloaded);
        assert_eq!(r.assignment, vec![0, 0, 1, 1]);
        assert_eq!(r.loads, vec![2.0, 2.0]);
        assert_eq!(r.outcome.over_capacity(), &[0, 1]);
    }

    #[test]
    fn test_open_cluster_spawns_medoids() {
        let (_, dm) = line(4);
        let r = repair_capacity(&dm, &[1.0; 4], &[0], &[0, 0, 0, 0], 2.0, ResidualPolicy::OpenCluster);
        // Point 3 opens cluster 1; point 2 joins it.
        assert_eq!(r.medoids, vec![0, 3]);
        assert_eq!(r.assignment, vec![0, 0, 1, 1]);
        assert!(r.outcome.is_feasible());
    }

    #[test]
    fn test_zero_capacity_everything_over() {
        let (_, dm) = line(3);
        let r = repair_capacity(&dm, &[1.0; 3], &[0, 2], &[0, 0, 1], 0.0, ResidualPolicy::KeepInPlace);
        assert_eq!(r.outcome.over_capacity(), &[0, 1]);
    }

    #[test]
    fn test_assign_with_capacity_validation() {
        let (points, _) = line(3);
        assert!(matches!(
            assign_with_capacity(&points, &[0, 7], &[1.0; 3], 2.0),
            Err(RoutingError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            assign_with_capacity(&points, &[1, 1], &[1.0; 3], 2.0),
            Err(RoutingError::InvalidInput { .. })
        ));
        assert!(matches!(
            assign_with_capacity(&points, &[0], &[1.0, -1.0, 1.0], 2.0),
            Err(RoutingError::InvalidInput { .. })
        ));
        assert!(matches!(
            assign_with_capacity(&points, &[0], &[1.0; 2], 2.0),
            Err(RoutingError::DimensionMismatch { .. })
        ));
        assert_eq!(assign_with_capacity(&[], &[], &[], 2.0), Ok(Vec::new()));
    }

    #[test]
    fn test_assign_with_capacity_matrix_uses_given_distances() {
        // Coordinates put 1 next to 3 and 2 next to 0; the matrix says otherwise.
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(11.0, 0.0),
        ];
        let table = [
            [0.0, 1.0, 5.0, 6.0],
            [1.0, 0.0, 4.0, 5.0],
            [5.0, 4.0, 0.0, 1.0],
            [6.0, 5.0, 1.0, 0.0],
        ];
        let dm = DistanceMatrix::from_fn(4, |i, j| table[i][j]);

        let by_matrix = assign_with_capacity_matrix(&dm, &[0, 3], &[1.0; 4], 2.0).expect("valid");
        assert_eq!(by_matrix, vec![0, 0, 1, 1]);
        let planar = assign_with_capacity(&points, &[0, 3], &[1.0; 4], 2.0).expect("valid");
        assert_eq!(planar, vec![0, 1, 0, 1]);

        assert_eq!(
            assign_with_capacity_matrix(&dm, &[0], &[1.0; 3], 2.0),
            Err(RoutingError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_assign_with_capacity_least_overloaded_fallback() {
        let (points, _) = line(4);
        let assignment = assign_with_capacity(&points, &[0, 3], &[1.0; 4], 1.0).expect("valid");
        assert_eq!(assignment, vec![0, 0, 1, 1]);
        let loads = cluster_loads(&assignment, &[1.0; 4], 2);
        assert_eq!(loads, vec![2.0, 2.0]);
    }
}
