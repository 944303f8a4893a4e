//! Capacitated request clustering.
//!
//! - [`cluster`] — Seeded k-medoids followed by capacity repair
//! - [`assign_with_capacity`] — Standalone capacity repair for given medoids
//! - [`assign_with_capacity_matrix`] — The same on a precomputed matrix
//! - [`repair_capacity`] — Repair pass with an explicit [`ResidualPolicy`]
//! - [`split_by_center_distance`] — Capacity-sized chunks ordered by centre distance

mod capacity;
mod chunk;
mod k_medoids;

pub use capacity::{
    assign_with_capacity, assign_with_capacity_matrix, repair_capacity, CapacityRepair, ResidualPolicy,
};
pub use chunk::{split_by_center_distance, ChunkOrder, ChunkSplit};
pub use k_medoids::{assign_nearest, k_medoids, MedoidSearch};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::distance::{DistanceMatrix, DistanceProvider, Metric};
use crate::error::{Result, RoutingError};
use crate::models::{ClusterOutcome, ClusterResult, Point};

/// Slack used when comparing loads against capacity.
pub(crate) const CAPACITY_TOLERANCE: f64 = 1e-9;

/// Parameters for [`cluster`].
///
/// # Examples
///
/// ```
/// use u_shuttle::clustering::{ClusterConfig, ResidualPolicy};
///
/// let config = ClusterConfig::new(4, 12.0)
///     .with_seed(42)
///     .with_max_iter(50)
///     .with_residual(ResidualPolicy::OpenCluster);
/// assert_eq!(config.k, 4);
/// assert!(!config.strict);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of clusters (vehicles).
    pub k: usize,
    /// Shared per-cluster capacity.
    pub capacity: f64,
    /// Seed for medoid sampling.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Cap on k-medoids update rounds.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Handling of points that fit no cluster.
    #[serde(default)]
    pub residual: ResidualPolicy,
    /// Turn residual infeasibility into [`RoutingError::InfeasibleAssignment`].
    #[serde(default)]
    pub strict: bool,
    /// Distance provider used when clustering raw points.
    #[serde(default)]
    pub metric: Metric,
}

fn default_seed() -> u64 {
    123
}

fn default_max_iter() -> usize {
    100
}

impl ClusterConfig {
    /// Creates a configuration with seed 123, 100 iterations, keep-in-place
    /// residual handling, non-strict, planar distances.
    pub fn new(k: usize, capacity: f64) -> Self {
        Self {
            k,
            capacity,
            seed: default_seed(),
            max_iter: default_max_iter(),
            residual: ResidualPolicy::default(),
            strict: false,
            metric: Metric::default(),
        }
    }

    /// Sets the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the k-medoids iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the residual policy.
    pub fn with_residual(mut self, residual: ResidualPolicy) -> Self {
        self.residual = residual;
        self
    }

    /// Enables or disables strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the distance provider.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }
}

/// Clusters raw points: builds the distance matrix with `config.metric`,
/// then runs [`cluster_matrix`].
pub fn cluster(points: &[Point], demands: &[f64], config: &ClusterConfig) -> Result<ClusterResult> {
    let distances = config.metric.build(points)?;
    cluster_matrix(&distances, demands, config)
}

/// Capacitated k-medoids on a precomputed matrix.
///
/// Deterministic for a given seed. When `k >= N` every point is its own
/// cluster and capacity is not checked. Infeasibility is reported through
/// [`ClusterResult::outcome`] unless `config.strict` is set.
///
/// # Examples
///
/// ```
/// use u_shuttle::clustering::{cluster_matrix, ClusterConfig};
/// use u_shuttle::distance::DistanceMatrix;
/// use u_shuttle::models::Point;
///
/// let points = vec![
///     Point::new(0.0, 0.0), Point::new(1.0, 0.0),
///     Point::new(0.0, 1.0), Point::new(1.0, 1.0),
/// ];
/// let dm = DistanceMatrix::from_points(&points);
/// let result = cluster_matrix(&dm, &[1.0; 4], &ClusterConfig::new(2, 2.0)).unwrap();
/// assert!(result.outcome().is_feasible());
/// assert!(result.loads().iter().all(|&l| l == 2.0));
/// ```
pub fn cluster_matrix(
    distances: &DistanceMatrix,
    demands: &[f64],
    config: &ClusterConfig,
) -> Result<ClusterResult> {
    let n = distances.size();
    validate_demands(demands, n)?;
    if config.capacity.is_nan() {
        return Err(RoutingError::invalid("capacity is NaN"));
    }
    if n == 0 {
        return Ok(ClusterResult::empty());
    }
    if config.k == 0 {
        return Err(RoutingError::invalid("k must be at least 1"));
    }
    let total: f64 = demands.iter().sum();
    if config.strict && config.capacity <= 0.0 && total > 0.0 {
        return Err(RoutingError::invalid(format!(
            "capacity {} cannot carry total demand {total}",
            config.capacity
        )));
    }

    if config.k >= n {
        let own: Vec<usize> = (0..n).collect();
        return Ok(ClusterResult::new(
            own.clone(),
            own,
            demands.to_vec(),
            ClusterOutcome::Feasible,
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let search = k_medoids(distances, config.k, config.max_iter, &mut rng);
    let repair = repair_capacity(
        distances,
        demands,
        &search.medoids,
        &search.assignment,
        config.capacity,
        config.residual,
    );

    if config.strict && !repair.outcome.is_feasible() {
        return Err(RoutingError::InfeasibleAssignment {
            over_capacity: repair.outcome.over_capacity().to_vec(),
        });
    }

    Ok(
        ClusterResult::new(repair.medoids, repair.assignment, repair.loads, repair.outcome)
            .with_search_stats(search.iterations, search.converged),
    )
}

/// Summed demand per cluster id.
pub fn cluster_loads(assignment: &[usize], demands: &[f64], num_clusters: usize) -> Vec<f64> {
    let mut loads = vec![0.0; num_clusters];
    for (&c, &d) in assignment.iter().zip(demands) {
        loads[c] += d;
    }
    loads
}

/// Demands must match the point count and be finite and non-negative.
pub(crate) fn validate_demands(demands: &[f64], n: usize) -> Result<()> {
    if demands.len() != n {
        return Err(RoutingError::DimensionMismatch {
            expected: n,
            actual: demands.len(),
        });
    }
    match demands.iter().position(|d| !d.is_finite() || *d < 0.0) {
        Some(i) => Err(RoutingError::invalid(format!(
            "demand at point {i} is {}",
            demands[i]
        ))),
        None => Ok(()),
    }
}
