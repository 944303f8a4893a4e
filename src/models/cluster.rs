//! Clustering result types.

use serde::{Deserialize, Serialize};

/// Feasibility of a clustering with respect to the shared capacity.
///
/// Infeasibility is a tagged outcome rather than an error so that parameter
/// sweeps can tabulate infeasible configurations and keep going.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClusterOutcome {
    /// Every cluster is within capacity (or capacity checks do not apply).
    Feasible,
    /// Some clusters still exceed capacity after repair.
    PartiallyInfeasible {
        /// Cluster ids whose load exceeds capacity, ascending.
        over_capacity: Vec<usize>,
    },
}

impl ClusterOutcome {
    /// Returns `true` for [`ClusterOutcome::Feasible`].
    pub fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible)
    }

    /// Cluster ids over capacity (empty when feasible).
    pub fn over_capacity(&self) -> &[usize] {
        match self {
            Self::Feasible => &[],
            Self::PartiallyInfeasible { over_capacity } => over_capacity,
        }
    }
}

/// One cluster: a medoid and its member points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster id (index into the medoid list).
    pub id: usize,
    /// Medoid point index, used as the route depot.
    pub medoid: usize,
    /// Member point indices in ascending order, medoid included.
    pub members: Vec<usize>,
    /// Summed demand of the members.
    pub load: f64,
}

/// Result of capacitated clustering.
///
/// `assignment[i]` is the cluster id owning point `i`; `medoids[c]` is the
/// medoid of cluster `c`. Carries the iteration counter and convergence flag
/// of the k-medoids loop.
///
/// # Examples
///
/// ```
/// use u_shuttle::clustering::{cluster, ClusterConfig};
/// use u_shuttle::models::Point;
///
/// let points = vec![Point::new(0.0, 0.0), Point::new(0.1, 0.0), Point::new(9.0, 9.0)];
/// let config = ClusterConfig::new(2, 10.0).with_seed(7);
/// let result = cluster(&points, &[1.0, 1.0, 1.0], &config).unwrap();
///
/// assert_eq!(result.assignment().len(), 3);
/// assert_eq!(result.assignment()[0], result.assignment()[1]);
/// assert!(result.outcome().is_feasible());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    medoids: Vec<usize>,
    assignment: Vec<usize>,
    loads: Vec<f64>,
    outcome: ClusterOutcome,
    iterations: usize,
    converged: bool,
}

impl ClusterResult {
    /// Assembles a result from its parts.
    pub fn new(
        medoids: Vec<usize>,
        assignment: Vec<usize>,
        loads: Vec<f64>,
        outcome: ClusterOutcome,
    ) -> Self {
        Self {
            medoids,
            assignment,
            loads,
            outcome,
            iterations: 0,
            converged: true,
        }
    }

    /// Records how the k-medoids loop terminated.
    pub fn with_search_stats(mut self, iterations: usize, converged: bool) -> Self {
        self.iterations = iterations;
        self.converged = converged;
        self
    }

    /// An empty result for an empty point set.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), ClusterOutcome::Feasible)
    }

    /// Medoid point index per cluster id.
    pub fn medoids(&self) -> &[usize] {
        &self.medoids
    }

    /// Cluster id per point index.
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    /// Summed demand per cluster id.
    pub fn loads(&self) -> &[f64] {
        &self.loads
    }

    /// Feasibility outcome.
    pub fn outcome(&self) -> &ClusterOutcome {
        &self.outcome
    }

    /// Number of update rounds performed by the k-medoids loop.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// `false` if the iteration cap stopped the loop before medoids settled.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Number of clusters.
    pub fn num_clusters(&self) -> usize {
        self.medoids.len()
    }

    /// Member point indices of cluster `id`, ascending.
    pub fn members(&self, id: usize) -> Vec<usize> {
        self.assignment
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == id)
            .map(|(i, _)| i)
            .collect()
    }

    /// Materializes every cluster.
    pub fn clusters(&self) -> Vec<Cluster> {
        let mut members = vec![Vec::new(); self.medoids.len()];
        for (i, &c) in self.assignment.iter().enumerate() {
            members[c].push(i);
        }
        members
            .into_iter()
            .enumerate()
            .map(|(id, members)| Cluster {
                id,
                medoid: self.medoids[id],
                members,
                load: self.loads.get(id).copied().unwrap_or(0.0),
            })
            .collect()
    }
}
