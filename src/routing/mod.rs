//! Per-cluster route sequencing.
//!
//! A route is built in two stages: nearest-neighbor construction from the
//! depot, then an optional improvement stage chosen by [`Improvement`].
//!
//! - [`build_route`] — Sequence one cluster (vehicle 0)
//! - [`build_vehicle_route`] — Sequence one cluster for a given vehicle

mod builder;

pub use builder::{build_route, build_vehicle_route};

use serde::{Deserialize, Serialize};

/// Improvement stage applied after construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Improvement {
    /// Keep the nearest-neighbor tour.
    None,
    /// First-improvement 2-opt, capped by [`RouteConfig::max_passes`].
    #[default]
    TwoOpt,
    /// Swap-move tabu search seeded per vehicle.
    Tabu {
        /// Candidate moves to draw.
        iterations: usize,
        /// Iterations a swapped pair stays tabu.
        tenure: usize,
    },
}

impl Improvement {
    /// Tabu search with 200 iterations and tenure 20.
    pub fn tabu() -> Self {
        Self::Tabu {
            iterations: 200,
            tenure: 20,
        }
    }
}

/// Parameters for [`build_route`].
///
/// # Examples
///
/// ```
/// use u_shuttle::routing::{Improvement, RouteConfig};
///
/// let config = RouteConfig::default();
/// assert!(config.closed);
/// assert_eq!(config.improvement, Improvement::TwoOpt);
/// assert_eq!(config.max_passes, 30);
///
/// let open = RouteConfig::default().with_closed(false).with_improvement(Improvement::tabu());
/// assert!(!open.closed);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Return to the depot after the last stop. A route built toward a
    /// destination ends there instead.
    #[serde(default = "default_closed")]
    pub closed: bool,
    /// Improvement stage.
    #[serde(default)]
    pub improvement: Improvement,
    /// Cap on 2-opt passes.
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
    /// Base seed for randomized improvement; vehicle `v` uses `seed + v`.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_closed() -> bool {
    true
}

fn default_max_passes() -> usize {
    30
}

fn default_seed() -> u64 {
    123
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            closed: default_closed(),
            improvement: Improvement::default(),
            max_passes: default_max_passes(),
            seed: default_seed(),
        }
    }
}

impl RouteConfig {
    /// Sets whether tours return to the depot.
    pub fn with_closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }

    /// Sets the improvement stage.
    pub fn with_improvement(mut self, improvement: Improvement) -> Self {
        self.improvement = improvement;
        self
    }

    /// Sets the 2-opt pass cap.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
