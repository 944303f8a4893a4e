//! Configuration of one simulated variant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clustering::{ChunkOrder, ClusterConfig};
use crate::logging::InfoLogger;
use crate::metrics::KpiConfig;
use crate::models::Point;
use crate::routing::RouteConfig;
use crate::simulation::{Schedule, TimeModel};

/// How requests are grouped into vehicles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grouping {
    /// Capacitated k-medoids; each route starts at its cluster medoid.
    #[default]
    KMedoids,
    /// Capacity-sized chunks by distance to the centre; every route starts
    /// and ends at the centre ([`VariantConfig::destination`]).
    CenterChunks {
        /// Packing order.
        order: ChunkOrder,
    },
}

/// Everything needed to run one variant.
///
/// The vehicle count and capacity live in [`ClusterConfig`]. `destination`
/// is the external arrival point (e.g. a care centre); when set, every route
/// ends there instead of returning to its depot.
///
/// One base `seed` drives medoid sampling, tabu moves and travel-time noise.
/// The `seed` fields inside `cluster` and `route` are not read by
/// [`run_variant`](super::run_variant); `cluster_seed` and `route_seed`
/// override the base seed for a single stage.
///
/// # Examples
///
/// ```
/// use u_shuttle::models::Point;
/// use u_shuttle::pipeline::VariantConfig;
/// use u_shuttle::simulation::Schedule;
///
/// let config = VariantConfig::new(3, 8.0)
///     .with_destination(Point::new(0.0, 0.0))
///     .with_schedule(Schedule::ArriveBy(540.0))
///     .with_seed(7);
/// assert_eq!(config.cluster.k, 3);
/// assert_eq!(config.cluster_config().seed, 7);
/// assert_eq!(config.route_config().seed, 7);
///
/// let pinned = config.with_cluster_seed(1);
/// assert_eq!(pinned.cluster_config().seed, 1);
/// assert_eq!(pinned.route_config().seed, 7);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct VariantConfig {
    /// Label carried into the run and log lines.
    #[serde(default = "default_name")]
    pub name: String,
    /// Grouping strategy.
    #[serde(default)]
    pub grouping: Grouping,
    /// Clustering parameters, including vehicle count and capacity.
    pub cluster: ClusterConfig,
    /// Route construction parameters.
    #[serde(default)]
    pub route: RouteConfig,
    /// Travel-time model.
    #[serde(default)]
    pub time_model: TimeModel,
    /// Promised times.
    #[serde(default)]
    pub schedule: Schedule,
    /// External arrival point.
    #[serde(default)]
    pub destination: Option<Point>,
    /// KPI thresholds.
    #[serde(default)]
    pub kpi: KpiConfig,
    /// Base seed for every stage; vehicle `v` draws tabu moves and noise
    /// from `seed + v`.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Medoid sampling seed, if it should differ from `seed`.
    #[serde(default)]
    pub cluster_seed: Option<u64>,
    /// Tabu base seed, if it should differ from `seed`.
    #[serde(default)]
    pub route_seed: Option<u64>,
    /// Progress logger; silent when `None`.
    #[serde(skip)]
    pub logger: Option<InfoLogger>,
}

fn default_name() -> String {
    "variant".to_string()
}

fn default_seed() -> u64 {
    123
}

impl VariantConfig {
    /// Creates a k-medoids variant with `k` vehicles of `capacity`.
    pub fn new(k: usize, capacity: f64) -> Self {
        Self {
            name: default_name(),
            grouping: Grouping::default(),
            cluster: ClusterConfig::new(k, capacity),
            route: RouteConfig::default(),
            time_model: TimeModel::default(),
            schedule: Schedule::default(),
            destination: None,
            kpi: KpiConfig::default(),
            seed: default_seed(),
            cluster_seed: None,
            route_seed: None,
            logger: None,
        }
    }

    /// Sets the label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the grouping strategy.
    pub fn with_grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = grouping;
        self
    }

    /// Replaces the clustering parameters.
    pub fn with_cluster(mut self, cluster: ClusterConfig) -> Self {
        self.cluster = cluster;
        self
    }

    /// Replaces the route parameters.
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.route = route;
        self
    }

    /// Replaces the time model.
    pub fn with_time_model(mut self, time_model: TimeModel) -> Self {
        self.time_model = time_model;
        self
    }

    /// Sets the schedule.
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sets the external arrival point.
    pub fn with_destination(mut self, destination: Point) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Sets the KPI thresholds.
    pub fn with_kpi(mut self, kpi: KpiConfig) -> Self {
        self.kpi = kpi;
        self
    }

    /// Sets the base seed for every stage.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Pins the medoid sampling seed.
    pub fn with_cluster_seed(mut self, seed: u64) -> Self {
        self.cluster_seed = Some(seed);
        self
    }

    /// Pins the tabu base seed.
    pub fn with_route_seed(mut self, seed: u64) -> Self {
        self.route_seed = Some(seed);
        self
    }

    /// Clustering parameters with the effective seed.
    pub fn cluster_config(&self) -> ClusterConfig {
        self.cluster.clone().with_seed(self.cluster_seed.unwrap_or(self.seed))
    }

    /// Route parameters with the effective seed.
    pub fn route_config(&self) -> RouteConfig {
        self.route.clone().with_seed(self.route_seed.unwrap_or(self.seed))
    }

    /// Installs a progress logger.
    pub fn with_logger(mut self, logger: InfoLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub(crate) fn log(&self, msg: &str) {
        if let Some(logger) = &self.logger {
            (logger)(&format!("[{}] {msg}", self.name));
        }
    }
}

impl fmt::Debug for VariantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantConfig")
            .field("name", &self.name)
            .field("grouping", &self.grouping)
            .field("cluster", &self.cluster)
            .field("route", &self.route)
            .field("time_model", &self.time_model)
            .field("schedule", &self.schedule)
            .field("destination", &self.destination)
            .field("kpi", &self.kpi)
            .field("seed", &self.seed)
            .field("cluster_seed", &self.cluster_seed)
            .field("route_seed", &self.route_seed)
            .field("logger", &self.logger.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
