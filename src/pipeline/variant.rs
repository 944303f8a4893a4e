//! End-to-end run of one variant.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Grouping, VariantConfig};
use crate::clustering::{cluster_matrix, split_by_center_distance, validate_demands};
use crate::distance::{DistanceMatrix, DistanceProvider};
use crate::error::{Result, RoutingError};
use crate::logging::Timer;
use crate::metrics::{aggregate, VariantMetrics};
use crate::models::{ClusterResult, Point, Route, RouteTimeline};
use crate::routing::build_vehicle_route;
use crate::simulation::simulate_seeded;

/// Output of [`run_variant`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRun {
    /// Variant label.
    pub name: String,
    /// Every location a route may reference: the request points, then the
    /// destination if one was configured.
    pub locations: Vec<Point>,
    /// Clustering result (k-medoids grouping only).
    pub clustering: Option<ClusterResult>,
    /// Requests no vehicle could take (chunk grouping only).
    pub unassigned: Vec<usize>,
    /// One route per vehicle, ordered by vehicle id.
    pub routes: Vec<Route>,
    /// Simulated timeline per route, same order.
    pub timelines: Vec<RouteTimeline>,
    /// KPIs.
    pub metrics: VariantMetrics,
}

impl VariantRun {
    /// Stop coordinates of every route, in vehicle order.
    pub fn route_coordinates(&self) -> Vec<Vec<Point>> {
        self.routes.iter().map(|r| r.coordinates(&self.locations)).collect()
    }
}

/// One vehicle's share of the requests.
struct Group {
    vehicle_id: usize,
    depot: usize,
    members: Vec<usize>,
}

/// Groups requests, builds and simulates one route per group, and
/// aggregates KPIs.
///
/// With a destination, every k-medoids route is optimized as a path from its
/// medoid through its stops to the destination, and the simulation drives
/// exactly that path. Center-chunk routes start and end at the centre.
///
/// Routes are built and simulated in parallel; each vehicle draws from its
/// own seeded stream, so the result does not depend on thread scheduling.
///
/// # Errors
///
/// Propagates input validation errors from every stage. Center-chunk
/// grouping without a destination is [`RoutingError::InvalidInput`].
///
/// # Examples
///
/// ```
/// use u_shuttle::models::Point;
/// use u_shuttle::pipeline::{run_variant, VariantConfig};
///
/// let points = vec![
///     Point::new(0.0, 0.0), Point::new(0.5, 0.0),
///     Point::new(5.0, 5.0), Point::new(5.5, 5.0),
/// ];
/// let run = run_variant(&points, &[1.0; 4], &VariantConfig::new(2, 2.0)).unwrap();
///
/// assert_eq!(run.routes.len(), 2);
/// assert_eq!(run.metrics.get("requests_served"), Some(4.0));
/// ```
pub fn run_variant(points: &[Point], demands: &[f64], config: &VariantConfig) -> Result<VariantRun> {
    let timer = Timer::start();
    let n = points.len();
    validate_demands(demands, n)?;
    config.time_model.validate()?;

    let mut locations = points.to_vec();
    let destination = config.destination.map(|p| {
        locations.push(p);
        n
    });
    let distances = config.cluster.metric.build(&locations)?;
    let cluster_config = config.cluster_config();
    let route_config = config.route_config();

    let mut clustering = None;
    let mut unassigned = Vec::new();
    let (groups, route_end) = match config.grouping {
        Grouping::KMedoids => {
            let requests = request_matrix(&distances, n, destination.is_some());
            let result = cluster_matrix(requests.as_ref().unwrap_or(&distances), demands, &cluster_config)?;
            config.log(&format!(
                "clustering: {} clusters after {} iterations (converged: {})",
                result.num_clusters(),
                result.iterations(),
                result.converged()
            ));
            let groups = result
                .clusters()
                .into_iter()
                .map(|c| Group {
                    vehicle_id: c.id,
                    depot: c.medoid,
                    members: c.members,
                })
                .collect::<Vec<_>>();
            clustering = Some(result);
            (groups, destination)
        }
        Grouping::CenterChunks { order } => {
            let center = destination.ok_or_else(|| {
                RoutingError::invalid("center-chunk grouping needs a destination")
            })?;
            let mut all_demands = demands.to_vec();
            all_demands.push(0.0);
            let requests: Vec<usize> = (0..n).collect();
            let split = split_by_center_distance(
                &distances,
                center,
                &requests,
                &all_demands,
                config.cluster.capacity,
                config.cluster.k,
                order,
            )?;
            unassigned = split.unassigned;
            let groups = split
                .groups
                .into_iter()
                .enumerate()
                .map(|(vehicle_id, members)| Group {
                    vehicle_id,
                    depot: center,
                    members,
                })
                .collect::<Vec<_>>();
            (groups, Some(center))
        }
    };

    let outputs = groups
        .par_iter()
        .map(|g| -> Result<(Route, RouteTimeline)> {
            let route = build_vehicle_route(g.vehicle_id, &g.members, &distances, g.depot, route_end, &route_config)?;
            let timeline = simulate_seeded(&route, &distances, &config.time_model, &config.schedule, config.seed)?;
            Ok((route, timeline))
        })
        .collect::<Result<Vec<_>>>()?;
    let (routes, timelines): (Vec<Route>, Vec<RouteTimeline>) = outputs.into_iter().unzip();

    let infeasible = clustering
        .as_ref()
        .map_or(0, |c: &ClusterResult| c.outcome().over_capacity().len());
    if infeasible > 0 {
        config.log(&format!("{infeasible} clusters exceed capacity"));
    }
    if !unassigned.is_empty() {
        config.log(&format!("{} requests left unassigned", unassigned.len()));
    }

    let mut metrics = aggregate(&timelines, &routes, infeasible, &config.kpi);
    metrics.insert("requests_unassigned", unassigned.len() as f64);

    config.log(&format!(
        "routes: {}, requests served: {}, completed in {} ms",
        routes.len(),
        metrics.get("requests_served").unwrap_or(0.0),
        timer.elapsed_millis()
    ));

    Ok(VariantRun {
        name: config.name.clone(),
        locations,
        clustering,
        unassigned,
        routes,
        timelines,
        metrics,
    })
}

/// Request-only view of `distances` when a destination was appended.
fn request_matrix(distances: &DistanceMatrix, n: usize, has_destination: bool) -> Option<DistanceMatrix> {
    has_destination.then(|| DistanceMatrix::from_fn(n, |i, j| distances.get(i, j)))
}
