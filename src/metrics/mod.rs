//! Service-quality KPIs for one simulated variant.
//!
//! [`aggregate`] is a pure reduction over every [`RouteTimeline`] and
//! [`Route`] of a variant. It never fails: with no events, means,
//! percentiles, and maxima are 0.0, on-time rates are 1.0, and counts are 0.
//!
//! # Percentiles
//!
//! Linear interpolation between closest ranks: the `p`-th percentile of
//! sorted values `v[0..n]` sits at fractional rank `p / 100 · (n − 1)`.

mod summary;

pub use summary::{percentile, Summary};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Route, RouteTimeline};

/// Thresholds applied when scoring timelines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiConfig {
    /// A stop is on time when its lateness is at most this many minutes.
    #[serde(default)]
    pub on_time_threshold: f64,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            on_time_threshold: 0.0,
        }
    }
}

impl KpiConfig {
    /// Sets the on-time threshold.
    pub fn with_on_time_threshold(mut self, minutes: f64) -> Self {
        self.on_time_threshold = minutes;
        self
    }
}

/// Flat, ordered KPI name → value mapping.
///
/// Serializes as a plain JSON object with keys in alphabetical order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantMetrics {
    values: BTreeMap<String, f64>,
}

impl VariantMetrics {
    /// Value of a KPI.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Sets a KPI, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// KPIs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of KPIs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no KPI is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert_summary(&mut self, prefix: &str, summary: &Summary) {
        self.insert(format!("{prefix}_mean"), summary.mean);
        self.insert(format!("{prefix}_p95"), summary.p95);
        self.insert(format!("{prefix}_max"), summary.max);
    }
}

/// Share of values at or below `threshold`; 1.0 when empty.
fn on_time_rate(lateness: &[f64], threshold: f64) -> f64 {
    if lateness.is_empty() {
        return 1.0;
    }
    lateness.iter().filter(|&&l| l <= threshold).count() as f64 / lateness.len() as f64
}

/// Reduces simulated timelines into KPIs.
///
/// Pickup lateness and ride time are sampled once per served request.
/// Arrival lateness is also weighted per request: each request on a route
/// with a closing arrival contributes that route's arrival lateness.
///
/// # Examples
///
/// ```
/// use u_shuttle::metrics::{aggregate, KpiConfig};
///
/// let metrics = aggregate(&[], &[], 0, &KpiConfig::default());
/// assert_eq!(metrics.get("pickup_late_p95"), Some(0.0));
/// assert_eq!(metrics.get("pickup_on_time_rate"), Some(1.0));
/// assert_eq!(metrics.get("vehicles_used"), Some(0.0));
/// ```
pub fn aggregate(
    timelines: &[RouteTimeline],
    routes: &[Route],
    infeasible_clusters: usize,
    config: &KpiConfig,
) -> VariantMetrics {
    let mut pickup_late = Vec::new();
    let mut arrival_late = Vec::new();
    let mut ride_times = Vec::new();
    let mut total_travel_time = 0.0;

    for timeline in timelines {
        pickup_late.extend(timeline.request_events().map(|e| e.lateness()));
        if let Some(arrival) = timeline.arrival() {
            let late = arrival.lateness();
            arrival_late.extend(timeline.request_events().map(|_| late));
        }
        ride_times.extend(timeline.ride_times());
        total_travel_time += timeline.duration();
    }

    let threshold = config.on_time_threshold;
    let mut metrics = VariantMetrics::default();
    metrics.insert_summary("pickup_late", &Summary::of(&pickup_late));
    metrics.insert_summary("arrival_late", &Summary::of(&arrival_late));
    metrics.insert_summary("ride_time", &Summary::of(&ride_times));
    metrics.insert("pickup_on_time_rate", on_time_rate(&pickup_late, threshold));
    metrics.insert("arrival_on_time_rate", on_time_rate(&arrival_late, threshold));
    metrics.insert("total_travel_time", total_travel_time);
    metrics.insert(
        "vehicles_used",
        routes.iter().filter(|r| r.num_pickups() > 0).count() as f64,
    );
    metrics.insert("requests_served", pickup_late.len() as f64);
    metrics.insert("infeasible_clusters", infeasible_clusters as f64);
    metrics
}
