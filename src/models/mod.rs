//! Domain model types for shuttle simulation.
//!
//! Provides the core values passed between stages: request points, the
//! clustering result, vehicle routes, and simulated stop events.

mod cluster;
mod event;
mod point;
mod route;

pub use cluster::{Cluster, ClusterOutcome, ClusterResult};
pub use event::{RouteTimeline, StopEvent, StopKind};
pub use point::Point;
pub use route::{ImprovementStats, Route, TourEnd};
