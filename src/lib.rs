//! # u-shuttle
//!
//! Demand-responsive shuttle simulation: groups pickup requests into
//! vehicle-sized clusters, sequences each vehicle's stops, simulates arrival
//! times under travel-time noise, and reduces the result to service KPIs.
//!
//! ## Modules
//!
//! - [`models`] — Domain model types (Point, ClusterResult, Route, StopEvent)
//! - [`distance`] — Distance matrix and planar / great-circle providers
//! - [`clustering`] — Capacitated k-medoids, capacity repair, centre chunking
//! - [`constructive`] — Nearest-neighbor tour construction
//! - [`local_search`] — Tour improvement (2-opt, tabu search)
//! - [`routing`] — Per-cluster route building
//! - [`simulation`] — Time model and stop-by-stop simulator
//! - [`metrics`] — KPI aggregation
//! - [`pipeline`] — One-call variant runs
//! - [`logging`] — Pluggable progress logger
//!
//! Every random choice draws from an explicitly seeded RNG, so identical
//! inputs and seeds always give identical results.

pub mod clustering;
pub mod constructive;
pub mod distance;
pub mod error;
pub mod local_search;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod routing;
pub mod simulation;

pub use error::{Result, RoutingError};
