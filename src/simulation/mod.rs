//! Stochastic arrival-time simulation.
//!
//! - [`TimeModel`] — Distance to minutes, with [`Noise`]
//! - [`TimeSimulator`] — Per-route event iterator
//! - [`simulate_route`] / [`simulate_seeded`] — Collect a [`RouteTimeline`](crate::models::RouteTimeline)

mod simulator;
mod time_model;

pub use simulator::{simulate_route, simulate_seeded, Schedule, SimState, TimeSimulator};
pub use time_model::{LegSampler, Noise, TimeModel};
