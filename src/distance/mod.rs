//! Distance matrices and the providers that fill them.
//!
//! Provides a dense distance matrix plus planar and great-circle providers.
//! Travel-time matrices are derived from these through
//! [`TimeModel`](crate::simulation::TimeModel).

mod matrix;
mod provider;

pub use matrix::DistanceMatrix;
pub use provider::{
    build_distance_matrix, DistanceProvider, Euclidean, Haversine, Metric, EARTH_RADIUS_KM,
};
