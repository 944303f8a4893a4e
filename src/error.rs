//! Error types shared by every stage of the shuttle pipeline.

use std::fmt::Display;

/// Errors raised by distance, clustering, routing, and simulation operations.
///
/// Infeasible capacity is normally a *reported* condition (see
/// [`ClusterOutcome`](crate::models::ClusterOutcome)); it only surfaces as
/// [`RoutingError::InfeasibleAssignment`] when strict mode is requested.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingError {
    /// Malformed input: non-finite coordinates, negative demand, bad parameters.
    InvalidInput {
        /// Human-readable description of the offending value.
        reason: String,
    },
    /// A matrix or slice does not have the size implied by the point set.
    DimensionMismatch {
        /// Size implied by the other inputs.
        expected: usize,
        /// Size actually supplied.
        actual: usize,
    },
    /// Strict mode only: some clusters exceed capacity after repair.
    InfeasibleAssignment {
        /// Cluster ids whose load exceeds capacity, ascending.
        over_capacity: Vec<usize>,
    },
}

impl RoutingError {
    /// Shorthand for [`RoutingError::InvalidInput`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { reason } => write!(f, "Invalid input: {reason}"),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "Dimension mismatch: expected {expected} entries, got {actual}"
            ),
            Self::InfeasibleAssignment { over_capacity } => write!(
                f,
                "Infeasible assignment: clusters {over_capacity:?} exceed capacity"
            ),
        }
    }
}

impl std::error::Error for RoutingError {}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RoutingError>;
