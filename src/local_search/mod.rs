//! Intra-route improvement operators.
//!
//! All operators take a full tour whose first entry is the depot. The depot
//! never moves, and the [`TourEnd`] fixes what follows the last stop: nothing,
//! the leg back to the depot, or the leg on to a fixed destination.
//!
//! - [`two_opt_improve`] — First-improvement 2-opt segment reversal
//! - [`tabu_improve`] — Seeded swap-move tabu search

mod tabu;
mod two_opt;

pub use tabu::{tabu_improve, TabuOutcome};
pub use two_opt::{two_opt_improve, TwoOptOutcome};

use crate::distance::DistanceMatrix;
use crate::models::TourEnd;

/// A move must shorten the tour by more than this to count as an improvement.
pub(crate) const IMPROVEMENT_EPS: f64 = 1e-10;

/// Total length of a tour (depot first).
///
/// Includes the closing leg given by `end`. An empty tour has zero length.
///
/// # Examples
///
/// ```
/// use u_shuttle::models::{Point, TourEnd};
/// use u_shuttle::distance::DistanceMatrix;
/// use u_shuttle::local_search::tour_length;
///
/// let dm = DistanceMatrix::from_points(&[
///     Point::new(0.0, 0.0),
///     Point::new(3.0, 0.0),
///     Point::new(3.0, 4.0),
///     Point::new(3.0, 10.0),
/// ]);
/// assert!((tour_length(&[0, 1, 2], &dm, TourEnd::Open) - 7.0).abs() < 1e-10);
/// assert!((tour_length(&[0, 1, 2], &dm, TourEnd::Depot) - 12.0).abs() < 1e-10);
/// assert!((tour_length(&[0, 1, 2], &dm, TourEnd::At(3)) - 13.0).abs() < 1e-10);
/// ```
pub fn tour_length(tour: &[usize], distances: &DistanceMatrix, end: TourEnd) -> f64 {
    let mut dist: f64 = tour.windows(2).map(|w| distances.get(w[0], w[1])).sum();
    if let (Some(&last), Some(p)) = (tour.last(), end.closing_point(tour)) {
        dist += distances.get(last, p);
    }
    dist
}
