//! Intra-route 2-opt improvement with a pinned depot.
//!
//! # Algorithm
//!
//! For positions `1 <= i < j < n` of a tour `t` (with `t[0]` the depot),
//! compute the change in length from reversing the segment `t[i..=j]`:
//!
//! ```text
//! delta = d(t[i-1], t[j]) + d(t[i], t[j+1]) - d(t[i-1], t[i]) - d(t[j], t[j+1])
//! ```
//!
//! where past the last stop `t[j+1]` is the tour's closing point (the depot
//! or a fixed destination), and the second pair of terms vanishes at the end
//! of an open tour. If delta < 0, reverse the
//! segment (first-improvement). Passes repeat until one makes no move or the
//! pass cap is reached.
//!
//! # Complexity
//!
//! O(n²) per pass, at most `max_passes` passes.
//!
//! # Reference
//!
//! Croes, G.A. (1958). "A method for solving traveling salesman problems",
//! *Operations Research* 6(6), 791-812.

use super::{tour_length, IMPROVEMENT_EPS};
use crate::distance::DistanceMatrix;
use crate::models::TourEnd;

/// Result of [`two_opt_improve`].
#[derive(Debug, Clone, PartialEq)]
pub struct TwoOptOutcome {
    /// Improved tour, depot still first.
    pub tour: Vec<usize>,
    /// Tour length.
    pub length: f64,
    /// Passes performed.
    pub passes: usize,
    /// `true` if the last pass found no improving move.
    pub converged: bool,
}

/// Applies 2-opt to a full tour (`tour[0]` is the depot and never moves).
///
/// A fixed end point stays after the last stop, so the result is the
/// shortest path found from the depot through every stop to that point.
///
/// # Examples
///
/// ```
/// use u_shuttle::models::{Point, TourEnd};
/// use u_shuttle::distance::DistanceMatrix;
/// use u_shuttle::local_search::two_opt_improve;
///
/// let points = vec![
///     Point::new(0.0, 0.0),
///     Point::new(1.0, 0.0),
///     Point::new(2.0, 0.0),
///     Point::new(3.0, 0.0),
/// ];
/// let dm = DistanceMatrix::from_points(&points);
///
/// // Suboptimal order: 0 → 1 → 3 → 2 → 0
/// let out = two_opt_improve(&[0, 1, 3, 2], &dm, TourEnd::Depot, 30);
/// assert!(out.length <= 6.0 + 1e-10); // optimal: 0→1→2→3→0 = 6
/// assert!(out.converged);
/// ```
pub fn two_opt_improve(
    tour: &[usize],
    distances: &DistanceMatrix,
    end: TourEnd,
    max_passes: usize,
) -> TwoOptOutcome {
    let mut current = tour.to_vec();
    let n = current.len();

    if n < 3 {
        let length = tour_length(&current, distances, end);
        return TwoOptOutcome {
            tour: current,
            length,
            passes: 0,
            converged: true,
        };
    }

    let mut passes = 0;
    let mut converged = false;

    while passes < max_passes {
        passes += 1;
        let mut improved = false;

        for i in 1..n - 1 {
            for j in i + 1..n {
                if two_opt_delta(&current, distances, end, i, j) < -IMPROVEMENT_EPS {
                    current[i..=j].reverse();
                    improved = true;
                }
            }
        }

        if !improved {
            converged = true;
            break;
        }
    }

    let length = tour_length(&current, distances, end);
    TwoOptOutcome {
        tour: current,
        length,
        passes,
        converged,
    }
}

/// Length change from reversing `tour[i..=j]`.
fn two_opt_delta(tour: &[usize], distances: &DistanceMatrix, end: TourEnd, i: usize, j: usize) -> f64 {
    let prev = tour[i - 1];
    let next = match tour.get(j + 1) {
        Some(&p) => Some(p),
        None => end.closing_point(tour),
    };

    let mut delta = distances.get(prev, tour[j]) - distances.get(prev, tour[i]);
    if let Some(next) = next {
        delta += distances.get(tour[i], next) - distances.get(tour[j], next);
    }
    delta
}
