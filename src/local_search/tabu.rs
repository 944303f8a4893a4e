//! Swap-move tabu search over a single tour.
//!
//! # Algorithm
//!
//! Each iteration draws two non-depot positions uniformly from the RNG and
//! evaluates the tour with those stops swapped. The move is keyed by the
//! unordered pair of point indices. A tabu move is accepted only if it beats
//! the best tour seen so far (aspiration); any other move is accepted
//! unconditionally and becomes tabu for `tenure` iterations. The best tour
//! visited is returned, so the result is never longer than the input.
//!
//! Tours with fewer than five stops (depot included) have too few swaps to
//! search; they fall back to 2-opt with a short pass cap.
//!
//! # Complexity
//!
//! O(iterations · n): each candidate is re-measured in full.
//!
//! # Reference
//!
//! Glover, F. (1989). "Tabu Search, Part I", *ORSA Journal on Computing* 1(3), 190-206.

use std::collections::HashMap;

use rand::Rng;

use super::{tour_length, two_opt_improve, IMPROVEMENT_EPS};
use crate::distance::DistanceMatrix;
use crate::models::TourEnd;

const MIN_TABU_STOPS: usize = 5;
const FALLBACK_PASSES: usize = 10;

/// Result of [`tabu_improve`].
#[derive(Debug, Clone, PartialEq)]
pub struct TabuOutcome {
    /// Best tour found, depot still first.
    pub tour: Vec<usize>,
    /// Its length.
    pub length: f64,
    /// Iterations (or fallback 2-opt passes) performed.
    pub iterations: usize,
    /// Moves accepted into the current tour.
    pub accepted: usize,
    /// `true` only when the 2-opt fallback reached a local optimum.
    pub converged: bool,
}

/// Improves `tour` by tabu search with random swap moves.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use u_shuttle::models::{Point, TourEnd};
/// use u_shuttle::distance::DistanceMatrix;
/// use u_shuttle::local_search::{tabu_improve, tour_length};
///
/// let points: Vec<Point> = (0..8).map(|i| Point::new(i as f64, (i % 2) as f64)).collect();
/// let dm = DistanceMatrix::from_points(&points);
/// let start = vec![0, 5, 2, 7, 1, 6, 3, 4];
///
/// let mut rng = StdRng::seed_from_u64(123);
/// let out = tabu_improve(&start, &dm, TourEnd::Depot, 200, 20, &mut rng);
/// assert!(out.length <= tour_length(&start, &dm, TourEnd::Depot) + 1e-10);
/// assert_eq!(out.tour[0], 0);
/// ```
pub fn tabu_improve<R: Rng>(
    tour: &[usize],
    distances: &DistanceMatrix,
    end: TourEnd,
    iterations: usize,
    tenure: usize,
    rng: &mut R,
) -> TabuOutcome {
    let n = tour.len();
    if n < MIN_TABU_STOPS {
        let out = two_opt_improve(tour, distances, end, FALLBACK_PASSES);
        return TabuOutcome {
            tour: out.tour,
            length: out.length,
            iterations: out.passes,
            accepted: 0,
            converged: out.converged,
        };
    }

    let mut current = tour.to_vec();
    let mut best = current.clone();
    let mut best_len = tour_length(&best, distances, end);
    let mut accepted = 0;
    // Move → first iteration at which it is no longer tabu.
    let mut tabu: HashMap<(usize, usize), usize> = HashMap::new();

    for t in 0..iterations {
        let a = rng.random_range(1..n);
        let b = rng.random_range(1..n);
        if a == b {
            continue;
        }

        let (pa, pb) = (current[a], current[b]);
        let key = (pa.min(pb), pa.max(pb));

        current.swap(a, b);
        let cand_len = tour_length(&current, distances, end);

        let is_tabu = tabu.get(&key).is_some_and(|&until| until > t);
        if !is_tabu || cand_len < best_len - IMPROVEMENT_EPS {
            accepted += 1;
            tabu.insert(key, t + tenure);
            if cand_len < best_len - IMPROVEMENT_EPS {
                best.copy_from_slice(&current);
                best_len = cand_len;
            }
        } else {
            current.swap(a, b);
        }
    }

    TabuOutcome {
        tour: best,
        length: best_len,
        iterations,
        accepted,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ring(n: usize) -> DistanceMatrix {
        let points: Vec<Point> = (0..n)
            .map(|i| {
                let a = i as f64 / n as f64 * std::f64::consts::TAU;
                Point::new(10.0 * a.cos(), 10.0 * a.sin())
            })
            .collect();
        DistanceMatrix::from_points(&points)
    }

    fn scrambled(n: usize) -> Vec<usize> {
        let mut tour: Vec<usize> = (0..n).collect();
        tour[1..].reverse();
        tour.swap(1, n / 2);
        tour
    }

    #[test]
    fn test_tabu_never_worse() {
        let dm = ring(10);
        let start = scrambled(10);
        let start_len = tour_length(&start, &dm, TourEnd::Depot);
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = tabu_improve(&start, &dm, TourEnd::Depot, 200, 20, &mut rng);
            assert!(out.length <= start_len + 1e-10);
            assert!((out.length - tour_length(&out.tour, &dm, TourEnd::Depot)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_tabu_keeps_permutation_and_depot() {
        let dm = ring(9);
        let start = scrambled(9);
        let mut rng = StdRng::seed_from_u64(7);
        let out = tabu_improve(&start, &dm, TourEnd::Open, 100, 5, &mut rng);
        assert_eq!(out.tour[0], start[0]);
        let mut sorted = out.tour.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_tabu_deterministic_per_seed() {
        let dm = ring(12);
        let start = scrambled(12);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            tabu_improve(&start, &dm, TourEnd::Depot, 150, 20, &mut rng)
        };
        assert_eq!(run(123), run(123));
    }

    #[test]
    fn test_tabu_small_tour_falls_back_to_2opt() {
        let dm = ring(4);
        let start = vec![0, 2, 1, 3];
        let mut rng = StdRng::seed_from_u64(1);
        let out = tabu_improve(&start, &dm, TourEnd::Depot, 200, 20, &mut rng);
        let expected = two_opt_improve(&start, &dm, TourEnd::Depot, FALLBACK_PASSES);
        assert_eq!(out.tour, expected.tour);
        assert_eq!(out.accepted, 0);
        assert!(out.converged);
    }

    #[test]
    fn test_tabu_zero_iterations_returns_input() {
        let dm = ring(8);
        let start = scrambled(8);
        let mut rng = StdRng::seed_from_u64(3);
        let out = tabu_improve(&start, &dm, TourEnd::Depot, 0, 20, &mut rng);
        assert_eq!(out.tour, start);
        assert_eq!(out.accepted, 0);
    }
}
