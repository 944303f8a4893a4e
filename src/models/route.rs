//! Route type.

use serde::{Deserialize, Serialize};

use super::Point;

/// How a route's visiting order was refined after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImprovementStats {
    /// Tour length after nearest-neighbor construction.
    pub construction_length: f64,
    /// Improvement passes (2-opt) or iterations (tabu) performed.
    pub passes: usize,
    /// `false` if the pass cap stopped improvement before a local optimum.
    pub converged: bool,
}

/// Where a tour finishes after its last stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TourEnd {
    /// The tour ends at its last stop.
    Open,
    /// The tour drives back to its depot (`tour[0]`).
    #[default]
    Depot,
    /// The tour drives on to a fixed point that is not one of its stops.
    At(usize),
}

impl TourEnd {
    /// `Depot` for a round trip, `Open` otherwise.
    pub fn closed(closed: bool) -> Self {
        if closed {
            Self::Depot
        } else {
            Self::Open
        }
    }

    /// Point reached by the leg after the last stop of `tour`, if any.
    ///
    /// A round trip with a single stop has no closing leg.
    pub fn closing_point(self, tour: &[usize]) -> Option<usize> {
        match self {
            Self::Open => None,
            Self::Depot if tour.len() > 1 => tour.first().copied(),
            Self::Depot => None,
            Self::At(p) if !tour.is_empty() => Some(p),
            Self::At(_) => None,
        }
    }
}

/// An ordered stop sequence for one vehicle.
///
/// `stops[0]` is the depot (the cluster medoid or an external anchor); every
/// other stop is a cluster point visited exactly once. The [`TourEnd`] says
/// where the vehicle goes after the last stop: nowhere, back to the depot, or
/// on to a fixed destination. That closing leg counts toward
/// [`length`](Route::length) and appears in [`legs`](Route::legs) and
/// [`coordinates`](Route::coordinates). Routes are never edited after
/// construction: re-optimizing means building a new one.
///
/// # Examples
///
/// ```
/// use u_shuttle::models::Route;
///
/// let route = Route::new(0, vec![4, 1, 2], true, 12.0);
/// assert_eq!(route.depot(), Some(4));
/// assert_eq!(route.len(), 3);
/// assert_eq!(route.num_pickups(), 2);
/// assert_eq!(route.legs(), vec![(4, 1), (1, 2), (2, 4)]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    vehicle_id: usize,
    stops: Vec<usize>,
    end: TourEnd,
    length: f64,
    depot_is_request: bool,
    improvement: Option<ImprovementStats>,
}

impl Route {
    /// Creates an open or round-trip route from its full stop sequence
    /// (depot first).
    pub fn new(vehicle_id: usize, stops: Vec<usize>, closed: bool, length: f64) -> Self {
        Self {
            vehicle_id,
            stops,
            end: TourEnd::closed(closed),
            length,
            depot_is_request: false,
            improvement: None,
        }
    }

    /// An empty route (no depot, no stops).
    pub fn empty(vehicle_id: usize) -> Self {
        Self::new(vehicle_id, Vec::new(), false, 0.0)
    }

    /// Sets where the route ends after its last stop.
    pub fn with_end(mut self, end: TourEnd) -> Self {
        self.end = end;
        self
    }

    /// Marks the depot as a request point (a medoid that carries demand).
    pub fn with_depot_request(mut self, depot_is_request: bool) -> Self {
        self.depot_is_request = depot_is_request;
        self
    }

    /// Attaches improvement statistics.
    pub fn with_improvement(mut self, stats: ImprovementStats) -> Self {
        self.improvement = Some(stats);
        self
    }

    /// Vehicle serving this route.
    pub fn vehicle_id(&self) -> usize {
        self.vehicle_id
    }

    /// Depot point index, `None` for an empty route.
    pub fn depot(&self) -> Option<usize> {
        self.stops.first().copied()
    }

    /// Full stop sequence, depot first.
    pub fn stops(&self) -> &[usize] {
        &self.stops
    }

    /// Number of stops including the depot.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Returns `true` if the route has no stops at all.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Number of stops after the depot.
    pub fn num_pickups(&self) -> usize {
        self.stops.len().saturating_sub(1)
    }

    /// Returns `true` if the depot itself is a request point.
    pub fn depot_is_request(&self) -> bool {
        self.depot_is_request
    }

    /// Returns `true` if the route returns to its depot.
    pub fn is_closed(&self) -> bool {
        self.end == TourEnd::Depot
    }

    /// Where the route ends after its last stop.
    pub fn end(&self) -> TourEnd {
        self.end
    }

    /// Point reached by the closing leg, if the route has one.
    pub fn closing_point(&self) -> Option<usize> {
        self.end.closing_point(&self.stops)
    }

    /// Total tour length by the matrix it was built on.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Improvement statistics, if an improvement stage ran.
    pub fn improvement(&self) -> Option<&ImprovementStats> {
        self.improvement.as_ref()
    }

    /// Consecutive `(from, to)` legs, including the closing leg.
    pub fn legs(&self) -> Vec<(usize, usize)> {
        let mut legs: Vec<(usize, usize)> = self.stops.windows(2).map(|w| (w[0], w[1])).collect();
        if let (Some(&last), Some(end)) = (self.stops.last(), self.closing_point()) {
            legs.push((last, end));
        }
        legs
    }

    /// Coordinates of the driven path: every stop in visit order, then the
    /// closing point.
    pub fn coordinates(&self, points: &[Point]) -> Vec<Point> {
        let mut coords: Vec<Point> = self.stops.iter().map(|&i| points[i]).collect();
        if let Some(end) = self.closing_point() {
            coords.push(points[end]);
        }
        coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_empty() {
        let r = Route::empty(3);
        assert!(r.is_empty());
        assert_eq!(r.depot(), None);
        assert_eq!(r.num_pickups(), 0);
        assert!(r.legs().is_empty());
        assert_eq!(r.vehicle_id(), 3);
    }

    #[test]
    fn test_single_stop_has_no_legs() {
        let r = Route::new(0, vec![5], true, 0.0);
        assert_eq!(r.len(), 1);
        assert_eq!(r.num_pickups(), 0);
        assert!(r.legs().is_empty());
    }

    #[test]
    fn test_open_route_legs() {
        let r = Route::new(0, vec![0, 2, 1], false, 3.0);
        assert_eq!(r.legs(), vec![(0, 2), (2, 1)]);
        assert!(!r.is_closed());
    }

    #[test]
    fn test_coordinates_closed() {
        let points = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let r = Route::new(0, vec![0, 1], true, 2.0);
        let coords = r.coordinates(&points);
        assert_eq!(coords.len(), 3);
        assert_eq!(coords[2], points[0]);
    }

    #[test]
    fn test_fixed_end_adds_closing_leg() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(10.0, 0.0),
        ];
        let r = Route::new(0, vec![0, 1], false, 10.0).with_end(TourEnd::At(2));
        assert_eq!(r.end(), TourEnd::At(2));
        assert!(!r.is_closed());
        assert_eq!(r.legs(), vec![(0, 1), (1, 2)]);
        assert_eq!(r.coordinates(&points).last(), Some(&points[2]));

        let single = Route::new(0, vec![1], false, 9.0).with_end(TourEnd::At(2));
        assert_eq!(single.legs(), vec![(1, 2)]);
        assert_eq!(single.closing_point(), Some(2));
    }

    #[test]
    fn test_closing_point_by_end() {
        assert_eq!(TourEnd::Open.closing_point(&[3, 4]), None);
        assert_eq!(TourEnd::Depot.closing_point(&[3, 4]), Some(3));
        assert_eq!(TourEnd::Depot.closing_point(&[3]), None);
        assert_eq!(TourEnd::At(9).closing_point(&[3]), Some(9));
        assert_eq!(TourEnd::At(9).closing_point(&[]), None);
        assert_eq!(TourEnd::closed(true), TourEnd::Depot);
    }

    #[test]
    fn test_builder_flags() {
        let stats = ImprovementStats {
            construction_length: 10.0,
            passes: 2,
            converged: true,
        };
        let r = Route::new(1, vec![0, 1], true, 8.0)
            .with_depot_request(true)
            .with_improvement(stats);
        assert!(r.depot_is_request());
        assert_eq!(r.improvement(), Some(&stats));
    }
}
