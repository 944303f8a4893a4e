//! Stop-by-stop route simulation.
//!
//! [`TimeSimulator`] walks a [`Route`] as a small state machine:
//!
//! ```text
//! NotStarted ──▶ AtStop(0) ──▶ AtStop(1) ──▶ … ──▶ AtStop(last) ──▶ Completed
//! ```
//!
//! Each transition draws one leg from the [`LegSampler`] and yields a
//! [`StopEvent`]. The stop plan is the route's stops, followed by the route's
//! closing point if it has one: a `Destination` event for a fixed end, a
//! `Return` event for a round trip.
//!
//! Promised times come from a [`Schedule`] evaluated on mean leg times. The
//! vehicle departs exactly at the scheduled start; lateness accumulates from
//! the noise on each leg. A depot that is itself a request can carry its own
//! promise under [`Schedule::PerStop`]; departure still happens at `start`,
//! so that request is late by `start - promise`.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{LegSampler, TimeModel};
use crate::distance::DistanceMatrix;
use crate::error::Result;
use crate::models::{Route, RouteTimeline, StopEvent, StopKind, TourEnd};

/// How promised stop times are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Schedule {
    /// Depart at the given minute; promises follow the mean leg times.
    DepartAt(f64),
    /// Back-schedule from the given arrival minute at the final stop.
    ArriveBy(f64),
    /// Depart at `start`; stops listed in `promised` (by point index) use
    /// that minute, all others follow the mean leg times. An entry for the
    /// depot applies only when the depot is itself a request.
    PerStop {
        /// Departure minute.
        start: f64,
        /// Promised minute per point index.
        promised: BTreeMap<usize, f64>,
    },
}

impl Default for Schedule {
    fn default() -> Self {
        Self::DepartAt(0.0)
    }
}

/// Progress of a [`TimeSimulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    /// No event emitted yet.
    NotStarted,
    /// The event for plan position `i` was the last one emitted.
    AtStop(usize),
    /// Every stop has been emitted.
    Completed,
}

#[derive(Debug, Clone, Copy)]
struct PlannedStop {
    point: usize,
    kind: StopKind,
    serves_request: bool,
    scheduled: f64,
}

/// Iterator over the simulated [`StopEvent`]s of one route.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use u_shuttle::distance::DistanceMatrix;
/// use u_shuttle::models::{Point, Route, StopKind};
/// use u_shuttle::simulation::{Noise, Schedule, TimeModel, TimeSimulator};
///
/// let dm = DistanceMatrix::from_points(&[Point::new(0.0, 0.0), Point::new(3.0, 0.0)]);
/// let route = Route::new(0, vec![0, 1], true, 6.0);
/// let model = TimeModel::default().with_noise(Noise::None);
/// let mut rng = StdRng::seed_from_u64(1);
///
/// let events: Vec<_> = TimeSimulator::new(&route, &dm, &model, &Schedule::DepartAt(0.0), &mut rng)
///     .unwrap()
///     .collect();
/// assert_eq!(events.len(), 3);
/// assert_eq!(events[2].kind, StopKind::Return);
/// assert!((events[2].actual - 25.0).abs() < 1e-10);
/// ```
pub struct TimeSimulator<'a, R: Rng> {
    vehicle_id: usize,
    plan: Vec<PlannedStop>,
    distances: &'a DistanceMatrix,
    sampler: LegSampler,
    rng: &'a mut R,
    state: SimState,
    departure: f64,
    clock: f64,
}

impl<'a, R: Rng> TimeSimulator<'a, R> {
    /// Prepares the stop plan and promised times.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::DimensionMismatch`](crate::RoutingError::DimensionMismatch)
    ///   if a stop or the closing point is outside the matrix
    /// - [`RoutingError::InvalidInput`](crate::RoutingError::InvalidInput)
    ///   if the time model is invalid
    pub fn new(
        route: &Route,
        distances: &'a DistanceMatrix,
        model: &TimeModel,
        schedule: &Schedule,
        rng: &'a mut R,
    ) -> Result<Self> {
        distances.check_indices(route.stops())?;
        if let Some(end) = route.closing_point() {
            distances.check_indices(&[end])?;
        }
        let sampler = model.sampler()?;
        let (plan, departure) = plan_stops(route, distances, model, schedule);

        Ok(Self {
            vehicle_id: route.vehicle_id(),
            plan,
            distances,
            sampler,
            rng,
            state: SimState::NotStarted,
            departure,
            clock: 0.0,
        })
    }

    /// Current state.
    pub fn state(&self) -> SimState {
        self.state
    }

    /// Simulated clock after the last emitted event.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Number of events this simulator emits in total.
    pub fn num_stops(&self) -> usize {
        self.plan.len()
    }

    fn event(&self, seq: usize) -> StopEvent {
        let stop = &self.plan[seq];
        StopEvent {
            vehicle_id: self.vehicle_id,
            stop_seq: seq,
            point: stop.point,
            kind: stop.kind,
            serves_request: stop.serves_request,
            scheduled: stop.scheduled,
            actual: self.clock,
        }
    }
}

impl<R: Rng> Iterator for TimeSimulator<'_, R> {
    type Item = StopEvent;

    fn next(&mut self) -> Option<StopEvent> {
        let seq = match self.state {
            SimState::Completed => return None,
            SimState::NotStarted => {
                if self.plan.is_empty() {
                    self.state = SimState::Completed;
                    return None;
                }
                self.clock = self.departure;
                0
            }
            SimState::AtStop(i) => {
                let next = i + 1;
                if next >= self.plan.len() {
                    self.state = SimState::Completed;
                    return None;
                }
                let d = self.distances.get(self.plan[i].point, self.plan[next].point);
                self.clock += self.sampler.sample_leg(d, &mut *self.rng);
                next
            }
        };
        self.state = SimState::AtStop(seq);
        Some(self.event(seq))
    }
}

/// Stop sequence with promised times, and the departure minute.
fn plan_stops(
    route: &Route,
    distances: &DistanceMatrix,
    model: &TimeModel,
    schedule: &Schedule,
) -> (Vec<PlannedStop>, f64) {
    let stops = route.stops();
    let Some(&depot) = stops.first() else {
        return (Vec::new(), 0.0);
    };

    let mut plan: Vec<(usize, StopKind, bool)> = Vec::with_capacity(stops.len() + 1);
    plan.push((depot, StopKind::Origin, route.depot_is_request()));
    plan.extend(stops[1..].iter().map(|&p| (p, StopKind::Pickup, true)));
    match (route.end(), route.closing_point()) {
        (TourEnd::At(_), Some(end)) => plan.push((end, StopKind::Destination, false)),
        (_, Some(end)) => plan.push((end, StopKind::Return, false)),
        (_, None) => {}
    }

    // Offsets from departure along mean legs.
    let mut offsets = Vec::with_capacity(plan.len());
    let mut t = 0.0;
    offsets.push(t);
    for w in plan.windows(2) {
        t += model.mean_leg(distances.get(w[0].0, w[1].0));
        offsets.push(t);
    }

    let start = match schedule {
        Schedule::DepartAt(start) | Schedule::PerStop { start, .. } => *start,
        Schedule::ArriveBy(arrival) => arrival - t,
    };

    let plan = plan
        .into_iter()
        .zip(offsets)
        .map(|((point, kind, serves_request), offset)| {
            let nominal = start + offset;
            let promise = match (schedule, kind) {
                (Schedule::PerStop { promised, .. }, StopKind::Pickup | StopKind::Destination) => {
                    promised.get(&point).copied()
                }
                (Schedule::PerStop { promised, .. }, StopKind::Origin) if serves_request => {
                    promised.get(&point).copied()
                }
                _ => None,
            };
            PlannedStop {
                point,
                kind,
                serves_request,
                scheduled: promise.unwrap_or(nominal),
            }
        })
        .collect();
    (plan, start)
}

/// Simulates a whole route with the caller's RNG.
///
/// Identical RNG state, route, and model give bit-identical events.
pub fn simulate_route<R: Rng>(
    route: &Route,
    distances: &DistanceMatrix,
    model: &TimeModel,
    schedule: &Schedule,
    rng: &mut R,
) -> Result<RouteTimeline> {
    let events = TimeSimulator::new(route, distances, model, schedule, rng)?.collect();
    Ok(RouteTimeline::new(route.vehicle_id(), events))
}

/// Simulates a route with an RNG seeded from `seed + vehicle_id`.
///
/// Each vehicle owns its random stream, so routes can be simulated in any
/// order or in parallel with identical results.
pub fn simulate_seeded(
    route: &Route,
    distances: &DistanceMatrix,
    model: &TimeModel,
    schedule: &Schedule,
    seed: u64,
) -> Result<RouteTimeline> {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(route.vehicle_id() as u64));
    simulate_route(route, distances, model, schedule, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;
    use crate::simulation::Noise;

    // 0 = depot, 1 and 2 on a line, 3 = external destination.
    fn setup() -> DistanceMatrix {
        DistanceMatrix::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(6.0, 0.0),
            Point::new(6.0, 3.0),
        ])
    }

    fn exact() -> TimeModel {
        TimeModel::default().with_noise(Noise::None)
    }

    #[test]
    fn test_noise_free_times() {
        let dm = setup();
        let route = Route::new(0, vec![0, 1, 2], true, 12.0);
        let mut rng = StdRng::seed_from_u64(0);
        let t = simulate_route(&route, &dm, &exact(), &Schedule::DepartAt(10.0), &mut rng)
            .expect("valid");

        let actual: Vec<f64> = t.events().iter().map(|e| e.actual).collect();
        // 3 units = 12.5 min; return leg 6 units = 25 min.
        let expected = [10.0, 22.5, 35.0, 60.0];
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-10);
        }
        assert!(t.events().iter().all(|e| e.lateness().abs() < 1e-10));
        assert_eq!(t.events()[3].kind, StopKind::Return);
        assert_eq!(t.events()[3].point, 0);
        assert!(!t.events()[0].serves_request);
    }

    #[test]
    fn test_arrive_by_back_schedules() {
        let dm = setup();
        let route = Route::new(0, vec![0, 1, 2], false, 6.0).with_end(TourEnd::At(3));
        let mut rng = StdRng::seed_from_u64(0);
        let t = simulate_route(&route, &dm, &exact(), &Schedule::ArriveBy(100.0), &mut rng)
            .expect("valid");

        let events = t.events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[3].kind, StopKind::Destination);
        assert!((events[3].scheduled - 100.0).abs() < 1e-10);
        // 12.5 + 12.5 + 12.5 minutes of mean travel before the destination.
        assert!((events[0].scheduled - 62.5).abs() < 1e-10);
        assert_eq!(events[0].actual, events[0].scheduled);
        assert!((t.duration() - 37.5).abs() < 1e-10);
    }

    #[test]
    fn test_per_stop_promises() {
        let dm = setup();
        let route = Route::new(0, vec![0, 1, 2], false, 6.0);
        let promised = BTreeMap::from([(1, 20.0), (0, 999.0)]);
        let schedule = Schedule::PerStop {
            start: 5.0,
            promised,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let t = simulate_route(&route, &dm, &exact(), &schedule, &mut rng).expect("valid");

        let events = t.events();
        assert_eq!(events[0].scheduled, 5.0);
        assert_eq!(events[1].scheduled, 20.0);
        assert!((events[1].lateness() - (-2.5)).abs() < 1e-10);
        assert!((events[2].scheduled - 30.0).abs() < 1e-10);
    }

    #[test]
    fn test_request_at_depot_uses_its_promise() {
        let dm = setup();
        let promised = BTreeMap::from([(0, -30.0), (1, 20.0)]);
        let schedule = Schedule::PerStop { start: 0.0, promised };

        let route = Route::new(0, vec![0], true, 0.0).with_depot_request(true);
        let mut rng = StdRng::seed_from_u64(0);
        let t = simulate_route(&route, &dm, &exact(), &schedule, &mut rng).expect("valid");
        let origin = &t.events()[0];
        assert_eq!(origin.scheduled, -30.0);
        assert_eq!(origin.actual, 0.0);
        assert!((origin.lateness() - 30.0).abs() < 1e-10);

        // The vehicle still departs at `start`, so later stops are unaffected.
        let route = Route::new(0, vec![0, 1], false, 3.0).with_depot_request(true);
        let mut rng = StdRng::seed_from_u64(0);
        let t = simulate_route(&route, &dm, &exact(), &schedule, &mut rng).expect("valid");
        assert_eq!(t.events()[0].scheduled, -30.0);
        assert!((t.events()[1].actual - 12.5).abs() < 1e-10);
    }

    #[test]
    fn test_destination_event_follows_route_end() {
        let dm = setup();
        let route = Route::new(0, vec![0, 1], false, 6.0).with_end(TourEnd::At(3));
        let mut rng = StdRng::seed_from_u64(0);
        let t = simulate_route(&route, &dm, &exact(), &Schedule::DepartAt(0.0), &mut rng).expect("valid");

        let visited: Vec<usize> = t.events().iter().map(|e| e.point).collect();
        let path: Vec<usize> = route.stops().iter().copied().chain(route.closing_point()).collect();
        assert_eq!(visited, path);
        assert_eq!(t.arrival().map(|e| e.kind), Some(StopKind::Destination));
    }

    #[test]
    fn test_state_machine_progression() {
        let dm = setup();
        let route = Route::new(0, vec![0, 1], true, 6.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut sim = TimeSimulator::new(&route, &dm, &exact(), &Schedule::default(), &mut rng)
            .expect("valid");

        assert_eq!(sim.state(), SimState::NotStarted);
        assert_eq!(sim.num_stops(), 3);
        assert!(sim.next().is_some());
        assert_eq!(sim.state(), SimState::AtStop(0));
        assert!(sim.next().is_some());
        assert!(sim.next().is_some());
        assert_eq!(sim.state(), SimState::AtStop(2));
        assert!(sim.next().is_none());
        assert_eq!(sim.state(), SimState::Completed);
        assert!(sim.next().is_none());
        assert!((sim.clock() - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_seeded_is_bit_identical() {
        let dm = setup();
        let route = Route::new(4, vec![0, 2, 1], false, 12.0).with_end(TourEnd::At(3));
        let model = TimeModel::default();
        let a = simulate_seeded(&route, &dm, &model, &Schedule::ArriveBy(90.0), 123).expect("valid");
        let b = simulate_seeded(&route, &dm, &model, &Schedule::ArriveBy(90.0), 123).expect("valid");
        assert_eq!(a, b);

        let mut rng = StdRng::seed_from_u64(127);
        let c = simulate_route(&route, &dm, &model, &Schedule::ArriveBy(90.0), &mut rng).expect("valid");
        assert_eq!(a, c);
    }

    #[test]
    fn test_noise_changes_actual_not_scheduled() {
        let dm = setup();
        let route = Route::new(0, vec![0, 1, 2], true, 12.0);
        let mut rng = StdRng::seed_from_u64(7);
        let noisy = simulate_route(&route, &dm, &TimeModel::default(), &Schedule::DepartAt(0.0), &mut rng)
            .expect("valid");
        let mut rng = StdRng::seed_from_u64(7);
        let clean = simulate_route(&route, &dm, &exact(), &Schedule::DepartAt(0.0), &mut rng).expect("valid");

        for (n, c) in noisy.events().iter().zip(clean.events()) {
            assert_eq!(n.scheduled, c.scheduled);
        }
        assert_eq!(noisy.events()[0].actual, 0.0);
        assert_ne!(noisy.events()[1].actual, clean.events()[1].actual);
    }

    #[test]
    fn test_single_stop_and_empty_routes() {
        let dm = setup();
        let mut rng = StdRng::seed_from_u64(0);
        let single = Route::new(0, vec![2], true, 0.0).with_depot_request(true);
        let t = simulate_route(&single, &dm, &TimeModel::default(), &Schedule::DepartAt(8.0), &mut rng)
            .expect("valid");
        assert_eq!(t.events().len(), 1);
        assert!(t.events()[0].serves_request);
        assert_eq!(t.duration(), 0.0);

        let t = simulate_route(&Route::empty(1), &dm, &TimeModel::default(), &Schedule::default(), &mut rng)
            .expect("valid");
        assert!(t.is_empty());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let dm = setup();
        let mut rng = StdRng::seed_from_u64(0);
        let route = Route::new(0, vec![0, 9], true, 0.0);
        assert!(simulate_route(&route, &dm, &exact(), &Schedule::default(), &mut rng).is_err());
        let route = Route::new(0, vec![0, 1], false, 0.0).with_end(TourEnd::At(4));
        assert!(simulate_route(&route, &dm, &exact(), &Schedule::default(), &mut rng).is_err());
    }
}
