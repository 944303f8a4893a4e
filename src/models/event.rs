//! Simulated stop events and per-route timelines.

use serde::{Deserialize, Serialize};

/// Role of a stop within a simulated route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopKind {
    /// The depot where the vehicle starts.
    Origin,
    /// A pickup at a request point.
    Pickup,
    /// Closing arrival back at the depot.
    Return,
    /// Closing arrival at an external destination (e.g. a care centre).
    Destination,
}

impl StopKind {
    /// Returns `true` for the closing arrival kinds.
    pub fn is_arrival(&self) -> bool {
        matches!(self, Self::Return | Self::Destination)
    }
}

/// Scheduled and simulated time at one stop, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopEvent {
    /// Vehicle serving the route.
    pub vehicle_id: usize,
    /// Position in the simulated stop sequence (0 = origin).
    pub stop_seq: usize,
    /// Point index of the stop.
    pub point: usize,
    /// Role of this stop.
    pub kind: StopKind,
    /// `true` if a request is picked up here.
    pub serves_request: bool,
    /// Promised time.
    pub scheduled: f64,
    /// Simulated arrival time.
    pub actual: f64,
}

impl StopEvent {
    /// Signed lateness: `actual - scheduled` (negative = early).
    pub fn lateness(&self) -> f64 {
        self.actual - self.scheduled
    }
}

/// Events of one simulated route, in visit order.
///
/// # Examples
///
/// ```
/// use u_shuttle::models::{RouteTimeline, StopEvent, StopKind};
///
/// let ev = |seq, kind, serves, actual| StopEvent {
///     vehicle_id: 0, stop_seq: seq, point: seq, kind,
///     serves_request: serves, scheduled: 0.0, actual,
/// };
/// let timeline = RouteTimeline::new(0, vec![
///     ev(0, StopKind::Origin, false, 0.0),
///     ev(1, StopKind::Pickup, true, 4.0),
///     ev(2, StopKind::Return, false, 10.0),
/// ]);
/// assert_eq!(timeline.duration(), 10.0);
/// assert_eq!(timeline.ride_times(), vec![6.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTimeline {
    vehicle_id: usize,
    events: Vec<StopEvent>,
}

impl RouteTimeline {
    /// Wraps recorded events.
    pub fn new(vehicle_id: usize, events: Vec<StopEvent>) -> Self {
        Self { vehicle_id, events }
    }

    /// Vehicle serving the route.
    pub fn vehicle_id(&self) -> usize {
        self.vehicle_id
    }

    /// All events in visit order.
    pub fn events(&self) -> &[StopEvent] {
        &self.events
    }

    /// Returns `true` if nothing was simulated.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Actual departure time (0 when empty).
    pub fn start(&self) -> f64 {
        self.events.first().map_or(0.0, |e| e.actual)
    }

    /// Actual time of the final event (0 when empty).
    pub fn end(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.actual)
    }

    /// Actual route duration.
    pub fn duration(&self) -> f64 {
        self.end() - self.start()
    }

    /// Events that serve a request.
    pub fn request_events(&self) -> impl Iterator<Item = &StopEvent> {
        self.events.iter().filter(|e| e.serves_request)
    }

    /// The closing arrival event, if the route has one.
    pub fn arrival(&self) -> Option<&StopEvent> {
        self.events.last().filter(|e| e.kind.is_arrival())
    }

    /// On-board time per request: final arrival minus pickup time.
    pub fn ride_times(&self) -> Vec<f64> {
        let end = self.end();
        self.request_events().map(|e| end - e.actual).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(seq: usize, kind: StopKind, serves: bool, scheduled: f64, actual: f64) -> StopEvent {
        StopEvent {
            vehicle_id: 2,
            stop_seq: seq,
            point: seq,
            kind,
            serves_request: serves,
            scheduled,
            actual,
        }
    }

    #[test]
    fn test_lateness_sign() {
        assert_eq!(event(0, StopKind::Pickup, true, 10.0, 12.5).lateness(), 2.5);
        assert_eq!(event(0, StopKind::Pickup, true, 10.0, 8.0).lateness(), -2.0);
    }

    #[test]
    fn test_empty_timeline() {
        let t = RouteTimeline::new(0, Vec::new());
        assert!(t.is_empty());
        assert_eq!(t.duration(), 0.0);
        assert!(t.arrival().is_none());
        assert!(t.ride_times().is_empty());
    }

    #[test]
    fn test_ride_times_without_arrival() {
        let t = RouteTimeline::new(
            2,
            vec![
                event(0, StopKind::Origin, true, 0.0, 0.0),
                event(1, StopKind::Pickup, true, 3.0, 3.0),
                event(2, StopKind::Pickup, true, 5.0, 7.0),
            ],
        );
        assert!(t.arrival().is_none());
        assert_eq!(t.ride_times(), vec![7.0, 4.0, 0.0]);
        assert_eq!(t.request_events().count(), 3);
    }

    #[test]
    fn test_arrival_kinds() {
        assert!(StopKind::Return.is_arrival());
        assert!(StopKind::Destination.is_arrival());
        assert!(!StopKind::Pickup.is_arrival());
    }
}
