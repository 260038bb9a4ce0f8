//! # Progress Tracker
//!
//! Tracks where the traveler is along the active [`Route`]: the current step
//! index, distance covered within that step, the travel bearing and the
//! deviation from the step polyline.
//!
//! Each position update runs three checks in order:
//!
//! 1. **Arrival**: distance to the destination below the arrival threshold.
//! 2. **Projection**: nearest vertex of the current step gives deviation,
//!    bearing and distance along the step (clamped to the step length).
//! 3. **Step completion**: when less than the completion threshold remains in
//!    the step and it is not the last one, the next step becomes current.
//!
//! The tracker is a no-op on a route without steps and after arrival.

use log::{debug, info};

use crate::geo_utils;
use crate::route::Route;
use crate::GpsPoint;

/// Progress along the active route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressState {
    /// Flat index of the current step (0 ≤ index < step count)
    pub current_step_index: usize,
    /// Meters covered within the current step (0 ≤ d ≤ step distance)
    pub distance_along_step: f64,
    /// Bearing of the route segment nearest to the traveler
    pub bearing: f64,
    /// Deviation from the current step computed by the latest update
    pub last_deviation: Option<f64>,
    pub has_arrived: bool,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            current_step_index: 0,
            distance_along_step: 0.0,
            bearing: 0.0,
            last_deviation: None,
            has_arrived: false,
        }
    }
}

/// Outcome of feeding one position to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressUpdate {
    /// Nothing to track (no steps, or already arrived).
    Inactive,
    /// The traveler is within the arrival threshold for the first time.
    Arrived,
    /// Position projected onto the current step; `deviation` is the
    /// distance from it in meters.
    Tracked { deviation: f64 },
}

/// Distance and time left on the route.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Remaining {
    /// Meters
    pub distance: f64,
    /// Seconds
    pub duration: f64,
}

/// Step-by-step progress state machine.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    arrival_threshold_m: f64,
    step_completion_threshold_m: f64,
    state: ProgressState,
}

impl ProgressTracker {
    pub fn new(arrival_threshold_m: f64, step_completion_threshold_m: f64) -> Self {
        Self {
            arrival_threshold_m,
            step_completion_threshold_m,
            state: ProgressState::default(),
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Back to the first step. Used on every route swap.
    pub fn reset(&mut self) {
        self.state = ProgressState::default();
    }

    /// Apply one position update.
    pub fn update(&mut self, route: &Route, destination: &GpsPoint, position: &GpsPoint) -> ProgressUpdate {
        if self.state.has_arrived {
            return ProgressUpdate::Inactive;
        }

        let distance_to_destination = geo_utils::haversine_distance(position, destination);
        if distance_to_destination < self.arrival_threshold_m {
            info!("[Progress] Arrived at destination ({:.1}m away)", distance_to_destination);
            self.state.has_arrived = true;
            return ProgressUpdate::Arrived;
        }

        let step_count = route.step_count();
        let Some(step) = route.step(self.state.current_step_index) else {
            return ProgressUpdate::Inactive;
        };

        let projection = geo_utils::nearest_point_on_step(position, step.geometry());
        let distance_along = projection.distance_along.clamp(0.0, step.distance());

        self.state.distance_along_step = distance_along;
        self.state.bearing = projection.bearing;
        self.state.last_deviation = Some(projection.distance);

        debug!(
            "[Progress] step {}/{} along={:.1}m deviation={:.1}m bearing={:.0}",
            self.state.current_step_index + 1,
            step_count,
            distance_along,
            projection.distance,
            projection.bearing
        );

        let remaining_in_step = step.distance() - distance_along;
        let is_last_step = self.state.current_step_index + 1 >= step_count;
        if remaining_in_step < self.step_completion_threshold_m && !is_last_step {
            info!(
                "[Progress] Step {}/{} completed",
                self.state.current_step_index + 1,
                step_count
            );
            self.state.current_step_index += 1;
            self.state.distance_along_step = 0.0;
        }

        ProgressUpdate::Tracked {
            deviation: projection.distance,
        }
    }

    /// Remaining distance and duration: the uncovered part of the current
    /// step plus every later step. Step duration is prorated by distance.
    pub fn remaining(&self, route: &Route) -> Remaining {
        let mut remaining = Remaining::default();
        for (i, step) in route.steps().enumerate().skip(self.state.current_step_index) {
            if i == self.state.current_step_index {
                let left = (step.distance() - self.state.distance_along_step).max(0.0);
                remaining.distance += left;
                remaining.duration += if step.distance() > 0.0 {
                    step.duration() * left / step.distance()
                } else {
                    step.duration()
                };
            } else {
                remaining.distance += step.distance();
                remaining.duration += step.duration();
            }
        }
        remaining
    }

    /// Meters until the end of the current step, where the next maneuver happens.
    pub fn distance_to_next_maneuver(&self, route: &Route) -> f64 {
        route
            .step(self.state.current_step_index)
            .map(|s| (s.distance() - self.state.distance_along_step).max(0.0))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Maneuver, Step};

    // 0.0001 degrees of latitude is ~11.1 m
    const VERTEX_SPACING_DEG: f64 = 0.0001;

    fn straight_step(start_lat: f64, vertices: usize, instruction: &str) -> Step {
        let geometry: Vec<GpsPoint> = (0..vertices)
            .map(|i| GpsPoint::new(start_lat + i as f64 * VERTEX_SPACING_DEG, 55.27))
            .collect();
        Step::from_geometry(geometry, 60.0, Maneuver::new("turn", instruction))
    }

    fn two_step_route() -> Route {
        let first = straight_step(25.2, 10, "Head north");
        let second = straight_step(25.2009, 10, "Continue");
        Route::from_steps(vec![first, second]).unwrap()
    }

    fn tracker() -> ProgressTracker {
        ProgressTracker::new(20.0, 15.0)
    }

    #[test]
    fn test_tracks_distance_along_step() {
        let route = two_step_route();
        let destination = route.end_point().unwrap();
        let mut t = tracker();

        let update = t.update(&route, &destination, &GpsPoint::new(25.2003, 55.27));
        match update {
            ProgressUpdate::Tracked { deviation } => assert!(deviation < 1.0),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(t.state().current_step_index, 0);
        assert!((t.state().distance_along_step - 33.4).abs() < 1.0);
        assert!(t.state().bearing < 0.5 || t.state().bearing > 359.5);
    }

    #[test]
    fn test_advances_when_step_nearly_complete() {
        let route = two_step_route();
        let destination = route.end_point().unwrap();
        let mut t = tracker();

        // Last vertex of the first step: 0 m remaining
        let update = t.update(&route, &destination, &GpsPoint::new(25.2009, 55.27));
        assert!(matches!(update, ProgressUpdate::Tracked { .. }));
        assert_eq!(t.state().current_step_index, 1);
        assert_eq!(t.state().distance_along_step, 0.0);
    }

    #[test]
    fn test_last_step_never_advances() {
        let route = Route::from_steps(vec![straight_step(25.2, 10, "Only")]).unwrap();
        // Destination far away so arrival does not trigger
        let destination = GpsPoint::new(26.0, 55.27);
        let mut t = tracker();

        let update = t.update(&route, &destination, &GpsPoint::new(25.2009, 55.27));
        assert!(matches!(update, ProgressUpdate::Tracked { .. }));
        assert_eq!(t.state().current_step_index, 0);
    }

    #[test]
    fn test_distance_along_is_clamped_to_step_distance() {
        // Provider distance shorter than the polyline
        let geometry: Vec<GpsPoint> = (0..10)
            .map(|i| GpsPoint::new(25.2 + i as f64 * VERTEX_SPACING_DEG, 55.27))
            .collect();
        let route = Route::from_steps(vec![Step::new(geometry, 50.0, 10.0, Maneuver::new("depart", "Go"))]).unwrap();
        let mut t = tracker();

        t.update(&route, &GpsPoint::new(26.0, 55.27), &GpsPoint::new(25.2009, 55.27));
        assert_eq!(t.state().distance_along_step, 50.0);
    }

    #[test]
    fn test_arrival_fires_once() {
        let route = two_step_route();
        let destination = route.end_point().unwrap();
        let mut t = tracker();

        let update = t.update(&route, &destination, &destination);
        assert_eq!(update, ProgressUpdate::Arrived);
        assert!(t.state().has_arrived);
        assert_eq!(t.update(&route, &destination, &destination), ProgressUpdate::Inactive);
    }

    #[test]
    fn test_reports_deviation() {
        let route = two_step_route();
        let destination = route.end_point().unwrap();
        let mut t = tracker();

        // ~50 m east of the route
        let off = GpsPoint::new(25.2003, 55.27 + crate::geo_utils::meters_to_degrees(50.0, 25.2003));
        match t.update(&route, &destination, &off) {
            ProgressUpdate::Tracked { deviation, .. } => assert!((deviation - 50.0).abs() < 2.0),
            other => panic!("unexpected {:?}", other),
        }
        assert!(t.state().last_deviation.unwrap() > 25.0);
    }

    #[test]
    fn test_remaining_prorates_current_step() {
        let route = two_step_route();
        let destination = route.end_point().unwrap();
        let mut t = tracker();

        let total = route.distance();
        let before = t.remaining(&route);
        assert!((before.distance - total).abs() < 1e-6);
        assert!((before.duration - 120.0).abs() < 1e-6);

        t.update(&route, &destination, &GpsPoint::new(25.2003, 55.27));
        let after = t.remaining(&route);
        let step_len = route.step(0).unwrap().distance();
        let along = t.state().distance_along_step;
        assert!((after.distance - (total - along)).abs() < 1e-6);
        assert!((after.duration - (60.0 * (step_len - along) / step_len + 60.0)).abs() < 1e-6);
        assert!((t.distance_to_next_maneuver(&route) - (step_len - along)).abs() < 1e-6);
    }

    #[test]
    fn test_reset_returns_to_first_step() {
        let route = two_step_route();
        let destination = route.end_point().unwrap();
        let mut t = tracker();
        t.update(&route, &destination, &GpsPoint::new(25.2009, 55.27));
        assert_eq!(t.state().current_step_index, 1);

        t.reset();
        assert_eq!(*t.state(), ProgressState::default());
    }
}
