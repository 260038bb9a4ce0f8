//! Off-route detection with debounced reroute gating.
//!
//! The detector is edge-triggered: `is_off_route` flips to true when a
//! deviation above the threshold is observed and back to false when a later
//! deviation is within it. Each flip is logged once.
//!
//! Reroute requests are gated by two guards: at most one request in flight
//! (`is_rerouting`), and at most one automatic request per debounce window.

use log::{info, warn};

/// Off-route flags owned by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OffRouteState {
    pub is_off_route: bool,
    pub is_rerouting: bool,
    /// When the last reroute request was issued (ms)
    pub last_reroute_at_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct OffRouteDetector {
    threshold_m: f64,
    debounce_ms: u64,
    state: OffRouteState,
}

impl OffRouteDetector {
    pub fn new(threshold_m: f64, debounce_ms: u64) -> Self {
        Self {
            threshold_m,
            debounce_ms,
            state: OffRouteState::default(),
        }
    }

    pub fn state(&self) -> &OffRouteState {
        &self.state
    }

    pub fn is_off_route(&self) -> bool {
        self.state.is_off_route
    }

    pub fn is_rerouting(&self) -> bool {
        self.state.is_rerouting
    }

    /// Feed the latest deviation from the route.
    pub fn observe(&mut self, deviation: f64) {
        let off = deviation > self.threshold_m;
        if off == self.state.is_off_route {
            return;
        }

        self.state.is_off_route = off;
        if off {
            info!("[OffRoute] Off route by {:.0}m", deviation);
        } else {
            info!("[OffRoute] Back on route");
        }
    }

    /// Whether an automatic reroute may be issued at `now_ms`.
    pub fn reroute_due(&self, now_ms: u64) -> bool {
        if !self.state.is_off_route || self.state.is_rerouting {
            return false;
        }
        match self.state.last_reroute_at_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.debounce_ms,
        }
    }

    /// Claim the reroute slot if an automatic reroute is due.
    pub fn try_begin_reroute(&mut self, now_ms: u64) -> bool {
        if !self.reroute_due(now_ms) {
            return false;
        }
        self.mark_in_flight(now_ms);
        true
    }

    /// Claim the reroute slot regardless of the debounce window and of the
    /// off-route flag. Still refuses while a request is in flight.
    pub fn force_begin_reroute(&mut self, now_ms: u64) -> bool {
        if self.state.is_rerouting {
            return false;
        }
        self.mark_in_flight(now_ms);
        true
    }

    fn mark_in_flight(&mut self, now_ms: u64) {
        self.state.is_rerouting = true;
        self.state.last_reroute_at_ms = Some(now_ms);
    }

    /// A fresh route was swapped in.
    pub fn reroute_succeeded(&mut self) {
        if self.state.is_off_route {
            info!("[OffRoute] Reroute successful");
        }
        self.state.is_rerouting = false;
        self.state.is_off_route = false;
    }

    /// The request failed; the off-route flag persists so the next debounce
    /// window retries.
    pub fn reroute_failed(&mut self) {
        warn!("[OffRoute] Reroute failed, will retry while off route");
        self.state.is_rerouting = false;
    }

    /// Drop the in-flight guard without touching the off-route flag; the
    /// response it was waiting for will be discarded.
    pub fn abandon_in_flight(&mut self) {
        self.state.is_rerouting = false;
    }

    pub fn reset(&mut self) {
        self.state = OffRouteState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> OffRouteDetector {
        OffRouteDetector::new(25.0, 3000)
    }

    #[test]
    fn test_off_route_flag_follows_deviation() {
        let mut d = detector();
        let mut flags = Vec::new();
        for deviation in [10.0, 50.0, 60.0, 40.0, 25.0, 5.0] {
            d.observe(deviation);
            flags.push(d.is_off_route());
        }
        assert_eq!(flags, vec![false, true, true, true, false, false]);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut d = detector();
        d.observe(25.0);
        assert!(!d.is_off_route());
        d.observe(25.01);
        assert!(d.is_off_route());
    }

    #[test]
    fn test_first_reroute_is_immediate() {
        let mut d = detector();
        assert!(!d.try_begin_reroute(0));
        d.observe(50.0);
        assert!(d.try_begin_reroute(0));
        assert!(d.is_rerouting());
    }

    #[test]
    fn test_in_flight_suppresses_duplicates() {
        let mut d = detector();
        d.observe(50.0);
        assert!(d.try_begin_reroute(1000));
        assert!(!d.try_begin_reroute(10_000));
        assert!(!d.force_begin_reroute(10_000));
    }

    #[test]
    fn test_debounce_after_failure() {
        let mut d = detector();
        d.observe(50.0);
        assert!(d.try_begin_reroute(0));
        d.reroute_failed();
        assert!(d.is_off_route());

        for now in [1000, 2000, 3000] {
            assert!(!d.try_begin_reroute(now), "reroute allowed at {}", now);
        }
        assert!(d.try_begin_reroute(3001));
    }

    #[test]
    fn test_success_clears_off_route() {
        let mut d = detector();
        d.observe(50.0);
        assert!(d.try_begin_reroute(0));
        d.reroute_succeeded();
        assert!(!d.is_off_route());
        assert!(!d.is_rerouting());
        // A later deviation starts a fresh off-route episode
        d.observe(50.0);
        assert!(d.is_off_route());
        assert!(!d.reroute_due(0));
        assert!(d.reroute_due(3_001));
    }

    #[test]
    fn test_force_bypasses_debounce() {
        let mut d = detector();
        d.observe(50.0);
        assert!(d.try_begin_reroute(0));
        d.reroute_failed();
        assert!(d.force_begin_reroute(500));
        assert_eq!(d.state().last_reroute_at_ms, Some(500));
    }

    #[test]
    fn test_abandon_keeps_off_route() {
        let mut d = detector();
        d.observe(50.0);
        assert!(d.try_begin_reroute(0));
        d.abandon_in_flight();
        assert!(d.is_off_route());
        assert!(!d.is_rerouting());
    }
}
