//! Named, cancellable single-shot tasks owned by a navigation session.
//!
//! Each [`TimerKind`] has at most one pending deadline; scheduling a kind
//! again replaces its deadline. Deadlines are absolute milliseconds on the
//! session clock, and the owner polls [`Timers::take_due`] as time advances,
//! so cancelling everything on stop is a single call.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Periodic progress tick (rescheduled after each run)
    ProgressTick,
    /// Resume camera auto-follow after user inactivity
    CameraInactivity,
    /// Stop the session after the arrival banner has been shown
    ArrivalGrace,
}

#[derive(Debug, Clone, Default)]
pub struct Timers {
    deadlines: HashMap<TimerKind, u64>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` at `deadline_ms`, replacing any pending deadline.
    pub fn schedule(&mut self, kind: TimerKind, deadline_ms: u64) {
        self.deadlines.insert(kind, deadline_ms);
    }

    /// Cancel `kind`. Returns whether it was pending.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.deadlines.remove(&kind).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.deadlines.clear();
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<u64> {
        self.deadlines.get(&kind).copied()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every timer due at `now_ms`, earliest first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<TimerKind> {
        let mut due: Vec<(u64, TimerKind)> = self
            .deadlines
            .iter()
            .filter(|(_, &deadline)| deadline <= now_ms)
            .map(|(&kind, &deadline)| (deadline, kind))
            .collect();
        due.sort();

        for (_, kind) in &due {
            self.deadlines.remove(kind);
        }
        due.into_iter().map(|(_, kind)| kind).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
