//! Map-matching smoother.
//!
//! Keeps a rolling window of raw fixes. Once enough fixes are buffered the
//! most recent ones are handed out as a batch for an external map-matching
//! service, and the window is trimmed to leave an overlap for the next
//! batch. A successful match replaces the displayed position; a failed one
//! falls back to the latest raw fix. Nothing here affects route progress.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::{GpsPoint, LocationFix};

/// Rolling window of the most recent raw fixes.
#[derive(Debug, Clone)]
pub struct RawFixBuffer {
    fixes: VecDeque<LocationFix>,
    capacity: usize,
}

impl RawFixBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            fixes: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a fix, evicting the oldest one when full.
    pub fn push(&mut self, fix: LocationFix) {
        if self.fixes.len() == self.capacity {
            self.fixes.pop_front();
        }
        self.fixes.push_back(fix);
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    /// The last `count` fixes, oldest first.
    pub fn latest(&self, count: usize) -> Vec<LocationFix> {
        let skip = self.fixes.len().saturating_sub(count);
        self.fixes.iter().skip(skip).copied().collect()
    }

    /// Keep only the last `count` fixes.
    pub fn trim_to(&mut self, count: usize) {
        while self.fixes.len() > count {
            self.fixes.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.fixes.clear();
    }
}

#[derive(Debug, Clone)]
pub struct MapMatchSmoother {
    buffer: RawFixBuffer,
    min_fixes: usize,
    max_fixes: usize,
    overlap: usize,
    in_flight: bool,
    snapped: Option<GpsPoint>,
}

impl MapMatchSmoother {
    pub fn new(min_fixes: usize, max_fixes: usize, overlap: usize) -> Self {
        Self {
            buffer: RawFixBuffer::new(max_fixes),
            min_fixes,
            max_fixes,
            overlap,
            in_flight: false,
            snapped: None,
        }
    }

    /// Buffer a raw fix. Returns the batch to submit when one is due.
    pub fn push(&mut self, fix: LocationFix) -> Option<Vec<LocationFix>> {
        self.buffer.push(fix);

        if self.in_flight || self.buffer.len() < self.min_fixes {
            return None;
        }

        let batch = self.buffer.latest(self.max_fixes);
        self.buffer.trim_to(self.overlap);
        self.in_flight = true;
        debug!("[MapMatching] Submitting {} fixes", batch.len());
        Some(batch)
    }

    /// Apply the service's answer; `None` means no correction.
    pub fn apply(&mut self, corrected: Option<GpsPoint>) {
        self.in_flight = false;
        match corrected.filter(|p| p.is_valid()) {
            Some(point) => {
                debug!("[MapMatching] Snapped to {:.6},{:.6}", point.latitude, point.longitude);
                self.snapped = Some(point);
            }
            None => {
                warn!("[MapMatching] No correction available, using raw fix");
                self.snapped = None;
            }
        }
    }

    /// Release the in-flight guard for a request whose answer will never be applied.
    pub fn abandon_in_flight(&mut self) {
        self.in_flight = false;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn snapped(&self) -> Option<GpsPoint> {
        self.snapped
    }

    /// Position to display: the last snapped point, else the raw fix.
    pub fn display_position(&self, raw: Option<GpsPoint>) -> Option<GpsPoint> {
        self.snapped.or(raw)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.in_flight = false;
        self.snapped = None;
    }
}
