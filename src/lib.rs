//! # Turn Navigator
//!
//! Turn-by-turn navigation engine for mobile map apps.
//!
//! This library provides:
//! - Route model normalized from Directions-style provider responses
//! - Step-by-step progress tracking with arrival detection
//! - Off-route detection with debounced automatic rerouting
//! - Map-matching smoothing of the displayed position
//! - Camera auto-follow that yields to manual map interaction
//! - A session orchestrator tying it all together over a deterministic clock
//!
//! ## Features
//!
//! - **`runtime`** - Async [`Navigator`] driver on tokio (default)
//! - **`http`** - Mapbox Directions and Map Matching providers over reqwest
//! - **`ffi`** - FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use turn_navigator::{GpsPoint, LocationFix, NavigationConfig, NavigationSession};
//!
//! let mut session = NavigationSession::new(NavigationConfig::default());
//! session.on_location(LocationFix::new(51.5074, -0.1278, 0), 0);
//!
//! // Build the directions request for the host to send
//! let request = session
//!     .begin_start(GpsPoint::new(51.5155, -0.1410), None, 0)
//!     .unwrap();
//! println!("Route {} via {}", request.generation, request.profile);
//! ```

// Geometry helpers (haversine, bearing, nearest-vertex projection)
pub mod geo_utils;

pub mod config;
pub mod error;
pub use config::NavigationConfig;
pub use error::{NavigationError, Result};

// Route model and Directions JSON normalization
pub mod route;
pub use route::{Leg, Maneuver, Route, RouteSet, RoutingProfile, Step};

// Per-concern state machines owned by the session
pub mod camera;
pub mod off_route;
pub mod progress;
pub mod smoothing;
pub mod timers;
pub use camera::{CameraFollowController, CameraMode, CameraPadding, CameraPose};
pub use off_route::{OffRouteDetector, OffRouteState};
pub use progress::{ProgressState, ProgressTracker, ProgressUpdate, Remaining};
pub use smoothing::{MapMatchSmoother, RawFixBuffer};
pub use timers::{TimerKind, Timers};

// Session orchestrator
pub mod session;
pub use session::{
    NavigationCommand, NavigationSession, NavigationSnapshot, RequestPurpose, RouteRequest,
    SessionState, SnapRequest,
};

pub mod display;
pub use display::{format_distance, format_duration};

pub mod providers;
pub use providers::{CameraSurface, DirectionsProvider, MapMatchingProvider, ProviderFuture};

// Async driver over tokio
#[cfg(feature = "runtime")]
pub mod navigator;

#[cfg(feature = "runtime")]
pub use navigator::Navigator;

// HTTP providers for Mapbox services
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{HttpProviderConfig, MapboxDirections, MapboxMapMatching};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("TurnNavigatorRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use turn_navigator::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a route or route set.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self { min_lat, max_lat, min_lng, max_lng })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// A raw position fix from the location provider.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Course over ground in degrees, if reported
    pub heading: Option<f64>,
    /// Meters per second, if reported
    pub speed: Option<f64>,
    /// Horizontal accuracy in meters, if reported
    pub accuracy: Option<f64>,
    /// Monotonic milliseconds on the session clock
    pub timestamp_ms: u64,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: u64) -> Self {
        Self {
            latitude,
            longitude,
            heading: None,
            speed: None,
            accuracy: None,
            timestamp_ms,
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }

    pub fn is_valid(&self) -> bool {
        self.point().is_valid()
    }
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{debug, info};
    use std::sync::{Arc, Mutex, MutexGuard};

    /// Host-driven navigation engine.
    ///
    /// The host owns the clock and all I/O: it passes `now_ms` to every call,
    /// executes drained commands, and feeds responses back in. Route
    /// responses are passed as raw Directions JSON.
    #[derive(uniffi::Object)]
    pub struct NavigationEngine {
        session: Mutex<NavigationSession>,
    }

    impl NavigationEngine {
        fn session(&self) -> MutexGuard<'_, NavigationSession> {
            // A panic while holding the lock leaves the session usable
            self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }
    }

    #[uniffi::export]
    impl NavigationEngine {
        #[uniffi::constructor]
        pub fn new(config: NavigationConfig) -> Result<Arc<Self>> {
            init_logging();
            config.validate()?;
            info!("[TurnNavigatorRust] NavigationEngine created");
            Ok(Arc::new(Self {
                session: Mutex::new(NavigationSession::new(config)),
            }))
        }

        pub fn on_location(&self, fix: LocationFix, now_ms: u64) {
            self.session().on_location(fix, now_ms);
        }

        pub fn begin_start(
            &self,
            destination: GpsPoint,
            profile: Option<RoutingProfile>,
            now_ms: u64,
        ) -> Result<RouteRequest> {
            self.session().begin_start(destination, profile, now_ms)
        }

        /// Apply a Directions response body; `None` reports a failed fetch.
        pub fn apply_route_response(
            &self,
            request: RouteRequest,
            body: Option<Vec<u8>>,
            now_ms: u64,
        ) -> Result<bool> {
            let routes = body.as_deref().and_then(RouteSet::from_directions_json);
            debug!(
                "[TurnNavigatorRust] Route response for generation {}: {}",
                request.generation,
                if routes.is_some() { "ok" } else { "no route" }
            );
            self.session().apply_route_response(&request, routes, now_ms)
        }

        pub fn apply_snap_response(&self, generation: u64, corrected: Option<GpsPoint>) -> Result<()> {
            self.session().apply_snap_response(generation, corrected)
        }

        pub fn confirm_start(&self, now_ms: u64) -> Result<()> {
            self.session().confirm_start(now_ms)
        }

        pub fn stop(&self) {
            self.session().stop();
        }

        pub fn change_profile(&self, profile: RoutingProfile, now_ms: u64) -> Result<()> {
            self.session().change_profile(profile, now_ms)
        }

        pub fn switch_to_alternative(&self, index: u32) -> Result<()> {
            self.session().switch_to_alternative(index as usize)
        }

        pub fn reroute(&self, now_ms: u64) -> Result<()> {
            self.session().reroute(now_ms)
        }

        pub fn report_user_interaction(&self, now_ms: u64) {
            self.session().report_user_interaction(now_ms);
        }

        pub fn report_camera_center(&self, center: GpsPoint) {
            self.session().report_camera_center(center);
        }

        pub fn set_viewport_height(&self, height_px: f64) {
            self.session().set_viewport_height(height_px);
        }

        /// Fire due timers. Call at or after `next_timer_deadline`.
        pub fn advance(&self, now_ms: u64) {
            self.session().advance(now_ms);
        }

        pub fn next_timer_deadline(&self) -> Option<u64> {
            self.session().next_timer_deadline()
        }

        pub fn drain_commands(&self) -> Vec<NavigationCommand> {
            self.session().drain_commands()
        }

        pub fn snapshot(&self, now_ms: u64) -> NavigationSnapshot {
            self.session().snapshot(now_ms)
        }
    }

    /// Get default configuration.
    #[uniffi::export]
    pub fn default_navigation_config() -> NavigationConfig {
        init_logging();
        info!("[TurnNavigatorRust] default_navigation_config called - Rust is active!");
        NavigationConfig::default()
    }

    #[uniffi::export]
    pub fn ffi_format_distance(meters: f64) -> String {
        format_distance(meters)
    }

    #[uniffi::export]
    pub fn ffi_format_duration(seconds: f64) -> String {
        format_duration(seconds)
    }
}

// ============================================================================
// Tests
// ============================================================================
