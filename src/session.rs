//! # Navigation Session
//!
//! The aggregate root of the engine. A [`NavigationSession`] owns the active
//! route, the progress, off-route and camera-follow sub-states, the raw fix
//! buffer and every timer, and exposes the lifecycle operations:
//!
//! ```text
//!        begin_start + route          confirm_start            arrival
//! Idle ───────────────────▶ Previewing ───────────▶ Navigating ───────▶ Arrived
//!  ▲                            │                       │                  │
//!  └────────── stop ────────────┴──────── stop ─────────┘    grace timer   │
//!  └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session never performs I/O. Outbound effects (route requests,
//! map-matching requests, camera poses) are queued as [`NavigationCommand`]s
//! and drained by the caller, who later feeds responses back through
//! [`NavigationSession::apply_route_response`] and
//! [`NavigationSession::apply_snap_response`].
//!
//! Every request carries the session *generation*. The generation changes on
//! start, stop and every route swap, and a response whose generation no
//! longer matches is discarded with [`NavigationError::StaleResponse`].
//!
//! Time is supplied by the caller as monotonic milliseconds. Timers fire
//! from [`NavigationSession::advance`], which also runs the periodic tick.
//!
//! ## Example
//!
//! ```rust
//! use turn_navigator::{
//!     GpsPoint, LocationFix, Maneuver, NavigationCommand, NavigationConfig,
//!     NavigationSession, Route, RouteSet, SessionState, Step,
//! };
//!
//! let mut session = NavigationSession::new(NavigationConfig::default());
//! session.on_location(LocationFix::new(25.2000, 55.27, 0), 0);
//!
//! let destination = GpsPoint::new(25.2009, 55.27);
//! let request = session.begin_start(destination, None, 0).unwrap();
//!
//! // ... the caller fetches directions for `request` ...
//! let geometry: Vec<GpsPoint> = (0..10)
//!     .map(|i| GpsPoint::new(25.2 + i as f64 * 0.0001, 55.27))
//!     .collect();
//! let route = Route::from_steps(vec![
//!     Step::from_geometry(geometry, 60.0, Maneuver::new("depart", "Head north")),
//! ]).unwrap();
//!
//! session.apply_route_response(&request, Some(RouteSet::new(route, vec![])), 0).unwrap();
//! assert_eq!(session.state(), SessionState::Previewing);
//!
//! session.confirm_start(0).unwrap();
//! assert_eq!(session.state(), SessionState::Navigating);
//!
//! let commands = session.drain_commands();
//! assert!(commands.iter().any(|c| matches!(c, NavigationCommand::MoveCamera { .. })));
//! ```

use std::collections::VecDeque;
use std::fmt;

use log::{debug, info, warn};

use crate::camera::{CameraFollowController, CameraMode, CameraPose};
use crate::config::NavigationConfig;
use crate::error::{NavigationError, Result};
use crate::off_route::OffRouteDetector;
use crate::progress::{ProgressTracker, ProgressUpdate};
use crate::route::{Route, RouteSet, RoutingProfile};
use crate::smoothing::MapMatchSmoother;
use crate::timers::{TimerKind, Timers};
use crate::{Bounds, GpsPoint, LocationFix};

// ============================================================================
// Public Types
// ============================================================================

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum SessionState {
    #[default]
    Idle,
    Previewing,
    Navigating,
    Arrived,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Previewing => "previewing",
            SessionState::Navigating => "navigating",
            SessionState::Arrived => "arrived",
        };
        f.write_str(name)
    }
}

/// Why a route request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum RequestPurpose {
    /// Initial route for `begin_start`
    Start,
    /// Automatic or manual reroute from the current position
    Reroute,
    /// Same trip under a different travel profile
    ProfileChange,
}

/// A directions request issued by the session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct RouteRequest {
    pub generation: u64,
    pub purpose: RequestPurpose,
    pub origin: GpsPoint,
    pub destination: GpsPoint,
    pub profile: RoutingProfile,
    pub include_alternatives: bool,
}

/// A map-matching request issued by the session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SnapRequest {
    pub generation: u64,
    pub profile: RoutingProfile,
    pub fixes: Vec<LocationFix>,
    /// Search radius per fix in meters
    pub radius_m: f64,
}

/// Outbound effect for the caller to carry out.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum NavigationCommand {
    RequestRoute { request: RouteRequest },
    RequestSnap { request: SnapRequest },
    MoveCamera { pose: CameraPose },
}

/// Read-only view of the session for display.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct NavigationSnapshot {
    pub state: SessionState,
    pub generation: u64,
    pub profile: RoutingProfile,
    /// Picker label for `profile`, e.g. `Walk`
    pub profile_label: String,
    pub current_instruction: String,
    pub next_instruction: String,
    /// Maneuver type of the current step, e.g. `turn`
    pub maneuver_type: String,
    pub maneuver_modifier: Option<String>,
    /// Road name of the current step, empty when unknown
    pub road_name: String,
    /// Meters
    pub distance_to_next_maneuver: f64,
    /// Meters
    pub remaining_distance: f64,
    /// Seconds
    pub remaining_duration: f64,
    /// Estimated arrival on the caller's clock, while navigating
    pub eta_ms: Option<u64>,
    pub elapsed_ms: u64,
    pub current_step_index: u32,
    pub total_steps: u32,
    /// Meters
    pub total_distance: f64,
    /// Seconds
    pub total_duration: f64,
    pub bearing: f64,
    pub is_off_route: bool,
    pub is_rerouting: bool,
    pub has_arrived: bool,
    pub camera_mode: CameraMode,
    pub is_user_controlling_camera: bool,
    /// Snapped position when available, else the latest raw fix
    pub display_position: Option<GpsPoint>,
    pub speed_mps: f64,
    pub speed_kmh: f64,
    pub alternative_count: u32,
    pub overview_bounds: Option<Bounds>,
    /// Pre-computed center of `overview_bounds` for the preview camera
    pub overview_center: Option<GpsPoint>,
}

// ============================================================================
// Session
// ============================================================================

/// A single navigation session and its state machines.
#[derive(Debug)]
pub struct NavigationSession {
    config: NavigationConfig,
    state: SessionState,
    generation: u64,
    profile: RoutingProfile,
    destination: Option<GpsPoint>,
    route: Option<Route>,
    alternates: Vec<Route>,
    overview_bounds: Option<Bounds>,
    last_fix: Option<LocationFix>,
    camera_center: Option<GpsPoint>,
    viewport_height: f64,
    started_at_ms: Option<u64>,
    progress: ProgressTracker,
    off_route: OffRouteDetector,
    smoother: MapMatchSmoother,
    camera: CameraFollowController,
    timers: Timers,
    commands: VecDeque<NavigationCommand>,
}

impl NavigationSession {
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            progress: ProgressTracker::new(config.arrival_threshold_m, config.step_completion_threshold_m),
            off_route: OffRouteDetector::new(config.off_route_threshold_m, config.reroute_debounce_ms),
            smoother: MapMatchSmoother::new(
                config.map_match_min_fixes as usize,
                config.map_match_max_fixes as usize,
                config.map_match_overlap as usize,
            ),
            camera: CameraFollowController::new(&config),
            viewport_height: config.viewport_height_px,
            config,
            state: SessionState::Idle,
            generation: 0,
            profile: RoutingProfile::default(),
            destination: None,
            route: None,
            alternates: Vec::new(),
            overview_bounds: None,
            last_fix: None,
            camera_center: None,
            started_at_ms: None,
            timers: Timers::new(),
            commands: VecDeque::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn profile(&self) -> RoutingProfile {
        self.profile
    }

    pub fn destination(&self) -> Option<GpsPoint> {
        self.destination
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn alternates(&self) -> &[Route] {
        &self.alternates
    }

    pub fn last_fix(&self) -> Option<&LocationFix> {
        self.last_fix.as_ref()
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn off_route(&self) -> &OffRouteDetector {
        &self.off_route
    }

    pub fn camera(&self) -> &CameraFollowController {
        &self.camera
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Earliest pending timer, for drivers that sleep until the next event.
    pub fn next_timer_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Take every queued outbound command, oldest first.
    pub fn drain_commands(&mut self) -> Vec<NavigationCommand> {
        self.commands.drain(..).collect()
    }

    // ------------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------------

    /// Push a position fix from the location provider.
    ///
    /// While navigating the fix is applied to progress immediately and
    /// buffered for map matching.
    pub fn on_location(&mut self, fix: LocationFix, now_ms: u64) {
        if !fix.is_valid() {
            warn!("[Session] Ignoring invalid fix {:?}", fix);
            return;
        }
        self.last_fix = Some(fix);

        if self.state != SessionState::Navigating {
            return;
        }

        if let Some(fixes) = self.smoother.push(fix) {
            self.commands.push_back(NavigationCommand::RequestSnap {
                request: SnapRequest {
                    generation: self.generation,
                    profile: self.profile,
                    fixes,
                    radius_m: self.config.map_match_radius_m,
                },
            });
        }

        self.evaluate(now_ms);
    }

    /// A pan, zoom or drag on the map surface.
    pub fn report_user_interaction(&mut self, now_ms: u64) {
        if self.state == SessionState::Idle {
            debug!("[Session] Ignoring map interaction while idle");
            return;
        }
        let deadline = self.camera.on_user_interaction(now_ms);
        self.timers.schedule(TimerKind::CameraInactivity, deadline);
    }

    /// Latest center of the map camera, used to detect manual panning.
    pub fn report_camera_center(&mut self, center: GpsPoint) {
        if center.is_valid() {
            self.camera_center = Some(center);
        }
    }

    /// Viewport height in pixels, used for follow padding.
    pub fn set_viewport_height(&mut self, height_px: f64) {
        if height_px.is_finite() && height_px > 0.0 {
            self.viewport_height = height_px;
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle Operations
    // ------------------------------------------------------------------------

    /// First half of `startNavigation`: validate and build the route request.
    ///
    /// Fails with [`NavigationError::LocationUnavailable`] when no fix has
    /// been received. A running trip keeps going until the new route
    /// arrives; responses to its pending reroute become stale.
    pub fn begin_start(
        &mut self,
        destination: GpsPoint,
        profile: Option<RoutingProfile>,
        _now_ms: u64,
    ) -> Result<RouteRequest> {
        let origin = self
            .last_fix
            .map(|f| f.point())
            .ok_or(NavigationError::LocationUnavailable)?;

        if !destination.is_valid() {
            warn!("[Session] Invalid destination {:?}", destination);
            return Err(NavigationError::RouteFetchFailure);
        }

        let profile = profile.unwrap_or(self.profile);
        self.bump_generation();
        info!("[Session] Calculating {} route...", profile);

        Ok(RouteRequest {
            generation: self.generation,
            purpose: RequestPurpose::Start,
            origin,
            destination,
            profile,
            include_alternatives: true,
        })
    }

    /// Apply a directions response for a request this session issued.
    ///
    /// Returns `Ok(true)` when a route was installed and `Ok(false)` when a
    /// reroute or profile change failed and was absorbed. A failed start
    /// returns [`NavigationError::RouteFetchFailure`]; a response from an
    /// older generation returns [`NavigationError::StaleResponse`].
    pub fn apply_route_response(
        &mut self,
        request: &RouteRequest,
        response: Option<RouteSet>,
        _now_ms: u64,
    ) -> Result<bool> {
        if request.generation != self.generation {
            debug!(
                "[Session] Discarding {:?} response from generation {} (current {})",
                request.purpose, request.generation, self.generation
            );
            return Err(NavigationError::StaleResponse {
                request_generation: request.generation,
                current_generation: self.generation,
            });
        }

        match request.purpose {
            RequestPurpose::Start => self.apply_start(request, response),
            RequestPurpose::Reroute | RequestPurpose::ProfileChange => {
                if self.state != SessionState::Navigating {
                    self.off_route.abandon_in_flight();
                    return Err(NavigationError::InvalidState {
                        operation: "apply reroute",
                        state: self.state.to_string(),
                    });
                }
                Ok(self.apply_reroute(request, response))
            }
        }
    }

    fn apply_start(&mut self, request: &RouteRequest, response: Option<RouteSet>) -> Result<bool> {
        let Some(set) = response else {
            warn!("[Session] Could not calculate route");
            return Err(NavigationError::RouteFetchFailure);
        };

        if self.state != SessionState::Idle {
            info!("[Session] Replacing {} session", self.state);
            self.clear_trip();
        }

        info!(
            "[Session] Got {} route(s), {:.0}m / {:.0}s",
            1 + set.alternates.len(),
            set.primary.distance(),
            set.primary.duration()
        );

        self.overview_bounds = set.overview_bounds();
        self.route = Some(set.primary);
        self.alternates = set.alternates;
        self.destination = Some(request.destination);
        self.profile = request.profile;
        self.progress.reset();
        self.off_route.reset();
        self.smoother.reset();
        self.camera.reset();
        self.timers.cancel(TimerKind::CameraInactivity);
        self.state = SessionState::Previewing;
        Ok(true)
    }

    fn apply_reroute(&mut self, request: &RouteRequest, response: Option<RouteSet>) -> bool {
        let Some(set) = response else {
            match request.purpose {
                RequestPurpose::ProfileChange => {
                    warn!("[Session] Could not recalculate with {}", request.profile);
                    self.off_route.abandon_in_flight();
                }
                _ => self.off_route.reroute_failed(),
            }
            return false;
        };

        self.route = Some(set.primary);
        if request.purpose == RequestPurpose::ProfileChange {
            self.alternates = set.alternates;
            self.profile = request.profile;
            info!("[Session] Switched to {}", request.profile);
        } else {
            info!("[Session] Reroute applied");
        }
        self.overview_bounds = self.current_overview_bounds();
        self.progress.reset();
        self.bump_generation();
        self.off_route.reroute_succeeded();
        true
    }

    /// Apply a map-matching response. `None` means no correction.
    pub fn apply_snap_response(&mut self, generation: u64, corrected: Option<GpsPoint>) -> Result<()> {
        if generation != self.generation {
            debug!("[Session] Discarding snap from generation {} (current {})", generation, self.generation);
            return Err(NavigationError::StaleResponse {
                request_generation: generation,
                current_generation: self.generation,
            });
        }
        self.smoother.apply(corrected);
        Ok(())
    }

    /// `Previewing → Navigating`: start the elapsed clock and the tick loop.
    pub fn confirm_start(&mut self, now_ms: u64) -> Result<()> {
        if self.state != SessionState::Previewing {
            return Err(NavigationError::InvalidState {
                operation: "confirm navigation",
                state: self.state.to_string(),
            });
        }

        info!("[Session] Starting navigation");
        self.state = SessionState::Navigating;
        self.started_at_ms = Some(now_ms);
        self.timers
            .schedule(TimerKind::ProgressTick, now_ms + self.config.tick_interval_ms);
        self.run_tick(now_ms);
        Ok(())
    }

    /// Tear everything down and return to `Idle`. Cancels every timer
    /// (tick, camera inactivity, arrival grace) and orphans in-flight
    /// requests by moving to a new generation.
    pub fn stop(&mut self) {
        if self.state != SessionState::Idle {
            info!("[Session] Navigation stopped");
        }
        self.clear_trip();
        self.generation += 1;
    }

    /// Drop the current trip and return to `Idle` without touching the
    /// generation.
    fn clear_trip(&mut self) {
        self.timers.cancel_all();
        self.commands.clear();
        self.route = None;
        self.alternates.clear();
        self.overview_bounds = None;
        self.destination = None;
        self.started_at_ms = None;
        self.camera_center = None;
        self.progress.reset();
        self.off_route.reset();
        self.smoother.reset();
        self.camera.reset();
        self.state = SessionState::Idle;
    }

    /// Recalculate the trip under another travel profile.
    ///
    /// Outside of active navigation the profile is only recorded for the
    /// next start.
    pub fn change_profile(&mut self, profile: RoutingProfile, now_ms: u64) -> Result<()> {
        let origin = self.last_fix.map(|f| f.point());
        let (SessionState::Navigating, Some(destination), Some(origin)) =
            (self.state, self.destination, origin)
        else {
            self.profile = profile;
            return Ok(());
        };

        info!("[Session] Recalculating with {}...", profile);
        // Supersedes any reroute still in flight
        self.bump_generation();
        self.off_route.force_begin_reroute(now_ms);
        self.commands.push_back(NavigationCommand::RequestRoute {
            request: RouteRequest {
                generation: self.generation,
                purpose: RequestPurpose::ProfileChange,
                origin,
                destination,
                profile,
                include_alternatives: true,
            },
        });
        Ok(())
    }

    /// Promote alternate `index` to primary; the old primary becomes the
    /// first alternate.
    pub fn switch_to_alternative(&mut self, index: usize) -> Result<()> {
        if !matches!(self.state, SessionState::Previewing | SessionState::Navigating) {
            return Err(NavigationError::InvalidState {
                operation: "switch route",
                state: self.state.to_string(),
            });
        }
        if index >= self.alternates.len() {
            return Err(NavigationError::AlternativeOutOfRange {
                index,
                available: self.alternates.len(),
            });
        }

        info!("[Session] Switching to alternative {}", index + 1);
        let promoted = self.alternates.remove(index);
        if let Some(previous) = self.route.replace(promoted) {
            self.alternates.insert(0, previous);
        }
        self.progress.reset();
        self.off_route.reset();
        self.bump_generation();
        Ok(())
    }

    /// Manual "recalculate": request a fresh route from the current
    /// position, bypassing the debounce window.
    pub fn reroute(&mut self, now_ms: u64) -> Result<()> {
        if self.state != SessionState::Navigating {
            return Err(NavigationError::InvalidState {
                operation: "reroute",
                state: self.state.to_string(),
            });
        }
        let origin = self
            .last_fix
            .map(|f| f.point())
            .ok_or(NavigationError::LocationUnavailable)?;
        let Some(destination) = self.destination else {
            return Err(NavigationError::InvalidState {
                operation: "reroute",
                state: "without destination".to_string(),
            });
        };

        if !self.off_route.force_begin_reroute(now_ms) {
            debug!("[Session] Reroute already in flight");
            return Ok(());
        }
        info!("[Session] Manual reroute requested");
        self.queue_reroute(origin, destination);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------------

    /// Fire every timer due at `now_ms`: the progress tick, camera
    /// inactivity and arrival grace.
    pub fn advance(&mut self, now_ms: u64) {
        for kind in self.timers.take_due(now_ms) {
            match kind {
                TimerKind::ProgressTick => {
                    if self.state == SessionState::Navigating {
                        self.run_tick(now_ms);
                    }
                    if self.state == SessionState::Navigating {
                        self.timers
                            .schedule(TimerKind::ProgressTick, now_ms + self.config.tick_interval_ms);
                    }
                }
                TimerKind::CameraInactivity => {
                    if self.camera.on_inactivity_expired()
                        && self.state == SessionState::Navigating
                        && !self.off_route.is_off_route()
                    {
                        self.emit_follow_pose(now_ms);
                    }
                }
                TimerKind::ArrivalGrace => {
                    info!("[Session] Arrival grace period over");
                    self.stop();
                }
            }
        }
    }

    fn run_tick(&mut self, now_ms: u64) {
        self.evaluate(now_ms);
        if self.state == SessionState::Navigating {
            self.update_camera(now_ms);
        }
    }

    /// Progress and off-route checks against the latest fix.
    fn evaluate(&mut self, now_ms: u64) {
        let (Some(route), Some(destination), Some(fix)) =
            (self.route.as_ref(), self.destination, self.last_fix)
        else {
            return;
        };

        match self.progress.update(route, &destination, &fix.point()) {
            ProgressUpdate::Inactive => {}
            ProgressUpdate::Arrived => {
                info!("[Session] Arrived at destination!");
                self.state = SessionState::Arrived;
                self.timers.cancel(TimerKind::ProgressTick);
                self.timers
                    .schedule(TimerKind::ArrivalGrace, now_ms + self.config.arrival_grace_ms);
            }
            ProgressUpdate::Tracked { deviation } => {
                self.off_route.observe(deviation);
                if self.off_route.try_begin_reroute(now_ms) {
                    info!("[Session] Auto-rerouting...");
                    self.queue_reroute(fix.point(), destination);
                }
            }
        }
    }

    fn queue_reroute(&mut self, origin: GpsPoint, destination: GpsPoint) {
        self.commands.push_back(NavigationCommand::RequestRoute {
            request: RouteRequest {
                generation: self.generation,
                purpose: RequestPurpose::Reroute,
                origin,
                destination,
                profile: self.profile,
                include_alternatives: false,
            },
        });
    }

    fn update_camera(&mut self, now_ms: u64) {
        let Some(fix) = self.last_fix else {
            return;
        };

        if let Some(center) = self.camera_center {
            if let Some(deadline) = self.camera.check_camera_drift(now_ms, &center, &fix.point()) {
                self.timers.schedule(TimerKind::CameraInactivity, deadline);
                return;
            }
        }

        if self.camera.mode() == CameraMode::AutoFollow && !self.off_route.is_off_route() {
            self.emit_follow_pose(now_ms);
        } else {
            debug!("[Camera] Skipping auto-follow");
        }
    }

    fn emit_follow_pose(&mut self, now_ms: u64) {
        let Some(position) = self.smoother.display_position(self.last_fix.map(|f| f.point())) else {
            return;
        };
        let pose = self.camera.follow_pose(
            now_ms,
            position,
            self.progress.state().bearing,
            self.viewport_height,
        );
        self.commands.push_back(NavigationCommand::MoveCamera { pose });
    }

    /// Move to a new generation. In-flight guards are released because the
    /// responses they wait for will be discarded.
    fn bump_generation(&mut self) {
        self.generation += 1;
        self.off_route.abandon_in_flight();
        self.smoother.abandon_in_flight();
    }

    fn current_overview_bounds(&self) -> Option<Bounds> {
        let points: Vec<GpsPoint> = self
            .route
            .iter()
            .chain(self.alternates.iter())
            .flat_map(|r| r.geometry().iter().copied())
            .collect();
        Bounds::from_points(&points)
    }

    // ------------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------------

    /// Display snapshot at `now_ms`.
    pub fn snapshot(&self, now_ms: u64) -> NavigationSnapshot {
        let progress = self.progress.state();
        let route = self.route.as_ref();
        let current = route.and_then(|r| r.step(progress.current_step_index));
        let next = route.and_then(|r| r.step(progress.current_step_index + 1));
        let remaining = route.map(|r| self.progress.remaining(r)).unwrap_or_default();

        let eta_ms = (self.state == SessionState::Navigating)
            .then(|| now_ms + (remaining.duration * 1000.0).round() as u64);
        let elapsed_ms = self
            .started_at_ms
            .map(|start| now_ms.saturating_sub(start))
            .unwrap_or(0);
        let speed_mps = self.last_fix.and_then(|f| f.speed).unwrap_or(0.0).max(0.0);

        NavigationSnapshot {
            state: self.state,
            generation: self.generation,
            profile: self.profile,
            profile_label: self.profile.label().to_string(),
            current_instruction: current.map(|s| s.maneuver().instruction().to_string()).unwrap_or_default(),
            next_instruction: next.map(|s| s.maneuver().instruction().to_string()).unwrap_or_default(),
            maneuver_type: current.map(|s| s.maneuver().kind().to_string()).unwrap_or_default(),
            maneuver_modifier: current.and_then(|s| s.maneuver().modifier().map(str::to_string)),
            road_name: current.map(|s| s.name().to_string()).unwrap_or_default(),
            distance_to_next_maneuver: route.map(|r| self.progress.distance_to_next_maneuver(r)).unwrap_or(0.0),
            remaining_distance: remaining.distance,
            remaining_duration: remaining.duration,
            eta_ms,
            elapsed_ms,
            current_step_index: progress.current_step_index as u32,
            total_steps: route.map(|r| r.step_count() as u32).unwrap_or(0),
            total_distance: route.map(|r| r.distance()).unwrap_or(0.0),
            total_duration: route.map(|r| r.duration()).unwrap_or(0.0),
            bearing: progress.bearing,
            is_off_route: self.off_route.is_off_route(),
            is_rerouting: self.off_route.is_rerouting(),
            has_arrived: progress.has_arrived,
            camera_mode: self.camera.mode(),
            is_user_controlling_camera: self.camera.is_user_controlled(),
            display_position: self.smoother.display_position(self.last_fix.map(|f| f.point())),
            speed_mps,
            speed_kmh: speed_mps * 3.6,
            alternative_count: self.alternates.len() as u32,
            overview_bounds: self.overview_bounds,
            overview_center: self.overview_bounds.map(|b| b.center()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
