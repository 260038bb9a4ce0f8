//! # Async Navigator
//!
//! Drives a [`NavigationSession`] on a tokio runtime: owns the clock, sleeps
//! until the next timer deadline, and dispatches session commands to the
//! providers.
//!
//! ```text
//!  push_location / API calls ──▶ ┌──────────────────┐ ──▶ MoveCamera ──▶ CameraSurface
//!                                │ NavigationSession│
//!  driver: sleep_until(deadline) │  (tokio Mutex)   │ ──▶ RequestRoute ─▶ spawn(DirectionsProvider)
//!          └─▶ advance(now) ───▶ └──────────────────┘ ──▶ RequestSnap ──▶ spawn(MapMatchingProvider)
//!                                        ▲                                      │
//!                                        └──── apply_*_response(generation) ◀───┘
//! ```
//!
//! Provider calls run as independent tasks and never hold the session lock
//! while awaiting. Responses are re-checked against the session generation,
//! so a stop or route swap in the meantime turns them into no-ops.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::NavigationConfig;
use crate::error::{NavigationError, Result};
use crate::providers::{CameraSurface, DirectionsProvider, MapMatchingProvider};
use crate::route::RoutingProfile;
use crate::session::{NavigationCommand, NavigationSession, NavigationSnapshot};
use crate::{GpsPoint, LocationFix};

struct Shared<D, M, C> {
    session: Mutex<NavigationSession>,
    directions: D,
    matcher: M,
    camera: C,
    origin: Instant,
    wake: Notify,
}

impl<D, M, C> Shared<D, M, C> {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Async front end over a [`NavigationSession`].
pub struct Navigator<D, M, C>
where
    D: DirectionsProvider + 'static,
    M: MapMatchingProvider + 'static,
    C: CameraSurface + 'static,
{
    shared: Arc<Shared<D, M, C>>,
    driver: StdMutex<Option<JoinHandle<()>>>,
}

impl<D, M, C> Navigator<D, M, C>
where
    D: DirectionsProvider + 'static,
    M: MapMatchingProvider + 'static,
    C: CameraSurface + 'static,
{
    /// Create a navigator. The clock starts now.
    pub fn new(config: NavigationConfig, directions: D, matcher: M, camera: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                session: Mutex::new(NavigationSession::new(config)),
                directions,
                matcher,
                camera,
                origin: Instant::now(),
                wake: Notify::new(),
            }),
            driver: StdMutex::new(None),
        })
    }

    /// Milliseconds since the navigator was created.
    pub fn now_ms(&self) -> u64 {
        self.shared.now_ms()
    }

    /// Fetch a route to `destination` and enter preview.
    ///
    /// Resolves once the route is installed, or with
    /// [`NavigationError::RouteFetchFailure`] when none could be computed.
    /// A trip already in progress keeps running if the fetch fails.
    pub async fn start_navigation(
        &self,
        destination: GpsPoint,
        profile: Option<RoutingProfile>,
    ) -> Result<()> {
        let request = {
            let mut session = self.shared.session.lock().await;
            session.begin_start(destination, profile, self.now_ms())?
        };

        let start = std::time::Instant::now();
        let response = match self.shared.directions.get_route(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("[Navigator] Directions request failed: {}", e);
                None
            }
        };
        debug!("[Navigator] Directions answered in {:?}", start.elapsed());

        self.shared
            .session
            .lock()
            .await
            .apply_route_response(&request, response, self.now_ms())?;
        // The previous trip, if any, has been replaced by a preview
        self.stop_driver();
        Ok(())
    }

    /// Leave preview and start the guidance loop.
    pub async fn confirm_start(&self) -> Result<()> {
        let commands = {
            let mut session = self.shared.session.lock().await;
            if let Some(height) = self.shared.camera.viewport_height() {
                session.set_viewport_height(height);
            }
            session.confirm_start(self.now_ms())?;
            session.drain_commands()
        };
        dispatch(&self.shared, commands);
        self.ensure_driver();
        Ok(())
    }

    /// Stop navigation and the driver loop.
    pub async fn stop(&self) {
        self.shared.session.lock().await.stop();
        self.stop_driver();
        info!("[Navigator] Stopped");
    }

    pub async fn push_location(&self, fix: LocationFix) {
        self.mutate(|session, now| {
            session.on_location(fix, now);
            Ok(())
        })
        .await
        .ok();
    }

    pub async fn report_user_interaction(&self) {
        self.mutate(|session, now| {
            session.report_user_interaction(now);
            Ok(())
        })
        .await
        .ok();
    }

    pub async fn change_profile(&self, profile: RoutingProfile) -> Result<()> {
        self.mutate(|session, now| session.change_profile(profile, now)).await
    }

    pub async fn switch_to_alternative(&self, index: usize) -> Result<()> {
        self.mutate(|session, _| session.switch_to_alternative(index)).await
    }

    pub async fn reroute(&self) -> Result<()> {
        self.mutate(|session, now| session.reroute(now)).await
    }

    pub async fn snapshot(&self) -> NavigationSnapshot {
        self.shared.session.lock().await.snapshot(self.now_ms())
    }

    /// Run `op` against the session, then dispatch whatever it queued and
    /// let the driver pick up new deadlines.
    async fn mutate<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&mut NavigationSession, u64) -> Result<()>,
    {
        let (result, commands) = {
            let mut session = self.shared.session.lock().await;
            let result = op(&mut *session, self.now_ms());
            (result, session.drain_commands())
        };
        dispatch(&self.shared, commands);
        self.shared.wake.notify_one();
        result
    }

    fn ensure_driver(&self) {
        let mut driver = self.driver.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if driver.as_ref().is_some_and(|handle| !handle.is_finished()) {
            self.shared.wake.notify_one();
            return;
        }
        *driver = Some(tokio::spawn(drive(Arc::clone(&self.shared))));
    }

    fn stop_driver(&self) {
        let mut driver = self.driver.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = driver.take() {
            handle.abort();
        }
    }
}

impl<D, M, C> Drop for Navigator<D, M, C>
where
    D: DirectionsProvider + 'static,
    M: MapMatchingProvider + 'static,
    C: CameraSurface + 'static,
{
    fn drop(&mut self) {
        self.stop_driver();
    }
}

/// Timer loop: sleep until the next deadline or until woken by an API call.
async fn drive<D, M, C>(shared: Arc<Shared<D, M, C>>)
where
    D: DirectionsProvider + 'static,
    M: MapMatchingProvider + 'static,
    C: CameraSurface + 'static,
{
    debug!("[Navigator] Driver started");
    loop {
        let deadline = shared.session.lock().await.next_timer_deadline();
        let Some(deadline_ms) = deadline else {
            shared.wake.notified().await;
            continue;
        };

        let at = shared.origin + Duration::from_millis(deadline_ms);
        tokio::select! {
            _ = tokio::time::sleep_until(at) => {
                let commands = {
                    let mut session = shared.session.lock().await;
                    if let Some(center) = shared.camera.center() {
                        session.report_camera_center(center);
                    }
                    session.advance(shared.now_ms());
                    session.drain_commands()
                };
                dispatch(&shared, commands);
            }
            _ = shared.wake.notified() => {}
        }
    }
}

/// Carry out session commands. Provider calls are spawned.
fn dispatch<D, M, C>(shared: &Arc<Shared<D, M, C>>, commands: Vec<NavigationCommand>)
where
    D: DirectionsProvider + 'static,
    M: MapMatchingProvider + 'static,
    C: CameraSurface + 'static,
{
    for command in commands {
        match command {
            NavigationCommand::MoveCamera { pose } => shared.camera.apply_pose(&pose),
            NavigationCommand::RequestRoute { request } => {
                let shared = Arc::clone(shared);
                tokio::spawn(async move {
                    let response = match shared.directions.get_route(&request).await {
                        Ok(response) => response,
                        Err(e) => {
                            warn!("[Navigator] {:?} request failed: {}", request.purpose, e);
                            None
                        }
                    };
                    let commands = {
                        let mut session = shared.session.lock().await;
                        log_outcome(session.apply_route_response(&request, response, shared.now_ms()).map(|_| ()));
                        session.drain_commands()
                    };
                    dispatch(&shared, commands);
                    shared.wake.notify_one();
                });
            }
            NavigationCommand::RequestSnap { request } => {
                let shared = Arc::clone(shared);
                tokio::spawn(async move {
                    let corrected = match shared.matcher.snap(&request).await {
                        Ok(corrected) => corrected,
                        Err(e) => {
                            warn!("[Navigator] Map matching failed: {}", e);
                            None
                        }
                    };
                    let mut session = shared.session.lock().await;
                    log_outcome(session.apply_snap_response(request.generation, corrected));
                });
            }
        }
    }
}

fn log_outcome(result: Result<()>) {
    match result {
        Ok(()) => {}
        Err(e @ NavigationError::StaleResponse { .. }) => debug!("[Navigator] {}", e),
        Err(e) => warn!("[Navigator] {}", e),
    }
}
