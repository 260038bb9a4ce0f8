//! # Camera-Follow Controller
//!
//! Decides whether the map camera tracks the traveler or is left to the user.
//!
//! ```text
//!                 interaction event / camera drift > 100 m
//!   AutoFollow  ──────────────────────────────────────────▶  UserControlled
//!       ▲                                                        │  │
//!       │            8 s without interaction                     │  │ interaction:
//!       └────────────────────────────────────────────────────────┘  │ restart timer
//!                                                                   ◀┘
//! ```
//!
//! The controller only computes state and poses. The inactivity timer is a
//! named task in the session's [`Timers`](crate::timers::Timers); the
//! controller hands back the deadline to schedule.

use log::{debug, info};

use crate::config::NavigationConfig;
use crate::geo_utils;
use crate::GpsPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum CameraMode {
    #[default]
    AutoFollow,
    UserControlled,
}

/// Viewport padding in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct CameraPadding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

/// A camera command for the map surface.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct CameraPose {
    pub center: GpsPoint,
    pub bearing: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub padding: CameraPadding,
    pub duration_ms: u64,
}

/// Camera-follow flags owned by the session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraFollowState {
    pub mode: CameraMode,
    pub last_interaction_ms: Option<u64>,
    /// Camera-drift checks are skipped until the last follow animation ends
    pub settle_until_ms: u64,
}

#[derive(Debug, Clone)]
pub struct CameraFollowController {
    inactivity_ms: u64,
    follow_distance_m: f64,
    zoom: f64,
    pitch: f64,
    bottom_padding_ratio: f64,
    animation_ms: u64,
    state: CameraFollowState,
}

impl CameraFollowController {
    pub fn new(config: &NavigationConfig) -> Self {
        Self {
            inactivity_ms: config.camera_inactivity_ms,
            follow_distance_m: config.camera_follow_distance_m,
            zoom: config.follow_zoom,
            pitch: config.follow_pitch,
            bottom_padding_ratio: config.follow_bottom_padding_ratio,
            animation_ms: config.camera_animation_ms,
            state: CameraFollowState::default(),
        }
    }

    pub fn state(&self) -> &CameraFollowState {
        &self.state
    }

    pub fn mode(&self) -> CameraMode {
        self.state.mode
    }

    pub fn is_user_controlled(&self) -> bool {
        self.state.mode == CameraMode::UserControlled
    }

    /// A pan/zoom/drag was reported. Returns the inactivity deadline to
    /// (re)schedule.
    pub fn on_user_interaction(&mut self, now_ms: u64) -> u64 {
        if self.state.mode == CameraMode::AutoFollow {
            info!("[Camera] User took control of the camera");
        } else {
            debug!("[Camera] Interaction, restarting inactivity timer");
        }
        self.state.mode = CameraMode::UserControlled;
        self.state.last_interaction_ms = Some(now_ms);
        now_ms + self.inactivity_ms
    }

    /// Treat a camera center far from the traveler as a manual pan.
    ///
    /// Only checked while auto-following and once the previous follow
    /// animation has settled. Returns the inactivity deadline when the
    /// controller switched to user control.
    pub fn check_camera_drift(
        &mut self,
        now_ms: u64,
        camera_center: &GpsPoint,
        traveler: &GpsPoint,
    ) -> Option<u64> {
        if self.state.mode != CameraMode::AutoFollow || now_ms < self.state.settle_until_ms {
            return None;
        }

        let drift = geo_utils::haversine_distance(camera_center, traveler);
        if drift <= self.follow_distance_m {
            return None;
        }

        info!("[Camera] User panned {:.0}m away - disabling auto-follow temporarily", drift);
        Some(self.on_user_interaction(now_ms))
    }

    /// The inactivity timer fired. Returns true when auto-follow resumed.
    pub fn on_inactivity_expired(&mut self) -> bool {
        if self.state.mode != CameraMode::UserControlled {
            return false;
        }
        info!("[Camera] Inactivity timer expired - resuming auto-follow");
        self.state.mode = CameraMode::AutoFollow;
        true
    }

    /// Follow pose centered on `position`, heading `bearing`, with the
    /// traveler pushed toward the bottom of the viewport.
    pub fn follow_pose(&mut self, now_ms: u64, position: GpsPoint, bearing: f64, viewport_height: f64) -> CameraPose {
        self.state.settle_until_ms = now_ms + self.animation_ms;
        CameraPose {
            center: position,
            bearing,
            zoom: self.zoom,
            pitch: self.pitch,
            padding: CameraPadding {
                top: 0.0,
                bottom: viewport_height * self.bottom_padding_ratio,
                left: 0.0,
                right: 0.0,
            },
            duration_ms: self.animation_ms,
        }
    }

    pub fn reset(&mut self) {
        self.state = CameraFollowState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> CameraFollowController {
        CameraFollowController::new(&NavigationConfig::default())
    }

    #[test]
    fn test_interaction_switches_to_user_control() {
        let mut c = controller();
        assert_eq!(c.mode(), CameraMode::AutoFollow);
        let deadline = c.on_user_interaction(1_000);
        assert_eq!(deadline, 9_000);
        assert!(c.is_user_controlled());
        assert_eq!(c.state().last_interaction_ms, Some(1_000));
    }

    #[test]
    fn test_repeat_interaction_extends_deadline() {
        let mut c = controller();
        c.on_user_interaction(0);
        assert_eq!(c.on_user_interaction(5_000), 13_000);
    }

    #[test]
    fn test_inactivity_resumes_follow() {
        let mut c = controller();
        assert!(!c.on_inactivity_expired());
        c.on_user_interaction(0);
        assert!(c.on_inactivity_expired());
        assert_eq!(c.mode(), CameraMode::AutoFollow);
    }

    #[test]
    fn test_camera_drift_detection() {
        let mut c = controller();
        let traveler = GpsPoint::new(25.2, 55.27);
        let near = GpsPoint::new(25.2005, 55.27); // ~56 m
        let far = GpsPoint::new(25.202, 55.27); // ~222 m

        assert_eq!(c.check_camera_drift(0, &near, &traveler), None);
        assert_eq!(c.check_camera_drift(0, &far, &traveler), Some(8_000));
        assert!(c.is_user_controlled());
        // Already user-controlled: drift does not restart the timer
        assert_eq!(c.check_camera_drift(1_000, &far, &traveler), None);
    }

    #[test]
    fn test_drift_ignored_while_settling() {
        let mut c = controller();
        let traveler = GpsPoint::new(25.2, 55.27);
        let far = GpsPoint::new(25.202, 55.27);
        c.follow_pose(0, traveler, 0.0, 800.0);
        assert_eq!(c.check_camera_drift(500, &far, &traveler), None);
        assert!(c.check_camera_drift(1_000, &far, &traveler).is_some());
    }

    #[test]
    fn test_follow_pose() {
        let mut c = controller();
        let pose = c.follow_pose(0, GpsPoint::new(25.2, 55.27), 87.0, 800.0);
        assert_eq!(pose.zoom, 16.5);
        assert_eq!(pose.pitch, 60.0);
        assert_eq!(pose.bearing, 87.0);
        assert!((pose.padding.bottom - 560.0).abs() < 1e-9);
        assert_eq!(pose.padding.top, 0.0);
        assert_eq!(pose.duration_ms, 1000);
    }
}
