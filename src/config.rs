//! Navigation tuning parameters.

use serde::Deserialize;

use crate::error::{NavigationError, Result};

/// Configuration for the navigation engine.
///
/// Every field has a default matching the thresholds used by common
/// turn-by-turn SDKs. Hosts can override a subset through JSON:
///
/// ```
/// use turn_navigator::NavigationConfig;
///
/// let config = NavigationConfig::from_json(r#"{ "off_route_threshold_m": 40.0 }"#).unwrap();
/// assert_eq!(config.off_route_threshold_m, 40.0);
/// assert_eq!(config.reroute_debounce_ms, 3000);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct NavigationConfig {
    /// Deviation from the current step beyond which the traveler is off route.
    /// Default: 25.0 meters
    pub off_route_threshold_m: f64,

    /// Minimum time between two automatic reroute requests.
    /// Default: 3000 ms
    pub reroute_debounce_ms: u64,

    /// Distance to the destination below which the traveler has arrived.
    /// Default: 20.0 meters
    pub arrival_threshold_m: f64,

    /// Remaining distance in a step below which the next step becomes current.
    /// Default: 15.0 meters
    pub step_completion_threshold_m: f64,

    /// Delay between arrival and the automatic stop.
    /// Default: 3000 ms (long enough for an arrival banner)
    pub arrival_grace_ms: u64,

    /// Inactivity after the last map interaction before auto-follow resumes.
    /// Default: 8000 ms
    pub camera_inactivity_ms: u64,

    /// Camera-center to traveler distance treated as a manual pan.
    /// Default: 100.0 meters
    pub camera_follow_distance_m: f64,

    /// Nominal period of the progress tick.
    /// Default: 1000 ms
    pub tick_interval_ms: u64,

    /// Map zoom while following. Default: 16.5
    pub follow_zoom: f64,

    /// Map pitch in degrees while following. Default: 60.0
    pub follow_pitch: f64,

    /// Share of the viewport height used as bottom padding, which pushes the
    /// traveler toward the bottom of the screen. Default: 0.70
    pub follow_bottom_padding_ratio: f64,

    /// Viewport height used for padding when the surface does not report one.
    /// Default: 800 px
    pub viewport_height_px: f64,

    /// Duration of each camera ease animation. Default: 1000 ms
    pub camera_animation_ms: u64,

    /// Buffered fixes required before a map-matching request. Default: 3
    pub map_match_min_fixes: u32,

    /// Maximum fixes sent per map-matching request. Default: 5
    pub map_match_max_fixes: u32,

    /// Fixes kept after a request to overlap with the next one. Default: 3
    pub map_match_overlap: u32,

    /// Search radius per fix passed to the map-matching service. Default: 25.0 meters
    pub map_match_radius_m: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            off_route_threshold_m: 25.0,
            reroute_debounce_ms: 3000,
            arrival_threshold_m: 20.0,
            step_completion_threshold_m: 15.0,
            arrival_grace_ms: 3000,
            camera_inactivity_ms: 8000,
            camera_follow_distance_m: 100.0,
            tick_interval_ms: 1000,
            follow_zoom: 16.5,
            follow_pitch: 60.0,
            follow_bottom_padding_ratio: 0.70,
            viewport_height_px: 800.0,
            camera_animation_ms: 1000,
            map_match_min_fixes: 3,
            map_match_max_fixes: 5,
            map_match_overlap: 3,
            map_match_radius_m: 25.0,
        }
    }
}

impl NavigationConfig {
    /// Parse a (possibly partial) JSON override on top of the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| NavigationError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that would make the state machines misbehave.
    pub fn validate(&self) -> Result<()> {
        let distances = [
            ("off_route_threshold_m", self.off_route_threshold_m),
            ("arrival_threshold_m", self.arrival_threshold_m),
            ("step_completion_threshold_m", self.step_completion_threshold_m),
            ("camera_follow_distance_m", self.camera_follow_distance_m),
            ("map_match_radius_m", self.map_match_radius_m),
            ("viewport_height_px", self.viewport_height_px),
        ];
        for (name, value) in distances {
            if !(value.is_finite() && value > 0.0) {
                return Err(NavigationError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if self.tick_interval_ms == 0 {
            return Err(NavigationError::InvalidConfig(
                "tick_interval_ms must be positive".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.follow_bottom_padding_ratio) {
            return Err(NavigationError::InvalidConfig(format!(
                "follow_bottom_padding_ratio must be in [0, 1), got {}",
                self.follow_bottom_padding_ratio
            )));
        }

        if self.map_match_min_fixes < 2
            || self.map_match_overlap > self.map_match_max_fixes
            || self.map_match_min_fixes > self.map_match_max_fixes
        {
            return Err(NavigationError::InvalidConfig(format!(
                "map matching buffer sizes are inconsistent (min {}, overlap {}, max {})",
                self.map_match_min_fixes, self.map_match_overlap, self.map_match_max_fixes
            )));
        }

        Ok(())
    }
}
