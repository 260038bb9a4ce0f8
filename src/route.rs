//! # Route Model
//!
//! Normalized, immutable representation of a route returned by a directions
//! provider: ordered legs, each an ordered list of [`Step`]s carrying a
//! geometry polyline, distance (meters), duration (seconds) and a
//! [`Maneuver`].
//!
//! Provider responses in the Mapbox Directions v5 shape deserialize through
//! private DTOs and are normalized by [`RouteSet::from_directions_json`]. A response
//! that is malformed, reports an error code, or contains no usable step
//! yields `None`, which callers report as a route fetch failure.
//!
//! Steps are addressed by a flat index across all legs, so a multi-leg
//! route is tracked end to end by a single step counter.

use log::{debug, warn};
use serde::Deserialize;

use crate::geo_utils;
use crate::{Bounds, GpsPoint};

// ============================================================================
// Routing Profile
// ============================================================================

/// Travel mode used when requesting routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum RoutingProfile {
    /// Driving with live traffic (default)
    #[default]
    DrivingTraffic,
    Driving,
    Walking,
    Cycling,
}

impl RoutingProfile {
    /// Provider identifier, e.g. `mapbox/driving-traffic`.
    pub fn provider_id(&self) -> &'static str {
        match self {
            RoutingProfile::DrivingTraffic => "mapbox/driving-traffic",
            RoutingProfile::Driving => "mapbox/driving",
            RoutingProfile::Walking => "mapbox/walking",
            RoutingProfile::Cycling => "mapbox/cycling",
        }
    }

    /// Short label for profile pickers.
    pub fn label(&self) -> &'static str {
        match self {
            RoutingProfile::DrivingTraffic | RoutingProfile::Driving => "Drive",
            RoutingProfile::Walking => "Walk",
            RoutingProfile::Cycling => "Bike",
        }
    }
}

impl std::fmt::Display for RoutingProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.provider_id())
    }
}

// ============================================================================
// Route Types
// ============================================================================

/// The maneuver that starts a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Maneuver {
    kind: String,
    modifier: Option<String>,
    instruction: String,
    bearing_before: f64,
    bearing_after: f64,
    location: Option<GpsPoint>,
}

impl Maneuver {
    pub fn new(kind: &str, instruction: &str) -> Self {
        Self {
            kind: kind.to_string(),
            modifier: None,
            instruction: instruction.to_string(),
            bearing_before: 0.0,
            bearing_after: 0.0,
            location: None,
        }
    }

    /// Maneuver type, e.g. `turn`, `depart`, `arrive`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Direction qualifier, e.g. `left`, `slight right`.
    pub fn modifier(&self) -> Option<&str> {
        self.modifier.as_deref()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn bearing_before(&self) -> f64 {
        self.bearing_before
    }

    pub fn bearing_after(&self) -> f64 {
        self.bearing_after
    }

    pub fn location(&self) -> Option<GpsPoint> {
        self.location
    }
}

/// One maneuver's worth of route. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    name: String,
    geometry: Vec<GpsPoint>,
    distance: f64,
    duration: f64,
    maneuver: Maneuver,
}

impl Step {
    /// Create a step. Negative or non-finite distance/duration are clamped to 0.
    pub fn new(geometry: Vec<GpsPoint>, distance: f64, duration: f64, maneuver: Maneuver) -> Self {
        Self {
            name: String::new(),
            geometry,
            distance: sanitize(distance),
            duration: sanitize(duration),
            maneuver,
        }
    }

    /// Create a step whose distance is the length of its polyline.
    pub fn from_geometry(geometry: Vec<GpsPoint>, duration: f64, maneuver: Maneuver) -> Self {
        let distance = geo_utils::polyline_length(&geometry);
        Self::new(geometry, distance, duration, maneuver)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Road name, empty when unknown.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &[GpsPoint] {
        &self.geometry
    }

    /// Step length in meters.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Step travel time in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn maneuver(&self) -> &Maneuver {
        &self.maneuver
    }
}

/// Origin-to-waypoint portion of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    summary: String,
    steps: Vec<Step>,
    distance: f64,
    duration: f64,
}

impl Leg {
    /// Build a leg; distance and duration are the sums over its steps.
    pub fn new(steps: Vec<Step>) -> Self {
        let distance = steps.iter().map(|s| s.distance).sum();
        let duration = steps.iter().map(|s| s.duration).sum();
        Self { summary: String::new(), steps, distance, duration }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

/// A complete route. Replaced wholesale on reroute, never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    legs: Vec<Leg>,
    distance: f64,
    duration: f64,
    geometry: Vec<GpsPoint>,
}

impl Route {
    /// Build a route from legs. Overview geometry is the concatenation of
    /// all step geometries with consecutive duplicates removed.
    ///
    /// Returns `None` when no step carries geometry.
    pub fn new(legs: Vec<Leg>) -> Option<Self> {
        let distance = legs.iter().map(|l| l.distance).sum();
        let duration = legs.iter().map(|l| l.duration).sum();
        Self::with_overview(legs, distance, duration, Vec::new())
    }

    /// Build a route with provider-supplied totals and overview geometry.
    /// An empty overview falls back to the concatenated step geometry.
    pub fn with_overview(
        legs: Vec<Leg>,
        distance: f64,
        duration: f64,
        geometry: Vec<GpsPoint>,
    ) -> Option<Self> {
        let has_geometry = legs
            .iter()
            .flat_map(|l| l.steps.iter())
            .any(|s| !s.geometry.is_empty());
        if !has_geometry {
            return None;
        }

        let geometry = if geometry.len() >= 2 {
            geometry
        } else {
            let mut concatenated: Vec<GpsPoint> = Vec::new();
            for point in legs.iter().flat_map(|l| l.steps.iter()).flat_map(|s| s.geometry.iter()) {
                if concatenated.last() != Some(point) {
                    concatenated.push(*point);
                }
            }
            concatenated
        };

        Some(Self {
            legs,
            distance: sanitize(distance),
            duration: sanitize(duration),
            geometry,
        })
    }

    /// Convenience constructor for a single-leg route.
    pub fn from_steps(steps: Vec<Step>) -> Option<Self> {
        Self::new(vec![Leg::new(steps)])
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Total route length in meters.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Total route travel time in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Overview polyline for display.
    pub fn geometry(&self) -> &[GpsPoint] {
        &self.geometry
    }

    /// All steps across all legs, in travel order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> + '_ {
        self.legs.iter().flat_map(|l| l.steps.iter())
    }

    pub fn step_count(&self) -> usize {
        self.legs.iter().map(|l| l.steps.len()).sum()
    }

    /// Step at a flat index across legs.
    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps().nth(index)
    }

    /// Final coordinate of the route geometry.
    pub fn end_point(&self) -> Option<GpsPoint> {
        self.steps()
            .filter_map(|s| s.geometry.last())
            .last()
            .copied()
            .or_else(|| self.geometry.last().copied())
    }

    /// Bounding box of the overview geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.geometry)
    }
}

/// Primary route plus alternates, as returned by one directions request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSet {
    pub primary: Route,
    pub alternates: Vec<Route>,
}

impl RouteSet {
    pub fn new(primary: Route, alternates: Vec<Route>) -> Self {
        Self { primary, alternates }
    }

    /// Parse and normalize a Directions API JSON body.
    ///
    /// Returns `None` when the body is not valid JSON or holds no usable route.
    pub fn from_directions_json(body: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<DirectionsResponse>(body) {
            Ok(response) => Self::from_response(response),
            Err(e) => {
                warn!("[Directions] Malformed response: {}", e);
                None
            }
        }
    }

    fn from_response(response: DirectionsResponse) -> Option<Self> {
        if response.code != "Ok" {
            warn!(
                "[Directions] Provider returned {}: {}",
                response.code,
                response.message.as_deref().unwrap_or("no message")
            );
            return None;
        }

        let mut routes = response.routes.into_iter();
        let Some(primary) = routes.next().and_then(ApiRoute::normalize) else {
            warn!("[Directions] Primary route has no usable step geometry");
            return None;
        };

        let alternates: Vec<Route> = routes
            .filter_map(|api| {
                let route = api.normalize();
                if route.is_none() {
                    debug!("[Directions] Skipping alternate without step geometry");
                }
                route
            })
            .collect();
        Some(Self { primary, alternates })
    }

    /// Bounding box of every route in the set, for an overview camera.
    pub fn overview_bounds(&self) -> Option<Bounds> {
        let all: Vec<GpsPoint> = std::iter::once(&self.primary)
            .chain(self.alternates.iter())
            .flat_map(|r| r.geometry.iter().copied())
            .collect();
        Bounds::from_points(&all)
    }
}

#[inline]
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

// ============================================================================
// Provider DTOs (Mapbox Directions v5)
// ============================================================================

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    geometry: Option<ApiGeometry>,
    #[serde(default)]
    legs: Vec<ApiLeg>,
}

#[derive(Debug, Deserialize)]
struct ApiGeometry {
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    steps: Vec<ApiStep>,
}

#[derive(Debug, Deserialize)]
struct ApiStep {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    geometry: Option<ApiGeometry>,
    #[serde(default)]
    name: String,
    maneuver: ApiManeuver,
}

#[derive(Debug, Deserialize)]
struct ApiManeuver {
    #[serde(rename = "type", default)]
    kind: String,
    modifier: Option<String>,
    #[serde(default)]
    instruction: String,
    #[serde(default)]
    bearing_before: f64,
    #[serde(default)]
    bearing_after: f64,
    location: Option<[f64; 2]>,
}

/// Provider coordinates are `[lng, lat]`; invalid pairs are dropped.
fn to_points(geometry: Option<ApiGeometry>) -> Vec<GpsPoint> {
    geometry
        .map(|g| {
            g.coordinates
                .into_iter()
                .map(|[lng, lat]| GpsPoint::new(lat, lng))
                .filter(|p| p.is_valid())
                .collect()
        })
        .unwrap_or_default()
}

impl ApiRoute {
    fn normalize(self) -> Option<Route> {
        let legs: Vec<Leg> = self.legs.into_iter().map(ApiLeg::normalize).collect();
        Route::with_overview(legs, self.distance, self.duration, to_points(self.geometry))
    }
}

impl ApiLeg {
    fn normalize(self) -> Leg {
        let steps: Vec<Step> = self.steps.into_iter().map(ApiStep::normalize).collect();
        let mut leg = Leg::new(steps);
        leg.summary = self.summary;
        if self.distance > 0.0 {
            leg.distance = self.distance;
        }
        if self.duration > 0.0 {
            leg.duration = self.duration;
        }
        leg
    }
}

impl ApiStep {
    fn normalize(self) -> Step {
        let location = self
            .maneuver
            .location
            .map(|[lng, lat]| GpsPoint::new(lat, lng))
            .filter(|p| p.is_valid());
        let maneuver = Maneuver {
            kind: self.maneuver.kind,
            modifier: self.maneuver.modifier,
            instruction: self.maneuver.instruction,
            bearing_before: self.maneuver.bearing_before,
            bearing_after: self.maneuver.bearing_after,
            location,
        };
        Step::new(to_points(self.geometry), self.distance, self.duration, maneuver).with_name(&self.name)
    }
}
