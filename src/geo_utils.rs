//! # Geographic Utilities
//!
//! Core geographic computations used by the navigation engine.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`bearing`] | Initial bearing from one point to another, in `[0, 360)` |
//! | [`nearest_point_on_step`] | Nearest polyline vertex with bearing and distance along |
//! | [`polyline_length`] | Total length of a polyline in meters |
//! | [`meters_to_degrees`] | Convert meters to approximate degrees at a latitude |
//!
//! ## Example
//!
//! ```rust
//! use turn_navigator::{GpsPoint, geo_utils};
//!
//! let a = GpsPoint::new(51.5074, -0.1278);
//! let b = GpsPoint::new(51.5174, -0.1278);
//!
//! let dist = geo_utils::haversine_distance(&a, &b);
//! let heading = geo_utils::bearing(&a, &b);
//! assert!((dist - 1112.0).abs() < 5.0);
//! assert!(heading < 0.5 || heading > 359.5); // due north
//! ```
//!
//! ## Algorithm Notes
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees) and
//! model the Earth as a sphere of radius 6,371 km.
//!
//! [`nearest_point_on_step`] scans polyline *vertices* only; it does not project
//! onto segments. On long, sparsely sampled straight segments the reported
//! deviation can exceed the true perpendicular distance by up to half the
//! segment length.

use geo::{Bearing, Distance, Haversine, Point};
use crate::GpsPoint;

// =============================================================================
// Distance and Bearing
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface.
///
/// # Example
///
/// ```rust
/// use turn_navigator::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    Haversine::distance(to_point(p1), to_point(p2))
}

/// Initial great-circle bearing from `from` to `to`, in degrees clockwise from
/// north, normalized to `[0, 360)`.
///
/// Identical points yield `0.0`.
#[inline]
pub fn bearing(from: &GpsPoint, to: &GpsPoint) -> f64 {
    if from == to {
        return 0.0;
    }
    let degrees = Haversine::bearing(to_point(from), to_point(to)).rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if degrees >= 360.0 { 0.0 } else { degrees }
}

#[inline]
fn to_point(p: &GpsPoint) -> Point<f64> {
    Point::new(p.longitude, p.latitude)
}

/// Calculate the total length of a polyline in meters.
///
/// Empty or single-point polylines return 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Nearest Point
// =============================================================================

/// Where a position sits relative to a step polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct StepProjection {
    /// Distance in meters from the position to the nearest vertex
    pub distance: f64,
    /// Bearing of the polyline segment starting at the nearest vertex (0 for the last vertex)
    pub bearing: f64,
    /// Cumulative polyline distance from the first vertex to the nearest vertex
    pub distance_along: f64,
    /// Index of the nearest vertex
    pub vertex_index: u32,
}

impl StepProjection {
    /// Projection result for a step without geometry.
    pub fn empty() -> Self {
        Self {
            distance: f64::INFINITY,
            bearing: 0.0,
            distance_along: 0.0,
            vertex_index: 0,
        }
    }
}

/// Locate `position` on a step polyline by scanning its vertices.
///
/// Returns the distance to the single nearest vertex, the bearing of the
/// segment that begins at that vertex, and the cumulative distance along the
/// polyline up to it. Ties resolve to the earliest vertex.
///
/// # Example
///
/// ```rust
/// use turn_navigator::{GpsPoint, geo_utils};
///
/// let line: Vec<GpsPoint> = (0..5)
///     .map(|i| GpsPoint::new(51.5 + i as f64 * 0.001, -0.12))
///     .collect();
///
/// let hit = geo_utils::nearest_point_on_step(&GpsPoint::new(51.5021, -0.12), &line);
/// assert_eq!(hit.vertex_index, 2);
/// assert!((hit.distance_along - 222.4).abs() < 1.0);
/// ```
pub fn nearest_point_on_step(position: &GpsPoint, polyline: &[GpsPoint]) -> StepProjection {
    let mut nearest_index = 0usize;
    let mut min_distance = f64::INFINITY;

    for (i, vertex) in polyline.iter().enumerate() {
        let d = haversine_distance(position, vertex);
        if d < min_distance {
            min_distance = d;
            nearest_index = i;
        }
    }

    if !min_distance.is_finite() {
        return StepProjection::empty();
    }

    let distance_along = polyline_length(&polyline[..=nearest_index]);

    let segment_bearing = match polyline.get(nearest_index + 1) {
        Some(next) => bearing(&polyline[nearest_index], next),
        None => 0.0,
    };

    StepProjection {
        distance: min_distance,
        bearing: segment_bearing,
        distance_along,
        vertex_index: nearest_index as u32,
    }
}

/// Convert meters to approximate degrees at a given latitude.
///
/// Uses the east-west scale at `latitude`, so the result is an upper bound
/// for the north-south span as well.
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    let meters_per_degree = 111_320.0 * lat_rad.cos().max(0.1);
    meters / meters_per_degree
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn north_line(count: usize) -> Vec<GpsPoint> {
        (0..count)
            .map(|i| GpsPoint::new(51.5 + i as f64 * 0.001, -0.12))
            .collect()
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GpsPoint::new(51.5074, -0.1278);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_distance_known_value() {
        let london = GpsPoint::new(51.5074, -0.1278);
        let paris = GpsPoint::new(48.8566, 2.3522);
        let dist = haversine_distance(&london, &paris);
        assert!(approx_eq(dist, 343_560.0, 5000.0));
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GpsPoint::new(0.0, 0.0);
        let north = bearing(&origin, &GpsPoint::new(1.0, 0.0));
        let east = bearing(&origin, &GpsPoint::new(0.0, 1.0));
        let south = bearing(&origin, &GpsPoint::new(-1.0, 0.0));
        let west = bearing(&origin, &GpsPoint::new(0.0, -1.0));

        assert!(north < 0.1 || north > 359.9, "north was {}", north);
        assert!(approx_eq(east, 90.0, 0.1), "east was {}", east);
        assert!(approx_eq(south, 180.0, 0.1), "south was {}", south);
        assert!(approx_eq(west, 270.0, 0.1), "west was {}", west);
    }

    #[test]
    fn test_bearing_range() {
        let a = GpsPoint::new(25.2, 55.27);
        for (dlat, dlng) in [(0.01, 0.01), (-0.01, 0.01), (-0.01, -0.01), (0.01, -0.01)] {
            let b = GpsPoint::new(a.latitude + dlat, a.longitude + dlng);
            let h = bearing(&a, &b);
            assert!((0.0..360.0).contains(&h));
        }
        assert_eq!(bearing(&a, &a), 0.0);
    }

    #[test]
    fn test_polyline_length_empty_and_single() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[GpsPoint::new(51.5074, -0.1278)]), 0.0);
    }

    #[test]
    fn test_polyline_length_straight_line() {
        // 0.001 degrees of latitude is ~111.2 m
        let length = polyline_length(&north_line(5));
        assert!(approx_eq(length, 444.8, 1.0), "length was {}", length);
    }

    #[test]
    fn test_nearest_point_first_vertex() {
        let line = north_line(5);
        let hit = nearest_point_on_step(&GpsPoint::new(51.4999, -0.12), &line);
        assert_eq!(hit.vertex_index, 0);
        assert_eq!(hit.distance_along, 0.0);
        assert!(hit.bearing < 0.1 || hit.bearing > 359.9);
    }

    #[test]
    fn test_nearest_point_last_vertex_has_zero_bearing() {
        let line = north_line(5);
        let hit = nearest_point_on_step(&GpsPoint::new(51.5045, -0.12), &line);
        assert_eq!(hit.vertex_index, 4);
        assert_eq!(hit.bearing, 0.0);
        assert!(approx_eq(hit.distance_along, polyline_length(&line), 1e-6));
    }

    #[test]
    fn test_nearest_point_reports_lateral_deviation() {
        let line = north_line(5);
        // ~50 m east of the third vertex
        let offset = meters_to_degrees(50.0, 51.502);
        let hit = nearest_point_on_step(&GpsPoint::new(51.502, -0.12 + offset), &line);
        assert_eq!(hit.vertex_index, 2);
        assert!(approx_eq(hit.distance, 50.0, 2.0), "distance was {}", hit.distance);
    }

    #[test]
    fn test_nearest_point_is_vertex_not_segment() {
        // Two vertices 1112 m apart; a point on the segment midpoint is ~556 m from both
        let line = vec![GpsPoint::new(51.50, -0.12), GpsPoint::new(51.51, -0.12)];
        let hit = nearest_point_on_step(&GpsPoint::new(51.505, -0.12), &line);
        assert!(hit.distance > 500.0);
    }

    #[test]
    fn test_nearest_point_empty_polyline() {
        let hit = nearest_point_on_step(&GpsPoint::new(51.5, -0.12), &[]);
        assert!(hit.distance.is_infinite());
        assert_eq!(hit.distance_along, 0.0);
        assert_eq!(hit.bearing, 0.0);
    }

    #[test]
    fn test_meters_to_degrees() {
        let deg = meters_to_degrees(111_320.0, 0.0);
        assert!(approx_eq(deg, 1.0, 0.01));
        assert!(meters_to_degrees(111_320.0, 45.0) > 1.0);
    }
}
