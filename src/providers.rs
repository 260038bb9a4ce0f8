//! Interfaces to the outside world: routing, map matching and the map camera.
//!
//! The session never calls these directly. It queues
//! [`NavigationCommand`](crate::NavigationCommand)s, and a driver such as
//! [`Navigator`](crate::Navigator) dispatches them here.
//!
//! Provider methods return boxed futures so the traits stay object safe and
//! implementations can be swapped for fakes in tests.

use std::future::Future;
use std::pin::Pin;

use crate::camera::CameraPose;
use crate::error::Result;
use crate::route::RouteSet;
use crate::session::{RouteRequest, SnapRequest};
use crate::GpsPoint;

/// Boxed future returned by provider calls.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Computes routes between two points.
pub trait DirectionsProvider: Send + Sync {
    /// Fetch a primary route and, when requested, alternates.
    ///
    /// `Ok(None)` means the provider answered without a usable route; `Err`
    /// is a transport or decoding failure. The session treats both as a
    /// failed fetch.
    fn get_route<'a>(&'a self, request: &'a RouteRequest) -> ProviderFuture<'a, Option<RouteSet>>;
}

/// Snaps a batch of raw fixes to the road network.
pub trait MapMatchingProvider: Send + Sync {
    /// Corrected position for the most recent fix of the batch, or `None`
    /// when the service found no match.
    fn snap<'a>(&'a self, request: &'a SnapRequest) -> ProviderFuture<'a, Option<GpsPoint>>;
}

/// The map view the camera-follow controller drives.
pub trait CameraSurface: Send + Sync {
    /// Animate the camera to `pose`.
    fn apply_pose(&self, pose: &CameraPose);

    /// Current camera center, if the map is loaded.
    fn center(&self) -> Option<GpsPoint>;

    /// Viewport height in pixels, if known.
    fn viewport_height(&self) -> Option<f64> {
        None
    }
}
