//! Error types for the navigation engine

use thiserror::Error;

/// Navigation engine error type
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error), uniffi(flat_error))]
pub enum NavigationError {
    /// No position fix was available when one was required.
    #[error("Location not available")]
    LocationUnavailable,

    /// The directions provider returned no usable route.
    #[error("Could not calculate route")]
    RouteFetchFailure,

    /// A reroute request failed; the session keeps its current route.
    #[error("Reroute failed: {0}")]
    RerouteFailure(String),

    /// The map-matching service failed; the raw fix is used instead.
    #[error("Map matching failed: {0}")]
    MapMatchingFailure(String),

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("Alternative {index} out of range ({available} available)")]
    AlternativeOutOfRange { index: usize, available: usize },

    /// A provider response arrived for a session generation that no longer exists.
    #[error("Discarded stale response (generation {request_generation}, current {current_generation})")]
    StaleResponse {
        request_generation: u64,
        current_generation: u64,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, NavigationError>;
