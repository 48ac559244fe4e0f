//! Session-level error taxonomy.
//!
//! Every external call maps onto one of three recoverable kinds. None of
//! them ends a ride; leaving Ride Mode is a user action, not an error.

use crate::location::LocationError;
use crate::media::MediaError;
use crate::routing::RoutingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RideError {
    /// Shown only as the GPS status indicator
    #[error("Location unavailable: {0}")]
    LocationUnavailable(#[from] LocationError),

    /// Leaves the route empty and the banner neutral
    #[error("Route resolution failed: {0}")]
    RouteResolutionFailed(#[from] RoutingError),

    /// Recovered by skipping to the next track
    #[error("Playback failed: {0}")]
    PlaybackFailed(#[from] MediaError),
}

impl RideError {
    /// Whether the error should end the ride session.
    pub fn is_fatal(&self) -> bool {
        false
    }
}
