//! RideMode - Real-time Navigation & Telemetry Engine
//!
//! Fuses live or simulated position fixes into a moving-map display,
//! derives vehicle telemetry, drives turn-by-turn guidance through an
//! external routing service and coordinates media playback, all under
//! fixed update-rate budgets.

pub mod config;
pub mod error;
pub mod geo;
pub mod location;
pub mod map;
pub mod media;
pub mod routing;
pub mod session;
pub mod telemetry;

// Re-export commonly used types
pub use config::RideConfig;
pub use error::RideError;
pub use geo::LatLng;
pub use location::PositionFix;
pub use routing::RouteResult;
pub use session::{RideCommand, RideController, RideRuntime, RideSnapshot};
pub use telemetry::TelemetryFrame;
