//! Position sources and the position filter.
//!
//! Raw fixes come either from a device watch ([`source::LiveLocationSource`])
//! or from the synthetic generator ([`demo::DemoLocationSource`]). Whichever
//! is active feeds the [`filter::PositionFilter`], which paces them into the
//! render and state channels.

pub mod demo;
pub mod filter;
pub mod import;
pub mod source;

use crate::geo::LatLng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use demo::DemoLocationSource;
pub use filter::{FilterOutput, PositionFilter, RenderUpdate, StateUpdate, Throttle};
pub use source::{ChannelDevice, DeviceFeeder, DeviceLocation, DeviceWatch, LiveEvent, LiveLocationSource};

/// One reported position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Ground speed in m/s, when the provider reports it
    #[serde(default)]
    pub speed_meters_per_second: Option<f64>,
    /// Course over ground in degrees, when the provider reports it
    #[serde(default)]
    pub heading_degrees: Option<f64>,
    /// Altitude above sea level in meters
    #[serde(default)]
    pub altitude_m: Option<f64>,
    /// Horizontal accuracy radius in meters
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    /// Provider timestamp in milliseconds
    pub timestamp_ms: u64,
}

impl PositionFix {
    /// A bare fix with only a position and a timestamp.
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: u64) -> Self {
        Self {
            latitude,
            longitude,
            speed_meters_per_second: None,
            heading_degrees: None,
            altitude_m: None,
            accuracy_m: None,
            timestamp_ms,
        }
    }

    pub fn with_speed(mut self, meters_per_second: f64) -> Self {
        self.speed_meters_per_second = Some(meters_per_second);
        self
    }

    pub fn with_heading(mut self, degrees: f64) -> Self {
        self.heading_degrees = Some(degrees);
        self
    }

    pub fn with_altitude(mut self, meters: f64) -> Self {
        self.altitude_m = Some(meters);
        self
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy_m = Some(meters);
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Reported speed converted to km/h.
    pub fn speed_kmh(&self) -> Option<f64> {
        self.speed_meters_per_second.map(|mps| mps * 3.6)
    }
}

/// Live tracking status shown on the GPS indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpsStatus {
    /// Live tracking not armed
    #[default]
    Off,
    /// Armed, waiting for a valid fix
    Searching,
    /// Receiving valid fixes
    Active,
}

impl std::fmt::Display for GpsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpsStatus::Off => write!(f, "Off"),
            GpsStatus::Searching => write!(f, "Searching"),
            GpsStatus::Active => write!(f, "Active"),
        }
    }
}

/// Which producer a fix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOrigin {
    Live,
    Demo,
}

/// Constraints applied to a live watch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchOptions {
    /// Reject fixes less accurate than `max_accuracy_m`
    pub high_accuracy: bool,
    /// Report a timeout when no fix arrives within this window; 0 disables it
    pub timeout_ms: u64,
    /// Reject fixes older than this; 0 disables the check
    pub maximum_age_ms: u64,
    /// Accuracy limit used when `high_accuracy` is on
    pub max_accuracy_m: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 0,
            max_accuracy_m: 50.0,
        }
    }
}

/// Location-related errors. All of them are recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("No position within {0} ms")]
    Timeout(u64),

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Fix accuracy {accuracy_m:.0}m exceeds limit {limit_m:.0}m")]
    InaccurateFix { accuracy_m: f64, limit_m: f64 },

    #[error("Fix is {age_ms} ms old")]
    StaleFix { age_ms: u64 },
}
