//! Ride session data.

use crate::geo::LatLng;
use crate::location::GpsStatus;
use crate::routing::Instruction;
use crate::telemetry::TelemetryFrame;
use serde::{Deserialize, Serialize};

/// Banner shown when there is no instruction to display.
pub const IDLE_BANNER: &str = "System ready";

/// Top-level ride mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideMode {
    #[default]
    Idle,
    /// Live tracking armed
    GpsArmed,
    /// Simulated ride
    Demo,
}

impl std::fmt::Display for RideMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RideMode::Idle => write!(f, "Idle"),
            RideMode::GpsArmed => write!(f, "GPS armed"),
            RideMode::Demo => write!(f, "Demo"),
        }
    }
}

/// Quick-nav destination being guided to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTarget {
    pub name: String,
    /// Remaining distance
    pub distance_km: f64,
    /// Distance when the target was selected
    pub original_distance_km: f64,
}

impl ActiveTarget {
    pub fn new(name: impl Into<String>, distance_km: f64) -> Self {
        let distance_km = distance_km.max(0.0);
        Self {
            name: name.into(),
            distance_km,
            original_distance_km: distance_km,
        }
    }

    /// Fraction of the distance covered, 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        if self.original_distance_km <= 0.0 {
            return 1.0;
        }
        (1.0 - self.distance_km / self.original_distance_km).clamp(0.0, 1.0)
    }

    /// Count down by `km`. Returns true once the target is reached.
    pub fn travel(&mut self, km: f64) -> bool {
        self.distance_km = (self.distance_km - km.max(0.0)).max(0.0);
        self.distance_km <= 0.0
    }
}

/// Mutable state of one Ride Mode session.
///
/// Route and instruction state live in the route provider; see
/// [`RideController`](super::RideController).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RideSession {
    pub mode: RideMode,
    pub gps_status: GpsStatus,
    pub current_position: Option<LatLng>,
    pub heading_degrees: f64,
    pub speed_kmh: f64,
    pub trip_distance_km: f64,
    pub active_target: Option<ActiveTarget>,
}

impl RideSession {
    /// Clear per-trip values when a ride starts from Idle.
    pub fn reset_trip(&mut self) {
        self.trip_distance_km = 0.0;
        self.speed_kmh = 0.0;
        self.current_position = None;
    }
}

/// Everything the presentation surface needs for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RideSnapshot {
    pub mode: RideMode,
    pub gps_status: GpsStatus,
    pub position: Option<LatLng>,
    pub heading_degrees: f64,
    pub speed_kmh: f64,
    pub trip_distance_km: f64,
    pub active_target: Option<ActiveTarget>,
    pub next_instruction: Option<Instruction>,
    pub banner: String,
    pub telemetry: TelemetryFrame,
    /// Points of the route on the map, 0 when none
    pub route_points: usize,
    /// Route overlays currently drawn
    pub overlay_count: usize,
    /// Title of the current track
    pub now_playing: Option<String>,
    pub is_playing: bool,
}

/// Banner text for an optional instruction.
pub fn banner_text(instruction: Option<&Instruction>) -> String {
    match instruction {
        Some(i) => i.banner(),
        None => IDLE_BANNER.to_string(),
    }
}
