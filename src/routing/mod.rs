//! Route resolution and turn-by-turn guidance.
//!
//! Provides static (pre-authored) and dynamic (routing-service) routes.

pub mod guidance;
pub mod provider;
pub mod service;

use crate::geo::LatLng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types
pub use guidance::InstructionTracker;
pub use provider::{RouteMode, RouteProvider, RouteRequest};
pub use service::{OsrmRoutingService, RoutingService};

/// Routing-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("Path needs at least 2 points, got {0}")]
    InvalidPath(usize),

    #[error("No route found")]
    NoRoute,

    #[error("Routing request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid routing response: {0}")]
    InvalidResponse(String),

    #[error("Routing request timed out")]
    Timeout,
}

/// Kind of manoeuvre at an instruction point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManeuverType {
    Depart,
    #[default]
    Turn,
    Continue,
    Merge,
    Fork,
    Roundabout,
    Arrive,
    Other,
}

impl ManeuverType {
    /// Parse the maneuver type string used by OSRM-compatible services
    pub fn from_osrm(kind: &str) -> Self {
        match kind {
            "depart" => ManeuverType::Depart,
            "turn" | "end of road" | "on ramp" | "off ramp" => ManeuverType::Turn,
            "continue" | "new name" | "notification" => ManeuverType::Continue,
            "merge" => ManeuverType::Merge,
            "fork" => ManeuverType::Fork,
            "roundabout" | "rotary" | "roundabout turn" | "exit roundabout" | "exit rotary" => {
                ManeuverType::Roundabout
            }
            "arrive" => ManeuverType::Arrive,
            _ => ManeuverType::Other,
        }
    }
}

/// One turn-by-turn instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    /// Human-readable instruction
    pub text: String,
    /// Remaining distance to the manoeuvre in meters
    pub distance_meters: f64,
    pub maneuver_type: ManeuverType,
    /// Direction modifier ("left", "slight right", ...)
    #[serde(default)]
    pub modifier: Option<String>,
}

impl Instruction {
    pub fn new(text: impl Into<String>, distance_meters: f64, maneuver_type: ManeuverType) -> Self {
        Self {
            text: text.into(),
            distance_meters,
            maneuver_type,
            modifier: None,
        }
    }

    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = Some(modifier.into());
        self
    }

    /// Banner text: "Turn left in 350 m" / "... in 1.2 km"
    pub fn banner(&self) -> String {
        format!("{} in {}", self.text, format_distance(self.distance_meters))
    }
}

/// A resolved route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Ordered route geometry, at least 2 points
    pub polyline: Vec<LatLng>,
    /// Ordered instructions, consumed front to back
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

impl RouteResult {
    /// Build a route, rejecting polylines with fewer than 2 points.
    pub fn new(polyline: Vec<LatLng>, instructions: Vec<Instruction>) -> Result<Self, RoutingError> {
        if polyline.len() < 2 {
            return Err(RoutingError::InvalidPath(polyline.len()));
        }
        Ok(Self {
            polyline,
            instructions,
        })
    }

    /// Route length in meters along the polyline
    pub fn length_m(&self) -> f64 {
        crate::geo::path_length(&self.polyline)
    }

    pub fn start(&self) -> Option<LatLng> {
        self.polyline.first().copied()
    }

    pub fn end(&self) -> Option<LatLng> {
        self.polyline.last().copied()
    }
}

/// Format a distance for display
pub fn format_distance(meters: f64) -> String {
    let whole_meters = meters.max(0.0).round();
    if whole_meters < 1000.0 {
        format!("{:.0} m", whole_meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}
