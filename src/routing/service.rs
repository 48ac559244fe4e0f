//! External routing service client.
//!
//! Talks to an OSRM-compatible HTTP API.

use super::{Instruction, ManeuverType, RouteResult, RoutingError};
use crate::config::RoutingSettings;
use crate::geo::LatLng;
use serde::Deserialize;
use std::time::Duration;

/// Trait for routing backends
pub trait RoutingService: Send + Sync {
    /// Resolve a route between two coordinates
    fn route(
        &self,
        from: LatLng,
        to: LatLng,
    ) -> impl std::future::Future<Output = Result<RouteResult, RoutingError>> + Send;
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: [lng, lat]
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    distance: f64,
    #[serde(default)]
    name: String,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
}

/// OSRM HTTP routing client
pub struct OsrmRoutingService {
    http: reqwest::Client,
    base_url: String,
    profile: String,
}

impl OsrmRoutingService {
    pub fn new(settings: &RoutingSettings) -> Result<Self, RoutingError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| RoutingError::RequestFailed(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.service_url.trim_end_matches('/').to_string(),
            profile: settings.profile.clone(),
        })
    }

    /// Build API URL
    fn build_url(&self, from: LatLng, to: LatLng) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson&steps=true",
            self.base_url, self.profile, from.lng, from.lat, to.lng, to.lat
        )
    }
}

impl RoutingService for OsrmRoutingService {
    async fn route(&self, from: LatLng, to: LatLng) -> Result<RouteResult, RoutingError> {
        let url = self.build_url(from, to);
        tracing::debug!("Requesting route {} -> {}", from, to);

        let response = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                RoutingError::Timeout
            } else {
                RoutingError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RoutingError::RequestFailed(e.to_string()))?;

        // OSRM reports NoRoute with a 400 and a JSON body
        if !status.is_success() && !status.is_client_error() {
            return Err(RoutingError::RequestFailed(format!("HTTP {}", status)));
        }

        parse_osrm_response(&body)
    }
}

/// Parse an OSRM route response body.
pub fn parse_osrm_response(body: &str) -> Result<RouteResult, RoutingError> {
    let response: OsrmResponse =
        serde_json::from_str(body).map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

    if response.code != "Ok" {
        tracing::warn!(
            "Routing service returned {}: {}",
            response.code,
            response.message.as_deref().unwrap_or("")
        );
        return Err(RoutingError::NoRoute);
    }

    let route = response.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;

    let polyline: Vec<LatLng> = route
        .geometry
        .coordinates
        .iter()
        .map(|[lng, lat]| LatLng::new(*lat, *lng))
        .collect();

    let instructions = route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .map(step_instruction)
        .collect();

    RouteResult::new(polyline, instructions)
}

fn step_instruction(step: &OsrmStep) -> Instruction {
    let maneuver_type = ManeuverType::from_osrm(&step.maneuver.kind);
    let modifier = step.maneuver.modifier.as_deref();

    let verb = match maneuver_type {
        ManeuverType::Depart => "Head".to_string(),
        ManeuverType::Arrive => "Arrive at destination".to_string(),
        ManeuverType::Roundabout => "Take the roundabout".to_string(),
        ManeuverType::Merge => "Merge".to_string(),
        ManeuverType::Fork => match modifier {
            Some(m) => format!("Keep {}", m),
            None => "Keep ahead".to_string(),
        },
        ManeuverType::Continue => "Continue".to_string(),
        ManeuverType::Turn | ManeuverType::Other => match modifier {
            Some("straight") => "Go straight".to_string(),
            Some("uturn") => "Make a U-turn".to_string(),
            Some(m) => format!("Turn {}", m),
            None => "Continue".to_string(),
        },
    };

    let text = if step.name.is_empty() || maneuver_type == ManeuverType::Arrive {
        verb
    } else {
        format!("{} onto {}", verb, step.name)
    };

    let instruction = Instruction::new(text, step.distance, maneuver_type);
    match modifier {
        Some(m) => instruction.with_modifier(m),
        None => instruction,
    }
}
