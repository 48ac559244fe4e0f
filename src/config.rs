//! Ride configuration.
//!
//! Loaded from `config.toml` in the platform data directory or from an
//! explicit path. Every section falls back to its defaults when omitted.

use crate::geo::LatLng;
use crate::location::WatchOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RideConfig {
    /// Position filter cadences
    pub filter: FilterSettings,
    /// Demo ride generator
    pub demo: DemoSettings,
    /// Live geolocation watch
    pub location: LocationSettings,
    /// External routing service
    pub routing: RoutingSettings,
    /// Kinematics and trail
    pub telemetry: TelemetrySettings,
    /// Media playback
    pub media: MediaSettings,
    /// Quick-navigation destinations
    pub quick_nav: QuickNavSettings,
}

/// Position filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Minimum gap between render updates in milliseconds
    pub render_interval_ms: u64,
    /// Minimum gap between state updates in milliseconds
    pub state_interval_ms: u64,
    /// Live rides pan the map only above this speed
    pub pan_speed_threshold_kmh: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            render_interval_ms: 50,
            state_interval_ms: 100,
            pan_speed_threshold_kmh: 5.0,
        }
    }
}

/// Demo ride settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Tick period of the synthetic source in milliseconds
    pub tick_interval_ms: u64,
    /// Centre of the oscillating speed in km/h
    pub base_speed_kmh: f64,
    /// Speed swing around the base in km/h
    pub speed_amplitude_kmh: f64,
    /// Divisor applied to elapsed milliseconds before the sine
    pub speed_period_ms: f64,
    /// Centre of the fallback loop when no path is available
    pub origin: LatLng,
    pub loop_radius_m: f64,
    pub loop_points: usize,
    pub base_altitude_m: f64,
    pub altitude_amplitude_m: f64,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            base_speed_kmh: 80.0,
            speed_amplitude_kmh: 10.0,
            speed_period_ms: 1000.0,
            origin: LatLng::new(45.4642, 9.1900),
            loop_radius_m: 800.0,
            loop_points: 36,
            base_altitude_m: 250.0,
            altitude_amplitude_m: 20.0,
        }
    }
}

/// Live location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSettings {
    /// Request high-accuracy fixes
    pub high_accuracy: bool,
    /// Per-reading timeout in milliseconds (0 disables the timeout)
    pub timeout_ms: u64,
    /// Maximum accepted fix age in milliseconds (0 disables the check)
    pub maximum_age_ms: u64,
    /// Reject fixes less accurate than this when high accuracy is on
    pub max_accuracy_m: f64,
    /// Delay before re-registering a watch after permission is denied
    pub retry_interval_ms: u64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 0,
            max_accuracy_m: 50.0,
            retry_interval_ms: 5_000,
        }
    }
}

impl LocationSettings {
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            high_accuracy: self.high_accuracy,
            timeout_ms: self.timeout_ms,
            maximum_age_ms: self.maximum_age_ms,
            max_accuracy_m: self.max_accuracy_m,
        }
    }
}

/// Routing service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Base URL of an OSRM-compatible service
    pub service_url: String,
    /// Routing profile ("driving", "cycling", ...)
    pub profile: String,
    pub request_timeout_secs: u64,
    /// Move to the next instruction when the current one reaches zero
    pub auto_advance: bool,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            service_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            request_timeout_secs: 10,
            auto_advance: false,
        }
    }
}

/// Telemetry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Suppress g-force and lean derivation
    pub low_power_mode: bool,
    /// Number of recent positions kept in the trail
    pub trail_capacity: usize,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            low_power_mode: false,
            trail_capacity: 50,
        }
    }
}

/// Media playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Delay before skipping a track that failed
    pub recovery_delay_ms: u64,
    /// Start playing as soon as the player is ready
    pub autoplay: bool,
    /// Remote playlist endpoint
    pub playlist_url: Option<String>,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            recovery_delay_ms: 1_500,
            autoplay: true,
            playlist_url: None,
        }
    }
}

/// A quick-navigation candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    /// Advertised distance from the rider
    pub distance_km: f64,
    /// Known location, used for external handoff when present
    #[serde(default)]
    pub location: Option<LatLng>,
}

impl Destination {
    pub fn new(name: impl Into<String>, distance_km: f64) -> Self {
        Self {
            name: name.into(),
            distance_km,
            location: None,
        }
    }
}

/// Quick-navigation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickNavSettings {
    pub destinations: Vec<Destination>,
}

impl Default for QuickNavSettings {
    fn default() -> Self {
        Self {
            destinations: vec![
                Destination::new("Fuel Station", 2.5),
                Destination::new("Cafe Racer", 8.0),
                Destination::new("Home", 15.0),
                Destination::new("Mountain Pass", 42.0),
            ],
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "ridemode", "RideMode")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load configuration from the default location.
pub fn load_config() -> Result<RideConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load configuration from `path`. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<RideConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(RideConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let config: RideConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Save configuration to the default location.
pub fn save_config(config: &RideConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save configuration to `path`.
pub fn save_config_to(config: &RideConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
