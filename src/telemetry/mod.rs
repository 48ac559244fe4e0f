//! Derived vehicle telemetry.
//!
//! A [`TelemetryFrame`] is recomputed on every state-channel tick from the
//! last two speed samples. Frames have no identity and are never stored.

pub mod kinematics;

use serde::{Deserialize, Serialize};

pub use kinematics::{derive_g_force, derive_gear, derive_lean, derive_rpm, Gear};

/// Slope readout is clamped to this magnitude.
pub const MAX_SLOPE_PERCENT: f64 = 30.0;
/// Distance steps shorter than this do not update the slope.
const MIN_SLOPE_STEP_M: f64 = 1.0;

/// Instantaneous gauge readout.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub speed_kmh: f64,
    pub simulated_rpm: u32,
    pub gear: Gear,
    pub lean_angle_degrees: f64,
    pub g_force: f64,
    pub altitude_m: f64,
    pub slope_percent: f64,
}

/// Input for one telemetry recomputation.
#[derive(Debug, Clone, Copy)]
pub struct KinematicSample {
    /// Speed at the previous state tick
    pub prev_speed_kmh: f64,
    /// Speed at this state tick
    pub speed_kmh: f64,
    /// Distance travelled since the previous state tick
    pub distance_m: f64,
    /// Reported altitude, if the fix carried one
    pub altitude_m: Option<f64>,
    /// Session clock
    pub t_ms: u64,
    /// Whether the sample came from the demo source
    pub demo: bool,
}

/// Turns state-channel samples into telemetry frames.
#[derive(Debug, Default)]
pub struct TelemetryCalculator {
    low_power: bool,
    altitude_m: Option<f64>,
    slope_percent: f64,
}

impl TelemetryCalculator {
    /// Create a calculator; `low_power` disables g-force and lean.
    pub fn new(low_power: bool) -> Self {
        Self {
            low_power,
            ..Default::default()
        }
    }

    pub fn set_low_power(&mut self, enabled: bool) {
        self.low_power = enabled;
    }

    pub fn low_power(&self) -> bool {
        self.low_power
    }

    /// Derive the frame for one state tick.
    pub fn update(&mut self, sample: &KinematicSample) -> TelemetryFrame {
        if let Some(alt) = sample.altitude_m {
            if let Some(prev) = self.altitude_m {
                if sample.distance_m >= MIN_SLOPE_STEP_M {
                    self.slope_percent = ((alt - prev) / sample.distance_m * 100.0)
                        .clamp(-MAX_SLOPE_PERCENT, MAX_SLOPE_PERCENT);
                }
            }
            self.altitude_m = Some(alt);
        }

        TelemetryFrame {
            speed_kmh: sample.speed_kmh,
            simulated_rpm: derive_rpm(sample.speed_kmh),
            gear: derive_gear(sample.speed_kmh),
            lean_angle_degrees: derive_lean(sample.t_ms as f64, sample.demo, self.low_power),
            g_force: derive_g_force(sample.prev_speed_kmh, sample.speed_kmh, self.low_power),
            altitude_m: self.altitude_m.unwrap_or(0.0),
            slope_percent: self.slope_percent,
        }
    }

    /// Forget altitude history, e.g. when a new ride starts.
    pub fn reset(&mut self) {
        self.altitude_m = None;
        self.slope_percent = 0.0;
    }
}
