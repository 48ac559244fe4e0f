//! Simulated vehicle kinematics.
//!
//! Nothing here is measured: RPM, gear, g-force and lean are derived from the
//! speed samples of the state channel so the gauges have something plausible
//! to show.

use serde::{Deserialize, Serialize};

/// Idle engine speed shown while stationary.
pub const IDLE_RPM: u32 = 1000;
/// Engine speed at the bottom of the simulated rev band.
pub const BASE_RPM: u32 = 3000;
/// Width of the simulated rev band.
pub const RPM_BAND: f64 = 7000.0;
/// Speed delta (km/h per tick) that maps to 1 g.
pub const G_FORCE_DIVISOR: f64 = 30.0;
/// Peak cosmetic lean angle in demo mode.
pub const DEMO_LEAN_AMPLITUDE_DEG: f64 = 25.0;
/// Period divisor for the demo lean oscillation.
pub const DEMO_LEAN_PERIOD_MS: f64 = 800.0;

/// Gear indicator position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gear {
    #[default]
    #[serde(rename = "N")]
    Neutral,
    #[serde(rename = "1")]
    First,
    #[serde(rename = "2")]
    Second,
    #[serde(rename = "3")]
    Third,
    #[serde(rename = "4")]
    Fourth,
    #[serde(rename = "5")]
    Fifth,
    #[serde(rename = "6")]
    Sixth,
}

impl Gear {
    /// Single character shown on the gear indicator.
    pub fn as_char(&self) -> char {
        match self {
            Gear::Neutral => 'N',
            Gear::First => '1',
            Gear::Second => '2',
            Gear::Third => '3',
            Gear::Fourth => '4',
            Gear::Fifth => '5',
            Gear::Sixth => '6',
        }
    }
}

impl std::fmt::Display for Gear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Simulated engine speed for a road speed.
///
/// `3000 + (speed * 50) mod 7000` while moving, idle otherwise.
pub fn derive_rpm(speed_kmh: f64) -> u32 {
    if speed_kmh > 0.0 {
        BASE_RPM + ((speed_kmh * 50.0) % RPM_BAND) as u32
    } else {
        IDLE_RPM
    }
}

/// Gear bin for a road speed. Upper bounds are exclusive.
pub fn derive_gear(speed_kmh: f64) -> Gear {
    if speed_kmh <= 0.0 {
        Gear::Neutral
    } else if speed_kmh < 20.0 {
        Gear::First
    } else if speed_kmh < 40.0 {
        Gear::Second
    } else if speed_kmh < 70.0 {
        Gear::Third
    } else if speed_kmh < 100.0 {
        Gear::Fourth
    } else if speed_kmh < 130.0 {
        Gear::Fifth
    } else {
        Gear::Sixth
    }
}

/// Longitudinal g-force from two consecutive speed samples, two decimals.
pub fn derive_g_force(prev_speed_kmh: f64, new_speed_kmh: f64, low_power: bool) -> f64 {
    if low_power {
        return 0.0;
    }
    round2((new_speed_kmh - prev_speed_kmh) / G_FORCE_DIVISOR)
}

/// Cosmetic lean angle; only animated in demo mode with full power.
pub fn derive_lean(t_ms: f64, demo: bool, low_power: bool) -> f64 {
    if !demo || low_power {
        return 0.0;
    }
    (t_ms / DEMO_LEAN_PERIOD_MS).sin() * DEMO_LEAN_AMPLITUDE_DEG
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
