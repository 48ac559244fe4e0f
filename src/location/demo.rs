//! Synthetic position source for demo rides.
//!
//! Replays the points of a path once per tick, looping the index modulo the
//! path length, with a smoothly oscillating speed. It cannot fail.

use super::PositionFix;
use crate::config::DemoSettings;
use crate::geo::{destination_point, LatLng};

/// Period divisor of the synthetic altitude wave.
const ALTITUDE_PERIOD_MS: f64 = 5000.0;

/// Replays a path as a stream of fixes.
#[derive(Debug, Clone)]
pub struct DemoLocationSource {
    path: Vec<LatLng>,
    index: usize,
    settings: DemoSettings,
    emitted: u64,
}

impl DemoLocationSource {
    /// Create a source over `path`. An empty path falls back to the
    /// generated loop around the configured origin.
    pub fn new(path: Vec<LatLng>, settings: DemoSettings) -> Self {
        let path = if path.is_empty() {
            loop_path(settings.origin, settings.loop_radius_m, settings.loop_points)
        } else {
            path
        };
        Self {
            path,
            index: 0,
            settings,
            emitted: 0,
        }
    }

    /// Replace the replayed path and restart from its first point.
    ///
    /// An empty path switches back to the generated loop.
    pub fn set_path(&mut self, path: Vec<LatLng>) {
        self.path = if path.is_empty() {
            loop_path(
                self.settings.origin,
                self.settings.loop_radius_m,
                self.settings.loop_points,
            )
        } else {
            path
        };
        self.index = 0;
        tracing::debug!("Demo path replaced ({} points)", self.path.len());
    }

    /// Produce the fix for the tick at `now_ms` and advance the index.
    pub fn next_fix(&mut self, now_ms: u64) -> PositionFix {
        let len = self.path.len();
        let here = self.path[self.index % len];
        let next = self.path[(self.index + 1) % len];
        self.index = (self.index + 1) % len;
        self.emitted += 1;

        let t = now_ms as f64;
        let speed_kmh = self.settings.base_speed_kmh
            + self.settings.speed_amplitude_kmh * (t / self.settings.speed_period_ms).sin();
        let altitude = self.settings.base_altitude_m
            + self.settings.altitude_amplitude_m * (t / ALTITUDE_PERIOD_MS).sin();

        let mut fix = PositionFix::new(here.lat, here.lng, now_ms)
            .with_speed(speed_kmh / 3.6)
            .with_altitude(altitude);
        if next != here {
            fix = fix.with_heading(here.bearing_to(&next));
        }
        fix
    }

    /// Index of the point the next tick will emit.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &[LatLng] {
        &self.path
    }

    /// Number of fixes produced since creation.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

/// Closed loop of `points` coordinates around `center`.
pub fn loop_path(center: LatLng, radius_m: f64, points: usize) -> Vec<LatLng> {
    let points = points.max(2);
    (0..points)
        .map(|i| destination_point(center, 360.0 * i as f64 / points as f64, radius_m))
        .collect()
}
