//! Position filter and throttler.
//!
//! Paces raw fixes into two independently throttled channels:
//! - render channel: marker, trail and map panning (default 50 ms minimum)
//! - state channel: speed, heading and telemetry (default 100 ms minimum)
//!
//! Fixes arriving inside a channel's interval are dropped, never queued.
//! Both channels only ever emit the fix being pushed, so neither can show a
//! newer position than the other.

use super::PositionFix;
use crate::geo::{bearing, normalize_degrees, LatLng};

/// Movement below this distance keeps the previous heading.
const MIN_HEADING_STEP_M: f64 = 0.5;

/// Minimum-interval gate with latest-wins semantics.
#[derive(Debug, Clone)]
pub struct Throttle {
    /// Minimum time between emissions
    min_interval_ms: u64,
    /// Time of the last admitted event
    last_emit_ms: Option<u64>,
}

impl Throttle {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_emit_ms: None,
        }
    }

    /// Admit an event at `now_ms` if the interval has elapsed.
    pub fn admit(&mut self, now_ms: u64) -> bool {
        let open = match self.last_emit_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.min_interval_ms,
        };
        if open {
            self.last_emit_ms = Some(now_ms);
        }
        open
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    pub fn reset(&mut self) {
        self.last_emit_ms = None;
    }
}

/// Render-channel emission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderUpdate {
    pub position: LatLng,
    /// Rider marker rotation in degrees
    pub rotation_degrees: f64,
    /// Whether the map should follow the rider
    pub pan: bool,
}

/// State-channel emission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateUpdate {
    pub position: LatLng,
    pub speed_kmh: f64,
    /// Speed at the previous state emission
    pub prev_speed_kmh: f64,
    pub heading_degrees: f64,
    /// Distance since the previous state emission
    pub distance_m: f64,
    pub altitude_m: Option<f64>,
    pub timestamp_ms: u64,
}

/// What a single pushed fix produced.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterOutput {
    pub render: Option<RenderUpdate>,
    pub state: Option<StateUpdate>,
}

impl FilterOutput {
    pub fn is_empty(&self) -> bool {
        self.render.is_none() && self.state.is_none()
    }
}

/// Splits one raw fix stream into the render and state channels.
#[derive(Debug)]
pub struct PositionFilter {
    render: Throttle,
    state: Throttle,
    pan_speed_threshold_kmh: f64,
    last_fix: Option<PositionFix>,
    heading_degrees: f64,
    speed_kmh: f64,
    last_state: Option<(LatLng, f64)>,
    duplicates_dropped: u64,
}

impl PositionFilter {
    /// Create a filter with explicit channel intervals.
    pub fn new(render_interval_ms: u64, state_interval_ms: u64, pan_speed_threshold_kmh: f64) -> Self {
        Self {
            render: Throttle::new(render_interval_ms),
            state: Throttle::new(state_interval_ms),
            pan_speed_threshold_kmh,
            last_fix: None,
            heading_degrees: 0.0,
            speed_kmh: 0.0,
            last_state: None,
            duplicates_dropped: 0,
        }
    }

    /// Push a fix received at `now_ms`. `demo` forces map panning.
    pub fn push(&mut self, fix: PositionFix, now_ms: u64, demo: bool) -> FilterOutput {
        if self.last_fix.as_ref() == Some(&fix) {
            self.duplicates_dropped += 1;
            tracing::trace!("Dropping duplicate fix at {}", fix.timestamp_ms);
            return FilterOutput::default();
        }

        let position = fix.position();
        self.heading_degrees = self.synthesize_heading(&fix);
        self.speed_kmh = self.synthesize_speed(&fix);
        self.last_fix = Some(fix);

        let render = self.render.admit(now_ms).then(|| RenderUpdate {
            position,
            rotation_degrees: self.heading_degrees,
            pan: demo || self.speed_kmh > self.pan_speed_threshold_kmh,
        });

        let state = if self.state.admit(now_ms) {
            let (distance_m, prev_speed_kmh) = match self.last_state {
                Some((prev_pos, prev_speed)) => (prev_pos.distance_to(&position), prev_speed),
                None => (0.0, self.speed_kmh),
            };
            self.last_state = Some((position, self.speed_kmh));
            Some(StateUpdate {
                position,
                speed_kmh: self.speed_kmh,
                prev_speed_kmh,
                heading_degrees: self.heading_degrees,
                distance_m,
                altitude_m: fix.altitude_m,
                timestamp_ms: fix.timestamp_ms,
            })
        } else {
            None
        };

        if render.is_none() && state.is_none() {
            tracing::trace!("Fix throttled on both channels at {} ms", now_ms);
        }

        FilterOutput { render, state }
    }

    fn synthesize_heading(&self, fix: &PositionFix) -> f64 {
        if let Some(heading) = fix.heading_degrees {
            return normalize_degrees(heading);
        }
        match &self.last_fix {
            Some(prev) if prev.position().distance_to(&fix.position()) > MIN_HEADING_STEP_M => {
                bearing(prev.position(), fix.position())
            }
            _ => self.heading_degrees,
        }
    }

    fn synthesize_speed(&self, fix: &PositionFix) -> f64 {
        if let Some(kmh) = fix.speed_kmh() {
            return kmh.max(0.0);
        }
        match &self.last_fix {
            Some(prev) if fix.timestamp_ms > prev.timestamp_ms => {
                let dt_ms = (fix.timestamp_ms - prev.timestamp_ms) as f64;
                // m/ms -> km/h
                prev.position().distance_to(&fix.position()) / dt_ms * 3600.0
            }
            _ => self.speed_kmh,
        }
    }

    /// Current synthesized heading.
    pub fn heading_degrees(&self) -> f64 {
        self.heading_degrees
    }

    /// Number of exact duplicate fixes dropped so far.
    pub fn duplicates_dropped(&self) -> u64 {
        self.duplicates_dropped
    }

    /// Forget all history, e.g. when the producer changes.
    pub fn reset(&mut self) {
        self.render.reset();
        self.state.reset();
        self.last_fix = None;
        self.last_state = None;
        self.speed_kmh = 0.0;
    }
}
