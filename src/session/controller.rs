//! Ride session state machine.
//!
//! `Idle -> {GpsArmed, Demo}`. The controller is synchronous and takes the
//! session clock as an argument; the runtime owns timers and I/O. Only the
//! producer matching the current mode may feed fixes, so demo and live
//! updates never interleave.

use super::quick_nav::{DeepLinkHandler, GuidanceChoice, QuickNav, QuickNavError, QuickNavOutcome};
use super::state::{banner_text, ActiveTarget, RideMode, RideSession, RideSnapshot};
use crate::config::{DemoSettings, RideConfig};
use crate::error::RideError;
use crate::geo::LatLng;
use crate::location::{
    DemoLocationSource, FixOrigin, GpsStatus, LocationError, PositionFilter, PositionFix,
    RenderUpdate, StateUpdate,
};
use crate::map::{MapSurface, RIDE_ZOOM};
use crate::routing::provider::RouteUpdate;
use crate::routing::{Instruction, RouteProvider, RouteRequest, RouteResult, RoutingError};
use crate::telemetry::{KinematicSample, TelemetryCalculator, TelemetryFrame};

pub struct RideController<M: MapSurface> {
    session: RideSession,
    map: M,
    filter: PositionFilter,
    calculator: TelemetryCalculator,
    telemetry: TelemetryFrame,
    provider: RouteProvider,
    demo: DemoLocationSource,
    demo_settings: DemoSettings,
    /// Time of the first tick of the running demo
    demo_anchor_ms: Option<u64>,
    /// View already centred on the rider during this ride
    view_centred: bool,
    quick_nav: QuickNav,
    /// User asked for live tracking; survives a demo run
    live_requested: bool,
    last_error: Option<RideError>,
}

impl<M: MapSurface> RideController<M> {
    pub fn new(map: M, config: &RideConfig) -> Self {
        Self {
            session: RideSession::default(),
            map,
            filter: PositionFilter::new(
                config.filter.render_interval_ms,
                config.filter.state_interval_ms,
                config.filter.pan_speed_threshold_kmh,
            ),
            calculator: TelemetryCalculator::new(config.telemetry.low_power_mode),
            telemetry: TelemetryFrame::default(),
            provider: RouteProvider::new(config.routing.auto_advance),
            demo: DemoLocationSource::new(Vec::new(), config.demo.clone()),
            demo_settings: config.demo.clone(),
            demo_anchor_ms: None,
            view_centred: false,
            quick_nav: QuickNav::new(config.quick_nav.destinations.clone()),
            live_requested: false,
            last_error: None,
        }
    }

    pub fn session(&self) -> &RideSession {
        &self.session
    }

    pub fn mode(&self) -> RideMode {
        self.session.mode
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn telemetry(&self) -> &TelemetryFrame {
        &self.telemetry
    }

    pub fn current_route(&self) -> Option<&RouteResult> {
        self.provider.current_route()
    }

    pub fn next_instruction(&self) -> Option<&Instruction> {
        self.provider.next_instruction()
    }

    pub fn route_provider(&self) -> &RouteProvider {
        &self.provider
    }

    pub fn demo_source(&self) -> &DemoLocationSource {
        &self.demo
    }

    pub fn quick_nav(&self) -> &QuickNav {
        &self.quick_nav
    }

    /// Most recent recoverable error
    pub fn last_error(&self) -> Option<&RideError> {
        self.last_error.as_ref()
    }

    /// Whether the live watch should be registered.
    ///
    /// The watch stays registered during a demo run so live tracking resumes
    /// when the demo stops.
    pub fn wants_live(&self) -> bool {
        self.live_requested && self.session.mode != RideMode::Idle
    }

    /// Whether demo ticks should be generated.
    pub fn wants_demo_ticks(&self) -> bool {
        self.session.mode == RideMode::Demo
    }

    // Transitions

    /// Arm live tracking.
    pub fn arm_gps(&mut self) {
        self.live_requested = true;
        match self.session.mode {
            RideMode::Idle => {
                self.enter_ride();
                self.session.mode = RideMode::GpsArmed;
                self.session.gps_status = GpsStatus::Searching;
                tracing::info!("GPS armed, searching");
            }
            RideMode::GpsArmed => {}
            RideMode::Demo => {
                // Demo keeps precedence; live resumes when it stops
                self.session.gps_status = GpsStatus::Searching;
                tracing::info!("GPS armed behind running demo");
            }
        }
    }

    /// Toggle live tracking off.
    pub fn disarm_gps(&mut self) {
        self.live_requested = false;
        self.session.gps_status = GpsStatus::Off;
        if self.session.mode == RideMode::GpsArmed {
            self.session.mode = RideMode::Idle;
            self.filter.reset();
            tracing::info!("GPS disarmed");
        }
    }

    /// Start the simulated ride.
    pub fn start_demo(&mut self) {
        match self.session.mode {
            RideMode::Demo => return,
            RideMode::Idle => self.enter_ride(),
            RideMode::GpsArmed => {}
        }
        self.session.mode = RideMode::Demo;
        self.demo_anchor_ms = None;
        self.filter.reset();
        let path = self.demo_path();
        self.demo.set_path(path);
        tracing::info!("Demo ride started ({} points)", self.demo.path().len());
    }

    /// Stop the simulated ride, falling back to live tracking if armed.
    pub fn stop_demo(&mut self) {
        if self.session.mode != RideMode::Demo {
            return;
        }
        self.filter.reset();
        if self.live_requested {
            self.session.mode = RideMode::GpsArmed;
            self.session.gps_status = GpsStatus::Searching;
            tracing::info!("Demo stopped, resuming live tracking");
        } else {
            self.session.mode = RideMode::Idle;
            tracing::info!("Demo stopped");
        }
    }

    /// Leave Ride Mode and release everything the session holds.
    pub fn exit(&mut self) {
        self.live_requested = false;
        self.provider.teardown(&mut self.map);
        self.map.clear_rider();
        self.filter.reset();
        self.calculator.reset();
        self.telemetry = TelemetryFrame::default();
        self.quick_nav.close();
        self.session = RideSession::default();
        tracing::info!("Ride Mode exited");
    }

    /// Fresh entry from Idle: new trip, static path back on the map.
    fn enter_ride(&mut self) {
        self.session.reset_trip();
        self.view_centred = false;
        self.calculator.reset();
        self.telemetry = TelemetryFrame::default();
        if self.session.active_target.is_none() {
            self.provider.show_static(&mut self.map);
        }
    }

    // Position input

    /// Produce and ingest one demo fix. Returns false outside demo mode.
    ///
    /// `now_ms` is snapped to the demo tick grid so wake-up jitter never
    /// brings two ticks closer than the state-channel interval.
    pub fn demo_tick(&mut self, now_ms: u64) -> bool {
        if self.session.mode != RideMode::Demo {
            return false;
        }
        let scheduled_ms = self.demo_schedule(now_ms);
        let fix = self.demo.next_fix(scheduled_ms);
        self.ingest(fix, scheduled_ms, FixOrigin::Demo)
    }

    /// Nearest tick-grid time to `now_ms`, counted from the first demo tick.
    fn demo_schedule(&mut self, now_ms: u64) -> u64 {
        let period = self.demo_settings.tick_interval_ms.max(1);
        let anchor = *self.demo_anchor_ms.get_or_insert(now_ms);
        let steps = (now_ms.saturating_sub(anchor) + period / 2) / period;
        anchor + steps * period
    }

    /// Feed a fix from `origin`. Fixes from a producer that does not match
    /// the current mode are ignored and false is returned.
    pub fn ingest(&mut self, fix: PositionFix, now_ms: u64, origin: FixOrigin) -> bool {
        let accepted = matches!(
            (self.session.mode, origin),
            (RideMode::GpsArmed, FixOrigin::Live) | (RideMode::Demo, FixOrigin::Demo)
        );
        if !accepted {
            tracing::trace!("Ignoring {:?} fix in {} mode", origin, self.session.mode);
            return false;
        }

        if origin == FixOrigin::Live && self.session.gps_status != GpsStatus::Active {
            tracing::info!("GPS fix acquired");
            self.session.gps_status = GpsStatus::Active;
        }

        let demo = origin == FixOrigin::Demo;
        let output = self.filter.push(fix, now_ms, demo);
        if let Some(render) = output.render {
            self.apply_render(render);
        }
        if let Some(state) = output.state {
            self.apply_state(state, now_ms, demo);
        }
        true
    }

    /// Report a live source failure. Status drops back to searching.
    pub fn on_location_error(&mut self, error: LocationError) {
        if !self.live_requested {
            return;
        }
        if self.session.mode == RideMode::GpsArmed {
            self.session.gps_status = GpsStatus::Searching;
        }
        self.note_error(error.into());
    }

    fn apply_render(&mut self, render: RenderUpdate) {
        if !self.view_centred {
            self.map.set_view(render.position, RIDE_ZOOM);
            self.view_centred = true;
        }
        self.map
            .render_rider(render.position, render.rotation_degrees, render.pan);
    }

    fn apply_state(&mut self, state: StateUpdate, now_ms: u64, demo: bool) {
        self.session.current_position = Some(state.position);
        self.session.speed_kmh = state.speed_kmh;
        self.session.heading_degrees = state.heading_degrees;
        self.session.trip_distance_km += state.distance_m / 1000.0;

        self.telemetry = self.calculator.update(&KinematicSample {
            prev_speed_kmh: state.prev_speed_kmh,
            speed_kmh: state.speed_kmh,
            distance_m: state.distance_m,
            altitude_m: state.altitude_m,
            t_ms: now_ms,
            demo,
        });

        self.provider.on_progress(state.distance_m);

        let arrived = match self.session.active_target.as_mut() {
            Some(target) => target.travel(state.distance_m / 1000.0),
            None => false,
        };
        if arrived {
            if let Some(target) = self.session.active_target.take() {
                tracing::info!("Arrived at {}", target.name);
            }
            self.provider.cancel_dynamic(&mut self.map);
            self.refresh_demo_path();
        }
    }

    // Routing

    /// Store a pre-authored path.
    pub fn set_static_path(&mut self, path: Vec<LatLng>) -> Result<(), RoutingError> {
        let result = self.provider.set_static_path(path, &mut self.map);
        if let Err(e) = &result {
            self.note_error(e.clone().into());
        } else if self.session.active_target.is_none() {
            self.refresh_demo_path();
        }
        result
    }

    pub fn clear_static_path(&mut self) {
        self.provider.clear_static_path(&mut self.map);
        if self.session.active_target.is_none() {
            self.refresh_demo_path();
        }
    }

    /// Guide to `target`. The returned request must be resolved and fed
    /// back through [`apply_route`](Self::apply_route).
    pub fn select_target(&mut self, target: ActiveTarget) -> RouteRequest {
        let from = self.ride_origin();
        let request =
            self.provider
                .begin_dynamic(from, &target.name, target.distance_km, &mut self.map);
        tracing::info!("Target set: {} ({:.1} km)", target.name, target.distance_km);
        self.session.active_target = Some(target);
        request
    }

    /// Where guidance starts: the rider, else the demo start, else the demo origin.
    fn ride_origin(&self) -> LatLng {
        self.session
            .current_position
            .or_else(|| self.demo.path().first().copied())
            .unwrap_or(self.demo_settings.origin)
    }

    /// Drop the active target and fall back to the static path.
    pub fn cancel_target(&mut self) {
        if self.session.active_target.take().is_some() {
            tracing::info!("Target cancelled");
            self.provider.cancel_dynamic(&mut self.map);
            self.refresh_demo_path();
        }
    }

    /// Feed back a routing response.
    pub fn apply_route(
        &mut self,
        request: &RouteRequest,
        result: Result<RouteResult, RoutingError>,
    ) -> RouteUpdate {
        let update = self.provider.complete(request, result, &mut self.map);
        match &update {
            RouteUpdate::Applied => self.refresh_demo_path(),
            RouteUpdate::Failed(e) => self.note_error(e.clone().into()),
            RouteUpdate::Stale => {}
        }
        update
    }

    pub fn advance_instruction(&mut self) -> Option<&Instruction> {
        self.provider.advance_instruction()
    }

    /// Path replayed by the demo: current route, static path, else the loop.
    fn demo_path(&self) -> Vec<LatLng> {
        self.provider
            .current_route()
            .map(|r| r.polyline.clone())
            .or_else(|| self.provider.static_path().map(|p| p.to_vec()))
            .unwrap_or_default()
    }

    fn refresh_demo_path(&mut self) {
        if self.session.mode == RideMode::Demo {
            let path = self.demo_path();
            self.demo.set_path(path);
        }
    }

    // Quick navigation

    pub fn open_quick_nav(&mut self) -> usize {
        self.quick_nav.open().len()
    }

    pub fn pick_destination(&mut self, index: usize) -> Result<(), QuickNavError> {
        self.quick_nav.select(index).map(|_| ())
    }

    pub fn close_quick_nav(&mut self) {
        self.quick_nav.close();
    }

    /// Resolve the quick-nav choice. Internal guidance returns the route
    /// request to execute; external handoff leaves the session untouched.
    pub fn choose_guidance<H: DeepLinkHandler>(
        &mut self,
        choice: GuidanceChoice,
        deep_links: &H,
    ) -> Result<Option<RouteRequest>, QuickNavError> {
        let from = self.ride_origin();
        match self.quick_nav.choose(choice, from)? {
            QuickNavOutcome::Internal(target) => Ok(Some(self.select_target(target))),
            QuickNavOutcome::External(url) => {
                deep_links.open(&url);
                Ok(None)
            }
        }
    }

    // Misc

    pub fn set_low_power(&mut self, enabled: bool) {
        self.calculator.set_low_power(enabled);
        tracing::info!("Low power mode {}", if enabled { "on" } else { "off" });
    }

    fn note_error(&mut self, error: RideError) {
        tracing::warn!("{}", error);
        self.last_error = Some(error);
    }

    /// Current presentation state.
    pub fn snapshot(&self) -> RideSnapshot {
        let next_instruction = self.provider.next_instruction().cloned();
        RideSnapshot {
            mode: self.session.mode,
            gps_status: self.session.gps_status,
            position: self.session.current_position,
            heading_degrees: self.session.heading_degrees,
            speed_kmh: self.session.speed_kmh,
            trip_distance_km: self.session.trip_distance_km,
            active_target: self.session.active_target.clone(),
            banner: banner_text(next_instruction.as_ref()),
            next_instruction,
            telemetry: self.telemetry,
            route_points: self
                .provider
                .current_route()
                .map(|r| r.polyline.len())
                .unwrap_or(0),
            overlay_count: self.provider.overlay_count(),
            now_playing: None,
            is_playing: false,
        }
    }
}
