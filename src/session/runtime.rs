//! Async ride runtime.
//!
//! A single task owns the controller, the live source, the playback
//! coordinator and the routing client, and multiplexes their events with
//! `tokio::select!`. User actions arrive as [`RideCommand`]s; the latest
//! [`RideSnapshot`] is published on a watch channel after every event.

use super::controller::RideController;
use super::quick_nav::{DeepLinkHandler, GuidanceChoice};
use super::state::{ActiveTarget, RideSnapshot};
use crate::config::RideConfig;
use crate::geo::LatLng;
use crate::location::{DeviceLocation, FixOrigin, LiveEvent, LiveLocationSource, LocationError};
use crate::map::MapSurface;
use crate::media::{MediaPlayer, PlaybackCoordinator, PlayerEvent, Track};
use crate::routing::{RouteRequest, RouteResult, RoutingError, RoutingService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

/// Command queue depth
const COMMAND_BUFFER: usize = 64;

/// User actions
#[derive(Debug, Clone, PartialEq)]
pub enum RideCommand {
    ArmGps,
    DisarmGps,
    StartDemo,
    StopDemo,
    /// Guide to an ad-hoc target
    SelectTarget { name: String, distance_km: f64 },
    CancelTarget,
    OpenQuickNav,
    PickDestination(usize),
    ChooseGuidance(GuidanceChoice),
    CloseQuickNav,
    SetStaticPath(Vec<LatLng>),
    ClearStaticPath,
    AdvanceInstruction,
    SetLowPower(bool),
    TogglePlay,
    NextTrack,
    PreviousTrack,
    SelectTrack(usize),
    LoadPlaylist(Vec<Track>),
    /// Leave Ride Mode and stop the runtime
    Exit,
}

/// Client side of a running [`RideRuntime`].
#[derive(Clone)]
pub struct RideHandle {
    commands: mpsc::Sender<RideCommand>,
    snapshots: watch::Receiver<RideSnapshot>,
}

impl RideHandle {
    /// Queue a command. Returns false once the runtime has stopped.
    pub async fn send(&self, command: RideCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> RideSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RideSnapshot> {
        self.snapshots.clone()
    }
}

type RouteReply = (RouteRequest, Result<RouteResult, RoutingError>);

pub struct RideRuntime<M, D, P, R, H>
where
    M: MapSurface,
    D: DeviceLocation,
    P: MediaPlayer,
    R: RoutingService,
    H: DeepLinkHandler,
{
    controller: RideController<M>,
    live: LiveLocationSource<D>,
    media: PlaybackCoordinator<P>,
    player_events: broadcast::Receiver<PlayerEvent>,
    player_events_open: bool,
    router: Arc<R>,
    deep_links: H,
    commands: mpsc::Receiver<RideCommand>,
    snapshots: watch::Sender<RideSnapshot>,
    route_tx: mpsc::UnboundedSender<RouteReply>,
    route_rx: mpsc::UnboundedReceiver<RouteReply>,
    started: Instant,
    demo_interval: Duration,
    retry_interval: Duration,
}

impl<M, D, P, R, H> RideRuntime<M, D, P, R, H>
where
    M: MapSurface + Send + 'static,
    D: DeviceLocation + 'static,
    P: MediaPlayer + 'static,
    R: RoutingService + 'static,
    H: DeepLinkHandler + 'static,
{
    /// Build a runtime and the handle used to drive it.
    pub fn new(
        config: &RideConfig,
        map: M,
        device: D,
        player: P,
        router: R,
        deep_links: H,
    ) -> (Self, RideHandle) {
        let controller = RideController::new(map, config);
        let player_events = player.subscribe_events();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
        let (route_tx, route_rx) = mpsc::unbounded_channel();

        let runtime = Self {
            controller,
            live: LiveLocationSource::new(device, config.location.watch_options()),
            media: PlaybackCoordinator::new(player, &config.media),
            player_events,
            player_events_open: true,
            router: Arc::new(router),
            deep_links,
            commands: command_rx,
            snapshots: snapshot_tx,
            route_tx,
            route_rx,
            started: Instant::now(),
            demo_interval: Duration::from_millis(config.demo.tick_interval_ms.max(1)),
            retry_interval: Duration::from_millis(config.location.retry_interval_ms.max(1)),
        };
        let handle = RideHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (runtime, handle)
    }

    /// Run until [`RideCommand::Exit`] or until every handle is dropped.
    ///
    /// Returns the controller after teardown.
    pub async fn run(mut self) -> RideController<M> {
        let mut demo_ticker = tokio::time::interval(self.demo_interval);
        demo_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut retry_ticker = tokio::time::interval(self.retry_interval);
        retry_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut demo_running = false;

        tracing::info!("Ride runtime started");

        loop {
            let recovery_at = self
                .media
                .recovery_deadline()
                .map(|ms| self.started + Duration::from_millis(ms));
            let needs_retry = self.controller.wants_live() && !self.live.is_active();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(RideCommand::Exit) | None => break,
                    Some(command) => self.handle_command(command),
                },

                scheduled = demo_ticker.tick(), if demo_running => {
                    let at = scheduled.saturating_duration_since(self.started).as_millis() as u64;
                    self.controller.demo_tick(at);
                }

                event = self.live.next_event() => self.handle_live(event),

                Some((request, result)) = self.route_rx.recv() => {
                    self.controller.apply_route(&request, result);
                }

                event = self.player_events.recv(), if self.player_events_open => match event {
                    Ok(event) => {
                        let now = self.now_ms();
                        self.media.on_event(event, now);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Dropped {} player events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::warn!("Media player event stream closed");
                        self.player_events_open = false;
                    }
                },

                _ = sleep_until(recovery_at), if recovery_at.is_some() => {
                    let now = self.now_ms();
                    self.media.poll(now);
                }

                _ = retry_ticker.tick(), if needs_retry => self.start_live(),
            }

            if self.controller.wants_demo_ticks() != demo_running {
                demo_running = !demo_running;
                if demo_running {
                    demo_ticker.reset();
                }
            }
            if !self.controller.wants_live() {
                self.live.stop();
            }
            self.publish();
        }

        self.shutdown();
        self.controller
    }

    fn handle_command(&mut self, command: RideCommand) {
        tracing::debug!("Command: {:?}", command);
        match command {
            RideCommand::ArmGps => {
                self.controller.arm_gps();
                self.start_live();
            }
            RideCommand::DisarmGps => self.controller.disarm_gps(),
            RideCommand::StartDemo => self.controller.start_demo(),
            RideCommand::StopDemo => {
                self.controller.stop_demo();
                self.start_live();
            }
            RideCommand::SelectTarget { name, distance_km } => {
                let request = self
                    .controller
                    .select_target(ActiveTarget::new(name, distance_km));
                self.spawn_route(request);
            }
            RideCommand::CancelTarget => self.controller.cancel_target(),
            RideCommand::OpenQuickNav => {
                self.controller.open_quick_nav();
            }
            RideCommand::PickDestination(index) => {
                if let Err(e) = self.controller.pick_destination(index) {
                    tracing::warn!("Quick nav: {}", e);
                }
            }
            RideCommand::ChooseGuidance(choice) => {
                match self.controller.choose_guidance(choice, &self.deep_links) {
                    Ok(Some(request)) => self.spawn_route(request),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Quick nav: {}", e),
                }
            }
            RideCommand::CloseQuickNav => self.controller.close_quick_nav(),
            RideCommand::SetStaticPath(path) => {
                // Failures are recorded by the controller
                let _ = self.controller.set_static_path(path);
            }
            RideCommand::ClearStaticPath => self.controller.clear_static_path(),
            RideCommand::AdvanceInstruction => {
                self.controller.advance_instruction();
            }
            RideCommand::SetLowPower(enabled) => self.controller.set_low_power(enabled),
            RideCommand::TogglePlay => {
                if !self.media.toggle_play() {
                    tracing::debug!("Toggle ignored, player not ready");
                }
            }
            RideCommand::NextTrack => self.media.next(),
            RideCommand::PreviousTrack => self.media.previous(),
            RideCommand::SelectTrack(index) => {
                if let Err(e) = self.media.select(index) {
                    tracing::warn!("Track selection failed: {}", e);
                }
            }
            RideCommand::LoadPlaylist(tracks) => self.media.load_playlist(tracks),
            RideCommand::Exit => {}
        }
    }

    fn handle_live(&mut self, event: LiveEvent) {
        match event {
            LiveEvent::Fix(fix) => {
                let now = self.now_ms();
                self.controller.ingest(fix, now, FixOrigin::Live);
            }
            LiveEvent::Unavailable(e) => self.controller.on_location_error(e),
        }
    }

    /// Register the live watch if the controller wants one.
    fn start_live(&mut self) {
        if !self.controller.wants_live() || self.live.is_active() {
            return;
        }
        if let Err(e) = self.live.start() {
            if e == LocationError::PermissionDenied {
                tracing::debug!("Watch refused, retrying in {:?}", self.retry_interval);
            }
            self.controller.on_location_error(e);
        }
    }

    fn spawn_route(&self, request: RouteRequest) {
        let router = Arc::clone(&self.router);
        let replies = self.route_tx.clone();
        tokio::spawn(async move {
            let result = router.route(request.from, request.to).await;
            // The runtime may already be gone
            let _ = replies.send((request, result));
        });
    }

    fn publish(&self) {
        let mut snapshot = self.controller.snapshot();
        let playback = self.media.state();
        snapshot.now_playing = playback.current_track().map(|t| t.title.clone());
        snapshot.is_playing = playback.is_playing;
        self.snapshots.send_replace(snapshot);
    }

    fn shutdown(&mut self) {
        self.live.stop();
        self.controller.exit();
        self.publish();
        tracing::info!("Ride runtime stopped");
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
