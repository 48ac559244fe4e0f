//! Integration tests for the async ride runtime
//!
//! Runs the full runtime on a paused clock with in-process device, player,
//! routing service and deep-link handler.

use crate::integration::mock_services::{tracks, MockRouter, RecordingLinks};
use ridemode::config::RideConfig;
use ridemode::geo::LatLng;
use ridemode::location::{ChannelDevice, DeviceFeeder, GpsStatus, PositionFix};
use ridemode::map::{HeadlessMap, MapSurface};
use ridemode::media::{HeadlessPlayer, PlayerEvent, PlayerState};
use ridemode::session::{GuidanceChoice, RideCommand, RideController, RideHandle, RideMode, RideRuntime};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

struct Harness {
    handle: RideHandle,
    feeder: DeviceFeeder,
    player: HeadlessPlayer,
    router: MockRouter,
    links: RecordingLinks,
    ride: JoinHandle<RideController<HeadlessMap>>,
}

fn start(router: MockRouter) -> Harness {
    let (device, feeder) = ChannelDevice::new();
    let player = HeadlessPlayer::new();
    let links = RecordingLinks::default();
    let (runtime, handle) = RideRuntime::new(
        &RideConfig::default(),
        HeadlessMap::new(50),
        device,
        player.clone(),
        router.clone(),
        links.clone(),
    );
    Harness {
        handle,
        feeder,
        player,
        router,
        links,
        ride: tokio::spawn(runtime.run()),
    }
}

fn wall_now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_demo_ride_and_exit() {
    let h = start(MockRouter::default());
    assert!(h.handle.send(RideCommand::StartDemo).await);
    sleep(Duration::from_millis(1_050)).await;

    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.mode, RideMode::Demo);
    assert!(snapshot.position.is_some());
    assert!(snapshot.trip_distance_km > 0.0);
    assert!(snapshot.speed_kmh > 0.0);

    assert!(h.handle.send(RideCommand::Exit).await);
    let controller = h.ride.await.unwrap();
    assert_eq!(controller.mode(), RideMode::Idle);
    assert_eq!(controller.map().overlay_count(), 0);
    assert!(controller.map().rider().is_none());
    assert!(controller.map().trail().is_empty());
    assert_eq!(h.handle.snapshot().mode, RideMode::Idle);
    assert!(!h.handle.send(RideCommand::StartDemo).await);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_every_handle_stops_the_runtime() {
    let h = start(MockRouter::default());
    h.handle.send(RideCommand::StartDemo).await;
    settle().await;

    drop(h.handle);
    let controller = h.ride.await.unwrap();
    assert_eq!(controller.mode(), RideMode::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_target_is_routed_in_background() {
    let h = start(MockRouter::default());
    h.handle
        .send(RideCommand::SelectTarget {
            name: "Cafe Racer".to_string(),
            distance_km: 8.0,
        })
        .await;
    settle().await;

    assert_eq!(h.router.calls(), 1);
    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.overlay_count, 3);
    assert_eq!(snapshot.route_points, 3);
    assert_eq!(
        snapshot.active_target.as_ref().map(|t| t.name.as_str()),
        Some("Cafe Racer")
    );
    assert_eq!(
        snapshot.next_instruction.as_ref().map(|i| i.text.as_str()),
        Some("Turn left onto Via Verdi")
    );

    h.handle.send(RideCommand::AdvanceInstruction).await;
    settle().await;
    assert_eq!(h.handle.snapshot().banner, "Arrive at destination in 0 m");

    h.handle.send(RideCommand::CancelTarget).await;
    settle().await;
    let snapshot = h.handle.snapshot();
    assert!(snapshot.active_target.is_none());
    assert_eq!(snapshot.overlay_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_routing_keeps_ride_alive() {
    let h = start(MockRouter::failing());
    h.handle.send(RideCommand::StartDemo).await;
    h.handle
        .send(RideCommand::SelectTarget {
            name: "Home".to_string(),
            distance_km: 15.0,
        })
        .await;
    sleep(Duration::from_millis(500)).await;

    let snapshot = h.handle.snapshot();
    assert_eq!(h.router.calls(), 1);
    assert_eq!(snapshot.mode, RideMode::Demo);
    assert_eq!(snapshot.overlay_count, 0);
    assert!(snapshot.next_instruction.is_none());
    assert!(snapshot.trip_distance_km > 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_live_fixes_and_disarm() {
    let h = start(MockRouter::default());
    h.handle.send(RideCommand::ArmGps).await;
    settle().await;
    assert!(h.feeder.is_watched());
    assert_eq!(h.handle.snapshot().gps_status, GpsStatus::Searching);

    h.feeder
        .push_fix(PositionFix::new(45.0, 9.0, wall_now_ms()).with_speed(15.0));
    settle().await;

    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.mode, RideMode::GpsArmed);
    assert_eq!(snapshot.gps_status, GpsStatus::Active);
    assert_eq!(snapshot.position, Some(LatLng::new(45.0, 9.0)));
    assert!((snapshot.speed_kmh - 54.0).abs() < 1e-6);

    h.handle.send(RideCommand::DisarmGps).await;
    settle().await;
    assert!(!h.feeder.is_watched());
    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.mode, RideMode::Idle);
    assert_eq!(snapshot.gps_status, GpsStatus::Off);
}

#[tokio::test(start_paused = true)]
async fn test_lost_fixes_time_out_despite_other_traffic() {
    let h = start(MockRouter::default());
    h.handle.send(RideCommand::ArmGps).await;
    settle().await;
    h.feeder.push_fix(PositionFix::new(45.0, 9.0, wall_now_ms()));
    settle().await;
    assert_eq!(h.handle.snapshot().gps_status, GpsStatus::Active);

    // Commands keep arriving well inside the 10 s reading timeout
    for _ in 0..3 {
        sleep(Duration::from_secs(4)).await;
        h.handle.send(RideCommand::SetLowPower(false)).await;
    }
    settle().await;

    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.gps_status, GpsStatus::Searching);
    assert_eq!(snapshot.mode, RideMode::GpsArmed);
    assert!(h.feeder.is_watched());
}

#[tokio::test(start_paused = true)]
async fn test_toggle_off_while_searching_freezes_state() {
    let h = start(MockRouter::default());
    h.handle.send(RideCommand::ArmGps).await;
    settle().await;
    assert_eq!(h.handle.snapshot().gps_status, GpsStatus::Searching);

    h.handle.send(RideCommand::DisarmGps).await;
    settle().await;
    let after_toggle = h.handle.snapshot();
    assert!(!h.feeder.is_watched());
    assert!(!h.feeder.push_fix(PositionFix::new(45.0, 9.0, wall_now_ms())));

    sleep(Duration::from_millis(250)).await;
    assert_eq!(h.handle.snapshot(), after_toggle);
    assert_eq!(after_toggle.position, None);
}

#[tokio::test(start_paused = true)]
async fn test_denied_permission_is_retried() {
    let h = start(MockRouter::default());
    h.feeder.set_permission(false);
    h.handle.send(RideCommand::ArmGps).await;
    settle().await;

    assert_eq!(h.feeder.watches_registered(), 0);
    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.mode, RideMode::GpsArmed);
    assert_eq!(snapshot.gps_status, GpsStatus::Searching);

    h.feeder.set_permission(true);
    sleep(Duration::from_secs(6)).await;
    assert_eq!(h.feeder.watches_registered(), 1);
    assert!(h.feeder.is_watched());
}

#[tokio::test(start_paused = true)]
async fn test_demo_suspends_live_fixes() {
    let h = start(MockRouter::default());
    h.handle.send(RideCommand::ArmGps).await;
    h.handle.send(RideCommand::StartDemo).await;
    settle().await;

    // Far away from the demo loop
    h.feeder.push_fix(PositionFix::new(-33.9, 151.2, wall_now_ms()));
    sleep(Duration::from_millis(300)).await;
    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.mode, RideMode::Demo);
    assert!(snapshot.position.map(|p| p.lat > 0.0).unwrap_or(false));

    h.handle.send(RideCommand::StopDemo).await;
    settle().await;
    assert_eq!(h.handle.snapshot().mode, RideMode::GpsArmed);
    assert!(h.feeder.is_watched());
}

#[tokio::test(start_paused = true)]
async fn test_playback_follows_player_events() {
    let h = start(MockRouter::default());
    h.handle.send(RideCommand::LoadPlaylist(tracks())).await;
    settle().await;
    h.player.mark_ready();
    settle().await;

    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.now_playing.as_deref(), Some("Highway Star"));
    assert!(snapshot.is_playing);

    for _ in 0..3 {
        h.player.emit(PlayerEvent::StateChanged(PlayerState::Ended));
        settle().await;
    }
    assert_eq!(h.player.loaded(), vec!["t1", "t2", "t3", "t1"]);
    assert_eq!(h.handle.snapshot().now_playing.as_deref(), Some("Highway Star"));

    h.handle.send(RideCommand::TogglePlay).await;
    settle().await;
    assert!(!h.handle.snapshot().is_playing);
    assert!(!h.player.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_player_error_recovers_after_delay() {
    let h = start(MockRouter::default());
    h.handle.send(RideCommand::LoadPlaylist(tracks())).await;
    settle().await;
    h.player.mark_ready();
    settle().await;

    h.player.emit(PlayerEvent::Error("stream dropped".to_string()));
    sleep(Duration::from_millis(1_400)).await;
    assert_eq!(h.handle.snapshot().now_playing.as_deref(), Some("Highway Star"));

    sleep(Duration::from_millis(200)).await;
    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.now_playing.as_deref(), Some("Born to Be Wild"));
    assert!(snapshot.is_playing);
}

#[tokio::test(start_paused = true)]
async fn test_quick_nav_external_handoff() {
    let h = start(MockRouter::default());
    h.handle.send(RideCommand::OpenQuickNav).await;
    h.handle.send(RideCommand::PickDestination(3)).await;
    h.handle
        .send(RideCommand::ChooseGuidance(GuidanceChoice::External))
        .await;
    settle().await;

    assert_eq!(h.links.opened().len(), 1);
    assert_eq!(h.router.calls(), 0);
    let snapshot = h.handle.snapshot();
    assert!(snapshot.active_target.is_none());
    assert_eq!(snapshot.mode, RideMode::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_quick_nav_internal_guidance() {
    let h = start(MockRouter::default());
    h.handle.send(RideCommand::OpenQuickNav).await;
    h.handle.send(RideCommand::PickDestination(0)).await;
    h.handle
        .send(RideCommand::ChooseGuidance(GuidanceChoice::Internal))
        .await;
    settle().await;

    assert!(h.links.opened().is_empty());
    assert_eq!(h.router.calls(), 1);
    let snapshot = h.handle.snapshot();
    assert_eq!(
        snapshot.active_target.as_ref().map(|t| t.name.as_str()),
        Some("Fuel Station")
    );
    assert_eq!(snapshot.overlay_count, 3);
}
