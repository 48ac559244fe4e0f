//! Integration tests for live tracking: GPS toggle, device watch and
//! producer exclusivity.

use ridemode::config::RideConfig;
use ridemode::error::RideError;
use ridemode::location::{
    ChannelDevice, FixOrigin, GpsStatus, LiveEvent, LiveLocationSource, LocationError,
    PositionFix, WatchOptions,
};
use ridemode::map::HeadlessMap;
use ridemode::session::{RideController, RideMode};
use std::time::Duration;

fn controller() -> RideController<HeadlessMap> {
    RideController::new(HeadlessMap::new(50), &RideConfig::default())
}

fn wall_now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

#[test]
fn test_toggle_off_while_searching() {
    let mut ride = controller();
    ride.arm_gps();
    assert_eq!(ride.mode(), RideMode::GpsArmed);
    assert_eq!(ride.session().gps_status, GpsStatus::Searching);
    assert!(ride.wants_live());

    ride.disarm_gps();
    assert_eq!(ride.mode(), RideMode::Idle);
    assert_eq!(ride.session().gps_status, GpsStatus::Off);
    assert!(!ride.wants_live());

    // Nothing was recorded and late fixes are ignored
    assert!(!ride.ingest(PositionFix::new(45.0, 9.0, 0), 0, FixOrigin::Live));
    assert_eq!(ride.session().current_position, None);
    assert_eq!(ride.session().trip_distance_km, 0.0);
    assert_eq!(ride.map().render_count(), 0);
}

#[test]
fn test_first_fix_activates_gps() {
    let mut ride = controller();
    ride.arm_gps();
    assert!(ride.ingest(PositionFix::new(45.0, 9.0, 0).with_speed(1.0), 0, FixOrigin::Live));

    assert_eq!(ride.session().gps_status, GpsStatus::Active);
    assert_eq!(ride.session().current_position.map(|p| p.lat), Some(45.0));
    // Slow live fixes do not pan the map
    assert_eq!(ride.map().pan_count(), 0);

    ride.on_location_error(LocationError::Timeout(10_000));
    assert_eq!(ride.session().gps_status, GpsStatus::Searching);
    assert_eq!(
        ride.last_error(),
        Some(&RideError::LocationUnavailable(LocationError::Timeout(10_000)))
    );
}

#[test]
fn test_demo_takes_precedence_over_live() {
    let mut ride = controller();
    ride.arm_gps();
    ride.start_demo();
    assert_eq!(ride.mode(), RideMode::Demo);
    assert!(ride.wants_live());

    assert!(!ride.ingest(PositionFix::new(45.0, 9.0, 0), 0, FixOrigin::Live));
    assert!(ride.demo_tick(0));

    ride.stop_demo();
    assert_eq!(ride.mode(), RideMode::GpsArmed);
    assert_eq!(ride.session().gps_status, GpsStatus::Searching);
    assert!(!ride.ingest(PositionFix::new(45.0, 9.0, 200), 200, FixOrigin::Demo));
    assert!(ride.ingest(PositionFix::new(45.0, 9.0, 200), 200, FixOrigin::Live));
}

#[test]
fn test_trip_survives_demo_to_live_handoff() {
    let mut ride = controller();
    ride.arm_gps();
    ride.start_demo();
    for tick in 0..5u64 {
        ride.demo_tick(tick * 100);
    }
    let trip = ride.session().trip_distance_km;
    assert!(trip > 0.0);

    ride.stop_demo();
    assert_eq!(ride.session().trip_distance_km, trip);
}

#[tokio::test(start_paused = true)]
async fn test_device_watch_delivers_validated_fixes() {
    let (device, feeder) = ChannelDevice::new();
    let options = WatchOptions {
        maximum_age_ms: 30_000,
        ..WatchOptions::default()
    };
    let mut live = LiveLocationSource::new(device, options);
    assert!(!feeder.push_fix(PositionFix::new(45.0, 9.0, wall_now_ms())));

    live.start().unwrap();
    assert!(live.is_active());
    assert!(feeder.is_watched());

    let fresh = PositionFix::new(45.0, 9.0, wall_now_ms()).with_accuracy(8.0);
    assert!(feeder.push_fix(fresh));
    assert_eq!(live.next_event().await, LiveEvent::Fix(fresh));

    feeder.push_fix(PositionFix::new(45.0, 9.0, wall_now_ms()).with_accuracy(250.0));
    assert!(matches!(
        live.next_event().await,
        LiveEvent::Unavailable(LocationError::InaccurateFix { .. })
    ));

    feeder.push_fix(PositionFix::new(45.0, 9.0, wall_now_ms().saturating_sub(120_000)));
    assert!(matches!(
        live.next_event().await,
        LiveEvent::Unavailable(LocationError::StaleFix { .. })
    ));

    feeder.push_error(LocationError::PositionUnavailable("tunnel".to_string()));
    assert_eq!(
        live.next_event().await,
        LiveEvent::Unavailable(LocationError::PositionUnavailable("tunnel".to_string()))
    );

    live.stop();
    assert!(!live.is_active());
    assert!(!feeder.is_watched());
}

#[tokio::test(start_paused = true)]
async fn test_device_watch_times_out() {
    let (device, _feeder) = ChannelDevice::new();
    let mut live = LiveLocationSource::new(device, WatchOptions::default());
    live.start().unwrap();

    let started = tokio::time::Instant::now();
    assert_eq!(
        live.next_event().await,
        LiveEvent::Unavailable(LocationError::Timeout(10_000))
    );
    assert!(started.elapsed() >= Duration::from_millis(10_000));
    // The watch stays registered after a timeout
    assert!(live.is_active());
}

#[test]
fn test_permission_denied_keeps_source_inactive() {
    let (device, feeder) = ChannelDevice::new();
    feeder.set_permission(false);
    let mut live = LiveLocationSource::new(device, WatchOptions::default());

    assert_eq!(live.start(), Err(LocationError::PermissionDenied));
    assert!(!live.is_active());
    assert_eq!(feeder.watches_registered(), 0);

    feeder.set_permission(true);
    assert_eq!(live.start(), Ok(()));
    assert_eq!(feeder.watches_registered(), 1);
}
