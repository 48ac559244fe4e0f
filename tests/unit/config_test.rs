//! Unit tests for configuration flowing into the ride components

use ridemode::config::{load_config_from, RideConfig};
use ridemode::geo::LatLng;
use ridemode::location::{FixOrigin, PositionFix};
use ridemode::map::HeadlessMap;
use ridemode::session::RideController;
use std::fs;

const RIDE_TOML: &str = r#"
[filter]
render_interval_ms = 100
pan_speed_threshold_kmh = 20.0

[telemetry]
low_power_mode = true

[[quick_nav.destinations]]
name = "Garage"
distance_km = 1.0

[[quick_nav.destinations]]
name = "Lake"
distance_km = 55.0
location = { lat = 45.98, lng = 9.26 }
"#;

fn load(content: &str) -> RideConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    load_config_from(&path).unwrap()
}

#[test]
fn test_destinations_replace_defaults() {
    let config = load(RIDE_TOML);
    let destinations = &config.quick_nav.destinations;
    assert_eq!(destinations.len(), 2);
    assert_eq!(destinations[0].location, None);
    assert_eq!(destinations[1].location, Some(LatLng::new(45.98, 9.26)));

    let mut ride = RideController::new(HeadlessMap::new(config.telemetry.trail_capacity), &config);
    assert_eq!(ride.open_quick_nav(), 2);
}

#[test]
fn test_filter_settings_drive_cadence() {
    let config = load(RIDE_TOML);
    let mut ride = RideController::new(HeadlessMap::new(50), &config);
    ride.arm_gps();

    // 36 km/h: above the default pan threshold, below the configured one
    for i in 0..50u64 {
        let now = i * 10;
        let fix = PositionFix::new(45.0, 9.0 + i as f64 * 1e-5, now).with_speed(10.0);
        ride.ingest(fix, now, FixOrigin::Live);
    }

    assert_eq!(ride.map().render_count(), 5);
    assert_eq!(ride.map().pan_count(), 0);
}

#[test]
fn test_low_power_from_file() {
    let config = load(RIDE_TOML);
    let mut ride = RideController::new(HeadlessMap::new(50), &config);
    ride.start_demo();
    for tick in 0..5u64 {
        ride.demo_tick(tick * 100);
    }

    let telemetry = ride.telemetry();
    assert_eq!(telemetry.g_force, 0.0);
    assert_eq!(telemetry.lean_angle_degrees, 0.0);
    assert!(telemetry.simulated_rpm > 3000);
}
