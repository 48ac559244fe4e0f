//! Unit tests for geodesy helpers

use ridemode::geo::{destination_point, haversine_distance, path_length, LatLng};

#[test]
fn test_one_degree_of_longitude_at_equator() {
    let d = haversine_distance(0.0, 0.0, 0.0, 1.0);
    assert!((d - 111_195.0).abs() < 10.0, "got {}", d);
}

#[test]
fn test_destination_point_lands_at_distance() {
    let origin = LatLng::new(45.4642, 9.19);
    for bearing_deg in [0.0, 45.0, 135.0, 270.0] {
        let dest = destination_point(origin, bearing_deg, 2_500.0);
        let d = origin.distance_to(&dest);
        assert!((d - 2_500.0).abs() < 1.0, "bearing {}: {}", bearing_deg, d);
    }
}

#[test]
fn test_path_length_sums_segments() {
    let path = vec![
        LatLng::new(0.0, 0.0),
        LatLng::new(0.0, 0.01),
        LatLng::new(0.01, 0.01),
    ];
    let expected = path[0].distance_to(&path[1]) + path[1].distance_to(&path[2]);
    assert!((path_length(&path) - expected).abs() < 1e-6);
    assert_eq!(path_length(&path[..1]), 0.0);
}

#[test]
fn test_destination_crosses_antimeridian() {
    let origin = LatLng::new(0.0, 179.99);
    let dest = destination_point(origin, 90.0, 5_000.0);
    assert!(dest.lng < -179.0, "lng {}", dest.lng);
    assert!((origin.distance_to(&dest) - 5_000.0).abs() < 1.0);
}
