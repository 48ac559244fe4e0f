//! Unit tests for GPX path import

use ridemode::geo::LatLng;
use ridemode::location::import::{load_gpx_path, parse_gpx_path};
use ridemode::routing::RoutingError;
use std::fs;

const WAYPOINTS_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <wpt lat="45.46" lon="9.19"><name>Duomo</name></wpt>
  <wpt lat="45.48" lon="9.20"><name>Centrale</name></wpt>
</gpx>"#;

const SINGLE_POINT_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk>
    <trkseg>
      <trkpt lat="45.5" lon="9.5"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

const TWO_SEGMENT_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk>
    <trkseg>
      <trkpt lat="1.0" lon="1.0"></trkpt>
      <trkpt lat="1.1" lon="1.1"></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="1.2" lon="1.2"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

#[test]
fn test_waypoints_are_last_resort() {
    let path = parse_gpx_path(WAYPOINTS_GPX.as_bytes()).unwrap();
    assert_eq!(path, vec![LatLng::new(45.46, 9.19), LatLng::new(45.48, 9.20)]);
}

#[test]
fn test_single_point_is_not_a_path() {
    assert_eq!(
        parse_gpx_path(SINGLE_POINT_GPX.as_bytes()),
        Err(RoutingError::InvalidPath(1))
    );
}

#[test]
fn test_segments_are_concatenated() {
    let path = parse_gpx_path(TWO_SEGMENT_GPX.as_bytes()).unwrap();
    assert_eq!(path.len(), 3);
    assert_eq!(path[2], LatLng::new(1.2, 1.2));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("ride.gpx");
    fs::write(&file, TWO_SEGMENT_GPX).unwrap();

    let path = load_gpx_path(&file).unwrap();
    assert_eq!(path.len(), 3);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_gpx_path(&dir.path().join("nope.gpx"));
    assert!(matches!(result, Err(RoutingError::RequestFailed(_))));
}
