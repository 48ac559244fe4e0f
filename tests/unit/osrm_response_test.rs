//! Unit tests for routing-service response handling

use ridemode::routing::service::parse_osrm_response;
use ridemode::routing::{InstructionTracker, ManeuverType};

const TWO_LEG_RESPONSE: &str = r#"{
    "code": "Ok",
    "routes": [{
        "geometry": {"type": "LineString", "coordinates": [[9.19, 45.46], [9.20, 45.47], [9.22, 45.48]]},
        "legs": [
            {"steps": [
                {"distance": 350.0, "name": "Viale Monza", "maneuver": {"type": "depart"}},
                {"distance": 1200.0, "name": "", "maneuver": {"type": "roundabout", "modifier": "right"}}
            ]},
            {"steps": [
                {"distance": 90.0, "name": "Via Padova", "maneuver": {"type": "fork", "modifier": "slight left"}},
                {"distance": 0.0, "name": "Via Padova", "maneuver": {"type": "arrive"}}
            ]}
        ]
    }]
}"#;

#[test]
fn test_legs_are_flattened_in_order() {
    let route = parse_osrm_response(TWO_LEG_RESPONSE).unwrap();
    let kinds: Vec<ManeuverType> = route.instructions.iter().map(|i| i.maneuver_type).collect();
    assert_eq!(
        kinds,
        vec![
            ManeuverType::Depart,
            ManeuverType::Roundabout,
            ManeuverType::Fork,
            ManeuverType::Arrive
        ]
    );
    assert_eq!(route.instructions[0].text, "Head onto Viale Monza");
    assert_eq!(route.instructions[1].text, "Take the roundabout");
    assert_eq!(route.instructions[2].text, "Keep slight left onto Via Padova");
    assert_eq!(route.instructions[3].text, "Arrive at destination");
}

#[test]
fn test_guidance_banners_from_response() {
    let route = parse_osrm_response(TWO_LEG_RESPONSE).unwrap();
    let mut tracker = InstructionTracker::new(false);
    tracker.load(route.instructions);

    assert_eq!(tracker.current().unwrap().banner(), "Head onto Viale Monza in 350 m");
    assert_eq!(tracker.advance().unwrap().banner(), "Take the roundabout in 1.2 km");
    assert_eq!(tracker.remaining(), 2);
}

#[test]
fn test_empty_routes_list() {
    let body = r#"{"code": "Ok", "routes": []}"#;
    assert_eq!(
        parse_osrm_response(body),
        Err(ridemode::routing::RoutingError::NoRoute)
    );
}
