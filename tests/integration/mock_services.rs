//! In-process stand-ins for the external services a ride talks to.

use ridemode::geo::LatLng;
use ridemode::media::Track;
use ridemode::routing::{Instruction, ManeuverType, RouteResult, RoutingError, RoutingService};
use ridemode::session::DeepLinkHandler;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Routing service that answers every request with a straight two-leg route.
#[derive(Clone, Default)]
pub struct MockRouter {
    /// Answer NoRoute instead
    pub fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockRouter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoutingService for MockRouter {
    async fn route(&self, from: LatLng, to: LatLng) -> Result<RouteResult, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RoutingError::NoRoute);
        }
        mock_route(from, to)
    }
}

/// Route used by [`MockRouter`]: via a midpoint, one turn then arrival.
pub fn mock_route(from: LatLng, to: LatLng) -> Result<RouteResult, RoutingError> {
    let mid = LatLng::new((from.lat + to.lat) / 2.0, (from.lng + to.lng) / 2.0);
    RouteResult::new(
        vec![from, mid, to],
        vec![
            Instruction::new("Turn left onto Via Verdi", 400.0, ManeuverType::Turn)
                .with_modifier("left"),
            Instruction::new("Arrive at destination", 0.0, ManeuverType::Arrive),
        ],
    )
}

/// Deep-link handler that remembers what it was asked to open.
#[derive(Clone, Default)]
pub struct RecordingLinks {
    opened: Arc<Mutex<Vec<String>>>,
}

impl RecordingLinks {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl DeepLinkHandler for RecordingLinks {
    fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}

pub fn tracks() -> Vec<Track> {
    vec![
        Track::new("t1", "Highway Star", "Deep Purple", "https://media.example/t1.mp3"),
        Track::new("t2", "Born to Be Wild", "Steppenwolf", "https://media.example/t2.mp3"),
        Track::new("t3", "Radar Love", "Golden Earring", "https://media.example/t3.mp3"),
    ]
}
