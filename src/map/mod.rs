//! Map rendering surface contract.
//!
//! The ride engine never draws anything itself. It hands overlays, viewport
//! changes and the rider marker to a [`MapSurface`] and keeps the returned
//! handles so every overlay can be removed again.

pub mod headless;
pub mod trail;

use crate::geo::{Bounds, LatLng};
use serde::{Deserialize, Serialize};

pub use headless::HeadlessMap;
pub use trail::Trail;

/// Handle of an overlay added to a surface.
pub type OverlayId = u64;

/// Zoom used when the view first centres on the rider.
pub const RIDE_ZOOM: f64 = 17.0;

/// Role of a marker overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    /// First point of a static path
    PathStart,
    /// Last point of a static path
    PathEnd,
    /// Where a dynamic route was requested from
    Origin,
    /// Synthetic quick-nav destination
    Destination,
}

/// Something drawn on top of the base map.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Polyline(Vec<LatLng>),
    Marker { position: LatLng, kind: MarkerKind },
}

/// A surface that renders map state.
pub trait MapSurface {
    /// Draw an overlay and return its handle.
    fn add_overlay(&mut self, overlay: Overlay) -> OverlayId;

    /// Remove a previously added overlay. Unknown handles return false.
    fn remove_overlay(&mut self, id: OverlayId) -> bool;

    /// Number of overlays currently drawn.
    fn overlay_count(&self) -> usize;

    fn set_view(&mut self, center: LatLng, zoom: f64);

    fn fit_bounds(&mut self, bounds: Bounds);

    /// Move the rider marker, extend the trail and optionally recentre.
    fn render_rider(&mut self, position: LatLng, rotation_degrees: f64, pan: bool);

    /// Remove the rider marker and its trail.
    fn clear_rider(&mut self);
}
