//! In-memory map surface.
//!
//! Records everything it is asked to draw. Used by the headless runner and
//! by tests to observe overlay lifecycles.

use super::{MapSurface, Overlay, OverlayId, Trail};
use crate::geo::{Bounds, LatLng};
use std::collections::BTreeMap;

/// Default zoom used when the view is first centred.
pub const DEFAULT_ZOOM: f64 = 15.0;

#[derive(Debug)]
pub struct HeadlessMap {
    overlays: BTreeMap<OverlayId, Overlay>,
    next_id: OverlayId,
    center: Option<LatLng>,
    zoom: f64,
    rider: Option<(LatLng, f64)>,
    trail: Trail,
    last_fit: Option<Bounds>,
    pan_count: u64,
    render_count: u64,
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new(super::trail::DEFAULT_TRAIL_CAPACITY)
    }
}

impl HeadlessMap {
    pub fn new(trail_capacity: usize) -> Self {
        Self {
            overlays: BTreeMap::new(),
            next_id: 1,
            center: None,
            zoom: DEFAULT_ZOOM,
            rider: None,
            trail: Trail::new(trail_capacity),
            last_fit: None,
            pan_count: 0,
            render_count: 0,
        }
    }

    pub fn overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.overlays.values()
    }

    pub fn center(&self) -> Option<LatLng> {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Rider marker position and rotation
    pub fn rider(&self) -> Option<(LatLng, f64)> {
        self.rider
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn last_fit(&self) -> Option<Bounds> {
        self.last_fit
    }

    /// Number of times the view followed the rider
    pub fn pan_count(&self) -> u64 {
        self.pan_count
    }

    /// Number of rider renders
    pub fn render_count(&self) -> u64 {
        self.render_count
    }
}

impl MapSurface for HeadlessMap {
    fn add_overlay(&mut self, overlay: Overlay) -> OverlayId {
        let id = self.next_id;
        self.next_id += 1;
        self.overlays.insert(id, overlay);
        id
    }

    fn remove_overlay(&mut self, id: OverlayId) -> bool {
        self.overlays.remove(&id).is_some()
    }

    fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.center = Some(center);
        self.zoom = zoom;
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        self.center = Some(bounds.center());
        self.last_fit = Some(bounds);
    }

    fn render_rider(&mut self, position: LatLng, rotation_degrees: f64, pan: bool) {
        self.rider = Some((position, rotation_degrees));
        self.trail.push(position);
        self.render_count += 1;
        if pan {
            self.center = Some(position);
            self.pan_count += 1;
        }
    }

    fn clear_rider(&mut self) {
        self.rider = None;
        self.trail.clear();
    }
}
