//! Route provider.
//!
//! Owns every overlay it draws and the instruction state of the active
//! route. Switching between static and dynamic modes always tears the
//! previous mode down before the new one is drawn.

use super::{Instruction, InstructionTracker, RouteResult, RoutingError};
use crate::geo::{destination_point, Bounds, LatLng};
use crate::map::{MapSurface, MarkerKind, Overlay, OverlayId};

/// Which kind of route is on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteMode {
    #[default]
    None,
    /// Pre-authored path
    Static,
    /// Waiting for the routing service to answer `request_id`
    Pending { request_id: u64 },
    /// Resolved point-to-point route
    Dynamic,
}

/// A routing request handed to the caller for execution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub id: u64,
    pub from: LatLng,
    pub to: LatLng,
}

/// Result of feeding a routing response back.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteUpdate {
    /// Route drawn and guidance loaded
    Applied,
    /// The request failed; no route is shown
    Failed(RoutingError),
    /// A newer request superseded this one
    Stale,
}

#[derive(Debug, Default)]
pub struct RouteProvider {
    overlays: Vec<OverlayId>,
    static_path: Option<Vec<LatLng>>,
    mode: RouteMode,
    current: Option<RouteResult>,
    tracker: InstructionTracker,
    last_request_id: u64,
}

impl RouteProvider {
    pub fn new(auto_advance: bool) -> Self {
        Self {
            tracker: InstructionTracker::new(auto_advance),
            ..Default::default()
        }
    }

    pub fn mode(&self) -> RouteMode {
        self.mode
    }

    /// Route currently shown, static or dynamic
    pub fn current_route(&self) -> Option<&RouteResult> {
        self.current.as_ref()
    }

    pub fn static_path(&self) -> Option<&[LatLng]> {
        self.static_path.as_deref()
    }

    pub fn next_instruction(&self) -> Option<&Instruction> {
        self.tracker.current()
    }

    /// Overlays drawn by this provider and not yet removed
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Store a pre-authored path. It is drawn unless a dynamic route is active.
    pub fn set_static_path<M: MapSurface>(
        &mut self,
        path: Vec<LatLng>,
        map: &mut M,
    ) -> Result<(), RoutingError> {
        if path.len() < 2 {
            return Err(RoutingError::InvalidPath(path.len()));
        }
        self.static_path = Some(path);
        if matches!(self.mode, RouteMode::None | RouteMode::Static) {
            self.show_static(map);
        }
        Ok(())
    }

    /// Forget the static path, removing it from the map if shown.
    pub fn clear_static_path<M: MapSurface>(&mut self, map: &mut M) {
        self.static_path = None;
        if self.mode == RouteMode::Static {
            self.teardown(map);
        }
    }

    /// Draw the static path (polyline and both endpoints) and fit the view.
    ///
    /// With no static path the map is simply cleared.
    pub fn show_static<M: MapSurface>(&mut self, map: &mut M) {
        self.teardown(map);
        let Some(path) = self.static_path.clone() else {
            return;
        };

        self.draw_route(&path, MarkerKind::PathStart, MarkerKind::PathEnd, map);
        self.current = Some(RouteResult {
            polyline: path,
            instructions: Vec::new(),
        });
        self.mode = RouteMode::Static;
        tracing::debug!("Static path drawn ({} overlays)", self.overlays.len());
    }

    /// Tear down the current mode and issue a request for a dynamic route.
    ///
    /// The destination is synthesized from the target name and distance.
    pub fn begin_dynamic<M: MapSurface>(
        &mut self,
        from: LatLng,
        target_name: &str,
        distance_km: f64,
        map: &mut M,
    ) -> RouteRequest {
        self.teardown(map);
        self.last_request_id += 1;
        let request = RouteRequest {
            id: self.last_request_id,
            from,
            to: synthetic_destination(from, target_name, distance_km),
        };
        self.mode = RouteMode::Pending {
            request_id: request.id,
        };
        tracing::info!(
            "Route request #{} for '{}' ({} -> {})",
            request.id,
            target_name,
            request.from,
            request.to
        );
        request
    }

    /// Feed back the outcome of a routing request.
    pub fn complete<M: MapSurface>(
        &mut self,
        request: &RouteRequest,
        result: Result<RouteResult, RoutingError>,
        map: &mut M,
    ) -> RouteUpdate {
        if self.mode != (RouteMode::Pending { request_id: request.id }) {
            tracing::debug!("Discarding stale route response #{}", request.id);
            return RouteUpdate::Stale;
        }

        match result {
            Ok(route) => {
                self.draw_route(&route.polyline, MarkerKind::Origin, MarkerKind::Destination, map);
                self.tracker.load(route.instructions.clone());
                tracing::info!(
                    "Route #{} resolved: {:.1} km, {} instructions",
                    request.id,
                    route.length_m() / 1000.0,
                    route.instructions.len()
                );
                self.current = Some(route);
                self.mode = RouteMode::Dynamic;
                RouteUpdate::Applied
            }
            Err(e) => {
                tracing::warn!("Route #{} failed: {}", request.id, e);
                self.current = None;
                self.tracker.clear();
                self.mode = RouteMode::Dynamic;
                RouteUpdate::Failed(e)
            }
        }
    }

    /// Drop the dynamic route and fall back to the static path, if any.
    pub fn cancel_dynamic<M: MapSurface>(&mut self, map: &mut M) {
        if matches!(self.mode, RouteMode::Pending { .. } | RouteMode::Dynamic) {
            self.show_static(map);
        }
    }

    /// Count the active instruction down by the distance travelled.
    pub fn on_progress(&mut self, distance_m: f64) -> Option<&Instruction> {
        self.tracker.travel(distance_m)
    }

    /// Replace the active instruction with the next one.
    pub fn advance_instruction(&mut self) -> Option<&Instruction> {
        self.tracker.advance()
    }

    /// Remove every overlay and forget route and instruction state.
    pub fn teardown<M: MapSurface>(&mut self, map: &mut M) {
        for id in self.overlays.drain(..) {
            if !map.remove_overlay(id) {
                tracing::warn!("Overlay {} was already gone", id);
            }
        }
        self.current = None;
        self.tracker.clear();
        self.mode = RouteMode::None;
    }

    fn draw_route<M: MapSurface>(
        &mut self,
        polyline: &[LatLng],
        start_kind: MarkerKind,
        end_kind: MarkerKind,
        map: &mut M,
    ) {
        let (Some(&start), Some(&end)) = (polyline.first(), polyline.last()) else {
            return;
        };
        self.overlays
            .push(map.add_overlay(Overlay::Polyline(polyline.to_vec())));
        self.overlays.push(map.add_overlay(Overlay::Marker {
            position: start,
            kind: start_kind,
        }));
        self.overlays.push(map.add_overlay(Overlay::Marker {
            position: end,
            kind: end_kind,
        }));
        if let Some(bounds) = Bounds::from_points(polyline) {
            map.fit_bounds(bounds);
        }
    }
}

/// Bearing used to place the synthetic destination for a target name.
pub fn destination_bearing(target_name: &str) -> f64 {
    ((target_name.chars().count() * 45) % 360) as f64
}

/// Point `distance_km` away from `from`, in a direction derived from the name.
pub fn synthetic_destination(from: LatLng, target_name: &str, distance_km: f64) -> LatLng {
    destination_point(from, destination_bearing(target_name), distance_km.max(0.0) * 1000.0)
}
