//! GPX import for pre-authored ride paths.

use crate::geo::LatLng;
use crate::routing::RoutingError;
use std::path::Path;

/// Parse GPX content into an ordered path.
///
/// Track points are preferred, then route points, then waypoints.
pub fn parse_gpx_path(content: &[u8]) -> Result<Vec<LatLng>, RoutingError> {
    let gpx_data: gpx::Gpx = gpx::read(content)
        .map_err(|e| RoutingError::InvalidResponse(format!("GPX parse error: {}", e)))?;

    let mut points: Vec<LatLng> = gpx_data
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .map(|p| LatLng::new(p.point().y(), p.point().x()))
        .collect();

    if points.is_empty() {
        points = gpx_data
            .routes
            .iter()
            .flat_map(|route| route.points.iter())
            .map(|p| LatLng::new(p.point().y(), p.point().x()))
            .collect();
    }

    if points.is_empty() {
        points = gpx_data
            .waypoints
            .iter()
            .map(|p| LatLng::new(p.point().y(), p.point().x()))
            .collect();
    }

    if points.len() < 2 {
        return Err(RoutingError::InvalidPath(points.len()));
    }

    Ok(points)
}

/// Read and parse a GPX file.
pub fn load_gpx_path(path: &Path) -> Result<Vec<LatLng>, RoutingError> {
    let content = std::fs::read(path)
        .map_err(|e| RoutingError::RequestFailed(format!("{}: {}", path.display(), e)))?;
    parse_gpx_path(&content)
}
