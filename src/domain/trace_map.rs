// Traceroute map model - resolved node paths ready for geographic rendering
use super::geo;
use super::node::NodeInfo;
use super::position::GeoPoint;
use super::traceroute::Direction;
use serde::Serialize;

/// Perpendicular spacing between the forward and back polylines.
pub const DEFAULT_TRACE_SPACING_M: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRouteMap {
    pub forward_path: Vec<NodeInfo>,
    pub back_path: Vec<NodeInfo>,
    /// Report the map was rebuilt from, kept for re-display
    pub source_trace: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapSegment {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub direction: Direction,
}

impl TraceRouteMap {
    /// Polyline segments for both directions, forward shifted to one side of
    /// each edge and back to the other so overlapping legs stay visible.
    pub fn segments(&self, offset_m: f64) -> Vec<MapSegment> {
        let mut segments = build_segments(&self.forward_path, Direction::Forward, offset_m, 1.0);
        segments.extend(build_segments(
            &self.back_path,
            Direction::Backward,
            offset_m,
            -1.0,
        ));
        segments
    }

    pub fn total_distance_km(&self) -> f64 {
        path_distance_km(&self.forward_path) + path_distance_km(&self.back_path)
    }
}

fn path_distance_km(nodes: &[NodeInfo]) -> f64 {
    let points: Vec<GeoPoint> = nodes.iter().filter_map(NodeInfo::valid_position).collect();
    geo::path_distance_km(&points)
}

fn build_segments(
    nodes: &[NodeInfo],
    direction: Direction,
    offset_m: f64,
    side: f64,
) -> Vec<MapSegment> {
    nodes
        .windows(2)
        .filter_map(|pair| {
            let raw_from = pair[0].valid_position()?;
            let raw_to = pair[1].valid_position()?;

            // Bearing is taken south to north so both directions of the same
            // edge share one perpendicular.
            let (south, north) = if raw_from.latitude < raw_to.latitude {
                (raw_from, raw_to)
            } else {
                (raw_to, raw_from)
            };
            let perpendicular = geo::bearing(south, north) + 90.0 * side;

            Some(MapSegment {
                from: geo::offset_meters(raw_from, offset_m, perpendicular),
                to: geo::offset_meters(raw_to, offset_m, perpendicular),
                direction,
            })
        })
        .collect()
}
