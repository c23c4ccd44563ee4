// Traceroute service - resolve route discovery replies against the node directory
use crate::application::node_directory::NodeDirectory;
use crate::application::traceroute_report::{self, BACKWARD_HEADER, FORWARD_HEADER, NODE_MARKER};
use crate::domain::node::NodeInfo;
use crate::domain::route_discovery::{FullRoute, TraceroutePacket};
use crate::domain::trace_map::TraceRouteMap;
use crate::domain::traceroute::{Direction, ResolvedPath, RouteSummary, TracerouteExport};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MapParseError {
    #[error("report has no {0} section")]
    MissingSection(&'static str),

    #[error("resolved {forward} forward and {back} back nodes, both directions are required")]
    IncompletePath { forward: usize, back: usize },
}

/// Both directions of a route, resolved to display names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute {
    pub forward: Option<ResolvedPath>,
    pub backward: Option<ResolvedPath>,
}

#[derive(Clone)]
pub struct TracerouteService {
    directory: Arc<dyn NodeDirectory>,
}

impl TracerouteService {
    pub fn new(directory: Arc<dyn NodeDirectory>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Arc<dyn NodeDirectory> {
        &self.directory
    }

    /// Formatted report for a traceroute reply, `None` for anything else.
    pub fn traceroute_response(&self, packet: &TraceroutePacket) -> Option<String> {
        FullRoute::from_packet(packet).map(|route| self.report_for_route(&route))
    }

    pub fn report_for_route(&self, route: &FullRoute) -> String {
        traceroute_report::format_report(route, |num| self.directory.display_name(num))
    }

    pub fn resolve_route(&self, route: &FullRoute) -> ResolvedRoute {
        let name = |num| self.directory.display_name(num);
        let forward = (!route.forward.is_empty()).then(|| {
            ResolvedPath::resolve(Direction::Forward, &route.forward, &route.forward_snr, name)
        });
        let backward = (!route.back.is_empty()).then(|| {
            ResolvedPath::resolve(Direction::Backward, &route.back, &route.back_snr, name)
        });

        ResolvedRoute { forward, backward }
    }

    pub fn summarize(&self, packet: &TraceroutePacket) -> RouteSummary {
        RouteSummary::from_route(FullRoute::from_packet(packet).as_ref())
    }

    /// Structured export of a traceroute reply. Inapplicable packets export `{}`.
    pub fn export_json(&self, packet: &TraceroutePacket, hunter_id: &str) -> serde_json::Value {
        let Some(route) = FullRoute::from_packet(packet) else {
            return serde_json::json!({});
        };
        let resolved = self.resolve_route(&route);

        let export = TracerouteExport {
            id_hunter: hunter_id.to_string(),
            from: packet.discovery.origin,
            to: packet.discovery.destination,
            id: packet.id,
            rx_snr: packet.rx_snr,
            rx_rssi: packet.rx_rssi,
            hop_start: packet.discovery.hop_start,
            forward: resolved.forward,
            backward: resolved.backward,
            kind: "traceroute",
        };

        serde_json::to_value(export).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize traceroute export: {}", e);
            serde_json::json!({})
        })
    }

    /// Rebuild map paths from a formatted report.
    ///
    /// Best effort: any failure, or a report where either direction resolves
    /// to no nodes, yields `None`.
    pub fn map_availability(&self, report: &str) -> Option<TraceRouteMap> {
        match self.parse_map(report) {
            Ok(map) => Some(map),
            Err(e) => {
                tracing::warn!("Could not parse traceroute for map visualization: {}", e);
                None
            }
        }
    }

    fn parse_map(&self, report: &str) -> Result<TraceRouteMap, MapParseError> {
        let mut sections = report.split(BACKWARD_HEADER);
        let forward_text = sections
            .next()
            .ok_or(MapParseError::MissingSection("forward"))?;
        let back_text = sections
            .next()
            .ok_or(MapParseError::MissingSection("backward"))?;

        // Header words must not be matched against node names
        let forward_text = forward_text.trim_start();
        let forward_text = forward_text
            .strip_prefix(FORWARD_HEADER)
            .unwrap_or(forward_text);

        let forward_path = self.resolve_section(forward_text);
        let back_path = self.resolve_section(back_text);

        if forward_path.is_empty() || back_path.is_empty() {
            return Err(MapParseError::IncompletePath {
                forward: forward_path.len(),
                back: back_path.len(),
            });
        }

        Ok(TraceRouteMap {
            forward_path,
            back_path,
            source_trace: report.to_string(),
        })
    }

    /// Tokens between node markers, each looked up by name containment.
    /// Tokens that match nothing are dropped.
    fn resolve_section(&self, text: &str) -> Vec<NodeInfo> {
        text.trim()
            .split(NODE_MARKER)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .filter_map(|token| {
                let node = self.directory.find_by_name_contains(token);
                if node.is_none() {
                    tracing::debug!("No node matches traceroute token {:?}", token);
                }
                node
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::route_discovery::{HopId, PortNum, RouteDiscoveryRecord};
    use crate::domain::traceroute::SnrQuality;

    /// Minimal directory matching the same way the real one does.
    struct StaticDirectory(Vec<NodeInfo>);

    impl NodeDirectory for StaticDirectory {
        fn display_name(&self, num: HopId) -> String {
            self.0
                .iter()
                .find(|n| n.num == num)
                .cloned()
                .unwrap_or_else(|| NodeInfo::placeholder(num))
                .display_name()
        }

        fn find_by_name_contains(&self, text: &str) -> Option<NodeInfo> {
            self.0
                .iter()
                .find(|n| !n.long_name.is_empty() && text.contains(&n.long_name))
                .cloned()
        }

        fn list_nodes(&self) -> Vec<NodeInfo> {
            self.0.clone()
        }
    }

    fn service() -> TracerouteService {
        TracerouteService::new(Arc::new(StaticDirectory(vec![
            NodeInfo::new(100, "Summit", "SUM").with_position(46.0, 9.0),
            NodeInfo::new(150, "Relay", "RLY").with_position(45.5, 9.1),
            NodeInfo::new(200, "Base", "BAS").with_position(45.0, 9.2),
        ])))
    }

    fn packet(hop_start: i32, return_snr: Vec<i8>) -> TraceroutePacket {
        TraceroutePacket {
            id: 42,
            port: PortNum::TracerouteApp,
            rx_snr: 6.0,
            rx_rssi: -80,
            discovery: RouteDiscoveryRecord {
                origin: 100,
                destination: 200,
                outward_hops: vec![150],
                return_hops: vec![150],
                outward_snr: vec![-40, -28],
                return_snr,
                hop_start,
                want_response: false,
            },
        }
    }

    #[test]
    fn test_response_uses_directory_names() {
        let report = service().traceroute_response(&packet(1, vec![-60, -64])).unwrap();
        assert!(report.starts_with("Route traced toward destination:\n\n■ Base (BAS)\n⇊ -10.0 dB"));
        assert!(report.contains("Route traced back to us:\n\n■ Summit (SUM)\n⇊ -15.0 dB"));
    }

    #[test]
    fn test_probe_request_produces_nothing() {
        let mut probe = packet(1, vec![-60, -64]);
        probe.discovery.want_response = true;
        assert_eq!(service().traceroute_response(&probe), None);
        assert_eq!(service().summarize(&probe), RouteSummary::NoResponse);
        assert_eq!(service().export_json(&probe, "!1"), serde_json::json!({}));
    }

    #[test]
    fn test_unknown_hops_get_placeholder_names() {
        let mut reply = packet(0, vec![]);
        reply.discovery.outward_hops = vec![0xcafe];
        let report = service().traceroute_response(&reply).unwrap();
        assert!(report.contains("■ Meshtastic cafe (cafe)"));
    }

    #[test]
    fn test_resolve_route_structures() {
        let route = FullRoute::from_packet(&packet(1, vec![-60, -64])).unwrap();
        let resolved = service().resolve_route(&route);

        let forward = resolved.forward.unwrap();
        assert_eq!(forward.direction, Direction::Forward);
        let nums: Vec<HopId> = forward.path.iter().map(|n| n.node_num).collect();
        assert_eq!(nums, vec![200, 150, 100]);
        assert_eq!(forward.path[1].snr, Some(-10.0));
        assert_eq!(forward.path[2].snr, Some(-7.0));

        let backward = resolved.backward.unwrap();
        assert_eq!(backward.path[0].user_name, "Summit (SUM)");
        assert_eq!(backward.path[2].snr, Some(-16.0));
    }

    #[test]
    fn test_back_route_absent_without_hop_start() {
        let route = FullRoute::from_packet(&packet(0, vec![-60, -64])).unwrap();
        let resolved = service().resolve_route(&route);
        assert!(resolved.forward.is_some());
        assert!(resolved.backward.is_none());
    }

    #[test]
    fn test_export_json_shape() {
        let json = service().export_json(&packet(1, vec![-60, -64]), "!0000beef");
        assert_eq!(json["type"], "traceroute");
        assert_eq!(json["idHunter"], "!0000beef");
        assert_eq!(json["from"], 100);
        assert_eq!(json["to"], 200);
        assert_eq!(json["forward"]["direction"], "forward");
        assert_eq!(json["forward"]["path"][0]["snr"], serde_json::Value::Null);
        assert_eq!(json["forward"]["path"][1]["snr"], -10.0);
        assert_eq!(json["backward"]["path"][2]["userName"], "Base (BAS)");
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            service().summarize(&packet(1, vec![-60, -64])),
            RouteSummary::Hops { hops: 1 }
        );
        assert_eq!(
            service().summarize(&packet(0, vec![])),
            RouteSummary::Asymmetric { towards: 1, back: 0 }
        );
    }

    #[test]
    fn test_map_round_trips_through_report_text() {
        let svc = service();
        let report = svc.traceroute_response(&packet(1, vec![-60, -64])).unwrap();
        let map = svc.map_availability(&report).unwrap();

        let forward: Vec<HopId> = map.forward_path.iter().map(|n| n.num).collect();
        let back: Vec<HopId> = map.back_path.iter().map(|n| n.num).collect();
        assert_eq!(forward, vec![200, 150, 100]);
        assert_eq!(back, vec![100, 150, 200]);
        assert_eq!(map.source_trace, report);

        let spans = traceroute_report::colorize(&map.source_trace);
        assert_eq!(spans[0].quality, SnrQuality::Fair);
    }

    #[test]
    fn test_map_requires_both_directions() {
        let svc = service();
        let report = svc.traceroute_response(&packet(0, vec![])).unwrap();
        assert_eq!(svc.map_availability(&report), None);

        let one_sided = "Route traced toward destination:\n\n■ Base (BAS)\n\n\
                         Route traced back to us:\n\n■ Nobody (NOB)";
        assert_eq!(svc.map_availability(one_sided), None);
    }

    #[test]
    fn test_map_drops_unmatched_hops() {
        let report = "Route traced toward destination:\n\n■ Base (BAS)\n⇊ ? dB\n■ Ghost (GH)\n⇊ ? dB\n■ Summit (SUM)\n\n\
                      Route traced back to us:\n\n■ Summit (SUM)\n⇊ ? dB\n■ Base (BAS)";
        let map = service().map_availability(report).unwrap();
        assert_eq!(map.forward_path.len(), 2);
        assert_eq!(map.back_path.len(), 2);
    }

    #[test]
    fn test_map_ignores_header_words() {
        let svc = TracerouteService::new(Arc::new(StaticDirectory(vec![
            NodeInfo::new(100, "Summit", "SUM").with_position(46.0, 9.0),
            NodeInfo::new(150, "Relay", "RLY").with_position(45.5, 9.1),
            NodeInfo::new(200, "Base", "BAS").with_position(45.0, 9.2),
            NodeInfo::new(300, "to", "TO").with_position(44.0, 9.3),
        ])));
        let report = svc.traceroute_response(&packet(1, vec![-60, -64])).unwrap();
        let map = svc.map_availability(&report).unwrap();

        let forward: Vec<HopId> = map.forward_path.iter().map(|n| n.num).collect();
        let back: Vec<HopId> = map.back_path.iter().map(|n| n.num).collect();
        assert_eq!(forward, vec![200, 150, 100]);
        assert_eq!(back, vec![100, 150, 200]);
    }

    #[test]
    fn test_report_for_route_matches_response() {
        let svc = service();
        let reply = packet(1, vec![-60, -64]);
        let route = FullRoute::from_packet(&reply).unwrap();
        assert_eq!(
            Some(svc.report_for_route(&route)),
            svc.traceroute_response(&reply)
        );
    }

    #[test]
    fn test_map_from_garbage_text() {
        assert_eq!(service().map_availability(""), None);
        assert_eq!(service().map_availability("no markers here"), None);
    }

    #[test]
    fn test_parse_map_errors() {
        let svc = service();
        assert_eq!(
            svc.parse_map("■ Base"),
            Err(MapParseError::MissingSection("backward"))
        );
        assert_eq!(
            svc.parse_map("■ Base\nRoute traced back to us:\n■ Nobody"),
            Err(MapParseError::IncompletePath {
                forward: 1,
                back: 0
            })
        );
    }
}
