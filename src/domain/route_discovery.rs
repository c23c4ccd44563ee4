// Route discovery (traceroute) messages and full-route reconstruction
use serde::{Deserialize, Serialize};

/// Mesh node number as it appears in hop lists.
pub type HopId = u32;

/// Raw SNR value firmware uses when a hop's signal quality was not recorded.
pub const UNKNOWN_SNR: i8 = i8::MIN;

/// Application port a mesh packet was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortNum {
    TextMessageApp,
    PositionApp,
    NodeinfoApp,
    RoutingApp,
    TelemetryApp,
    TracerouteApp,
    NeighborinfoApp,
    #[serde(other)]
    UnknownApp,
}

impl PortNum {
    pub fn number(self) -> u32 {
        match self {
            PortNum::UnknownApp => 0,
            PortNum::TextMessageApp => 1,
            PortNum::PositionApp => 3,
            PortNum::NodeinfoApp => 4,
            PortNum::RoutingApp => 5,
            PortNum::TelemetryApp => 67,
            PortNum::TracerouteApp => 70,
            PortNum::NeighborinfoApp => 71,
        }
    }
}

/// Decoded route discovery payload plus the packet fields that frame it.
///
/// Hop lists never contain the endpoints. SNR samples are quarter-dB.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDiscoveryRecord {
    /// Node that answered the traceroute
    pub origin: HopId,
    /// Node that asked for it
    pub destination: HopId,
    #[serde(default)]
    pub outward_hops: Vec<HopId>,
    #[serde(default)]
    pub return_hops: Vec<HopId>,
    #[serde(default)]
    pub outward_snr: Vec<i8>,
    #[serde(default)]
    pub return_snr: Vec<i8>,
    #[serde(default)]
    pub hop_start: i32,
    #[serde(default)]
    pub want_response: bool,
}

/// A received mesh packet carrying a route discovery record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceroutePacket {
    #[serde(default)]
    pub id: u32,
    pub port: PortNum,
    #[serde(default)]
    pub rx_snr: f32,
    #[serde(default)]
    pub rx_rssi: i32,
    pub discovery: RouteDiscoveryRecord,
}

impl TraceroutePacket {
    /// Terminal traceroute reply, as opposed to a probe or another app's packet.
    pub fn is_traceroute_response(&self) -> bool {
        self.port == PortNum::TracerouteApp && !self.discovery.want_response
    }
}

/// Hop sequences with the implicit endpoints spliced in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullRoute {
    /// `[destination, ..outward_hops, origin]`
    pub forward: Vec<HopId>,
    /// `[origin, ..return_hops, destination]`, or empty when the back route is not meaningful
    pub back: Vec<HopId>,
    pub forward_snr: Vec<i8>,
    pub back_snr: Vec<i8>,
}

impl FullRoute {
    /// Splice endpoints into the record's hop lists.
    pub fn reconstruct(record: &RouteDiscoveryRecord) -> Self {
        let mut forward = Vec::with_capacity(record.outward_hops.len() + 2);
        forward.push(record.destination);
        forward.extend_from_slice(&record.outward_hops);
        forward.push(record.origin);

        // Firmware only fills the back route when the reply itself was traced
        let back = if record.hop_start > 0 && !record.return_snr.is_empty() {
            let mut back = Vec::with_capacity(record.return_hops.len() + 2);
            back.push(record.origin);
            back.extend_from_slice(&record.return_hops);
            back.push(record.destination);
            back
        } else {
            Vec::new()
        };

        Self {
            forward,
            back,
            forward_snr: record.outward_snr.clone(),
            back_snr: record.return_snr.clone(),
        }
    }

    /// `None` unless the packet is a traceroute response.
    pub fn from_packet(packet: &TraceroutePacket) -> Option<Self> {
        packet
            .is_traceroute_response()
            .then(|| Self::reconstruct(&packet.discovery))
    }

    pub fn has_back_route(&self) -> bool {
        !self.back.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(outward: Vec<HopId>, hop_start: i32, return_snr: Vec<i8>) -> RouteDiscoveryRecord {
        RouteDiscoveryRecord {
            origin: 0xA,
            destination: 0xB,
            outward_hops: outward.clone(),
            return_hops: outward.iter().rev().copied().collect(),
            outward_snr: vec![],
            return_snr,
            hop_start,
            want_response: false,
        }
    }

    #[test]
    fn test_forward_route_splices_endpoints() {
        let route = FullRoute::reconstruct(&record(vec![0x1, 0x2], 3, vec![10, 12, 8]));
        assert_eq!(route.forward, vec![0xB, 0x1, 0x2, 0xA]);
        assert_eq!(route.back, vec![0xA, 0x2, 0x1, 0xB]);
    }

    #[test]
    fn test_direct_route_has_only_endpoints() {
        let route = FullRoute::reconstruct(&record(vec![], 1, vec![20]));
        assert_eq!(route.forward, vec![0xB, 0xA]);
        assert_eq!(route.back, vec![0xA, 0xB]);
    }

    #[test]
    fn test_back_route_requires_hop_start_and_snr() {
        let route = FullRoute::reconstruct(&record(vec![0x1], 0, vec![4]));
        assert!(!route.has_back_route());

        let route = FullRoute::reconstruct(&record(vec![0x1], 2, vec![]));
        assert!(!route.has_back_route());
        assert_eq!(route.forward, vec![0xB, 0x1, 0xA]);
    }

    #[test]
    fn test_from_packet_gates_on_port_and_want_response() {
        let mut packet = TraceroutePacket {
            id: 7,
            port: PortNum::TracerouteApp,
            rx_snr: 5.5,
            rx_rssi: -90,
            discovery: record(vec![0x1], 1, vec![0]),
        };
        assert!(FullRoute::from_packet(&packet).is_some());

        packet.discovery.want_response = true;
        assert!(FullRoute::from_packet(&packet).is_none());

        packet.discovery.want_response = false;
        packet.port = PortNum::TextMessageApp;
        assert!(FullRoute::from_packet(&packet).is_none());
    }

    #[test]
    fn test_port_deserialization() {
        let port: PortNum = serde_json::from_str("\"TRACEROUTE_APP\"").unwrap();
        assert_eq!(port, PortNum::TracerouteApp);
        assert_eq!(port.number(), 70);

        let port: PortNum = serde_json::from_str("\"ATAK_PLUGIN\"").unwrap();
        assert_eq!(port, PortNum::UnknownApp);
    }

    proptest! {
        #[test]
        fn prop_forward_route_is_destination_hops_origin(
            origin in any::<u32>(),
            destination in any::<u32>(),
            hops in proptest::collection::vec(any::<u32>(), 0..8),
        ) {
            let record = RouteDiscoveryRecord {
                origin,
                destination,
                outward_hops: hops.clone(),
                ..Default::default()
            };
            let route = FullRoute::reconstruct(&record);

            prop_assert_eq!(route.forward.len(), hops.len() + 2);
            prop_assert_eq!(route.forward[0], destination);
            prop_assert_eq!(&route.forward[1..=hops.len()], hops.as_slice());
            prop_assert_eq!(route.forward[hops.len() + 1], origin);
        }

        #[test]
        fn prop_no_back_route_without_hop_start(
            hop_start in i32::MIN..=0,
            return_hops in proptest::collection::vec(any::<u32>(), 0..8),
            return_snr in proptest::collection::vec(any::<i8>(), 0..8),
        ) {
            let record = RouteDiscoveryRecord {
                origin: 1,
                destination: 2,
                return_hops,
                return_snr,
                hop_start,
                ..Default::default()
            };
            prop_assert!(FullRoute::reconstruct(&record).back.is_empty());
        }
    }
}
