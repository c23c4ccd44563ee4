// Mesh node domain model
use super::position::GeoPoint;
use super::route_discovery::HopId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub num: HopId,
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub position: Option<GeoPoint>,
}

impl NodeInfo {
    pub fn new(num: HopId, long_name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            num,
            long_name: long_name.into(),
            short_name: short_name.into(),
            position: None,
        }
    }

    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.position = Some(GeoPoint::new(latitude, longitude));
        self
    }

    /// Stand-in for a node the directory has never heard from.
    pub fn placeholder(num: HopId) -> Self {
        let suffix = format!("{:04x}", num & 0xffff);
        Self::new(num, format!("Meshtastic {suffix}"), suffix)
    }

    /// `Long Name (SHRT)`, or just the short name when the long one is blank.
    pub fn display_name(&self) -> String {
        if self.long_name.trim().is_empty() {
            self.short_name.clone()
        } else {
            format!("{} ({})", self.long_name, self.short_name)
        }
    }

    /// Position usable for map rendering. Firmware reports 0/0 for unknown.
    pub fn valid_position(&self) -> Option<GeoPoint> {
        self.position
            .filter(|p| p.is_valid() && p.latitude != 0.0 && p.longitude != 0.0)
    }
}
