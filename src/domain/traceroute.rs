// Traceroute presentation models
use super::route_discovery::{FullRoute, HopId, UNKNOWN_SNR};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edges at or above this SNR (dB) are good.
pub const SNR_GOOD_THRESHOLD: f32 = -7.0;
/// Edges at or above this SNR (dB) and below the good threshold are fair.
pub const SNR_FAIR_THRESHOLD: f32 = -15.0;

/// Convert a quarter-dB sample to dB. The unknown marker yields `None`.
pub fn snr_db(raw: i8) -> Option<f32> {
    (raw != UNKNOWN_SNR).then(|| raw as f32 / 4.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNode {
    pub node_num: HopId,
    pub user_name: String,
    /// SNR of the edge arriving at this node; always `None` for the first node
    pub snr: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPath {
    pub direction: Direction,
    pub path: Vec<ResolvedNode>,
}

impl ResolvedPath {
    /// Pair each hop with its display name and incoming edge SNR.
    ///
    /// When the sample count does not equal `hops.len() - 1` every edge is
    /// left unknown rather than zipping a partial list.
    pub fn resolve<F>(direction: Direction, hops: &[HopId], snr: &[i8], display_name: F) -> Self
    where
        F: Fn(HopId) -> String,
    {
        let aligned = snr.len() + 1 == hops.len();
        let path = hops
            .iter()
            .enumerate()
            .map(|(i, &num)| ResolvedNode {
                node_num: num,
                user_name: display_name(num),
                snr: if i > 0 && aligned {
                    snr_db(snr[i - 1])
                } else {
                    None
                },
            })
            .collect();

        Self { direction, path }
    }
}

/// Signal-quality band used to colour SNR tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnrQuality {
    Good,
    Fair,
    Poor,
    Unknown,
}

impl SnrQuality {
    pub fn classify(snr_db: Option<f32>) -> Self {
        match snr_db {
            None => SnrQuality::Unknown,
            Some(v) if v >= SNR_GOOD_THRESHOLD => SnrQuality::Good,
            Some(v) if v >= SNR_FAIR_THRESHOLD => SnrQuality::Fair,
            Some(_) => SnrQuality::Poor,
        }
    }

    /// RGB colour as `#rrggbb`
    pub fn color(self) -> &'static str {
        match self {
            SnrQuality::Good => "#00ff00",
            SnrQuality::Fair => "#ffe600",
            SnrQuality::Poor => "#f7931a",
            SnrQuality::Unknown => "#888888",
        }
    }
}

/// Byte range of one `⇊ <snr> dB` token inside a formatted report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnrSpan {
    pub start: usize,
    pub end: usize,
    pub snr_db: Option<f32>,
    pub quality: SnrQuality,
    pub color: &'static str,
}

/// One-line description of a traceroute result for log listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RouteSummary {
    NoResponse,
    Direct,
    Hops { hops: usize },
    Asymmetric { towards: usize, back: usize },
}

impl RouteSummary {
    pub fn from_route(route: Option<&FullRoute>) -> Self {
        let Some(route) = route else {
            return RouteSummary::NoResponse;
        };

        let forward = route.forward.len();
        let back = route.back.len();
        if forward <= 2 {
            RouteSummary::Direct
        } else if forward == back {
            RouteSummary::Hops { hops: forward - 2 }
        } else {
            RouteSummary::Asymmetric {
                towards: forward.saturating_sub(2),
                back: back.saturating_sub(2),
            }
        }
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteSummary::NoResponse => write!(f, "No response"),
            RouteSummary::Direct => write!(f, "Direct"),
            RouteSummary::Hops { hops: 1 } => write!(f, "1 hop"),
            RouteSummary::Hops { hops } => write!(f, "{hops} hops"),
            RouteSummary::Asymmetric { towards, back } => {
                write!(f, "{towards} hops towards, {back} hops back")
            }
        }
    }
}

/// Machine-readable traceroute result handed to upstream services.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracerouteExport {
    pub id_hunter: String,
    pub from: u32,
    pub to: u32,
    pub id: u32,
    pub rx_snr: f32,
    pub rx_rssi: i32,
    pub hop_start: i32,
    pub forward: Option<ResolvedPath>,
    pub backward: Option<ResolvedPath>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}
