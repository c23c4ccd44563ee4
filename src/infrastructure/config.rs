use crate::domain::emit_policy::{EmitPolicyParams, LocationEmitPolicy, PolicyError, RequestQuality};
use crate::domain::node::NodeInfo;
use crate::domain::position::GeoPoint;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub location: LocationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyPreset {
    #[default]
    Default,
    Live,
}

/// Preset plus optional per-field overrides.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LocationSettings {
    #[serde(default)]
    pub preset: PolicyPreset,
    pub request_interval_ms: Option<u64>,
    pub request_min_distance_m: Option<f32>,
    pub request_quality: Option<RequestQuality>,
    pub emit_min_distance_m: Option<f32>,
    pub emit_max_interval_ms: Option<u64>,
    pub emit_max_accuracy_m: Option<f32>,
    pub emit_on_accuracy_improvement_factor: Option<f32>,
    pub emit_on_accuracy_improvement_abs_m: Option<f32>,
}

impl LocationSettings {
    pub fn to_policy(&self) -> Result<LocationEmitPolicy, PolicyError> {
        let mut params = match self.preset {
            PolicyPreset::Default => EmitPolicyParams::default(),
            PolicyPreset::Live => EmitPolicyParams::live(),
        };

        if let Some(v) = self.request_interval_ms {
            params.request_interval_ms = v;
        }
        if let Some(v) = self.request_min_distance_m {
            params.request_min_distance_m = v;
        }
        if let Some(v) = self.request_quality {
            params.request_quality = v;
        }
        if let Some(v) = self.emit_min_distance_m {
            params.emit_min_distance_m = v;
        }
        if let Some(v) = self.emit_max_interval_ms {
            params.emit_max_interval_ms = v;
        }
        if let Some(v) = self.emit_max_accuracy_m {
            params.emit_max_accuracy_m = v;
        }
        if let Some(v) = self.emit_on_accuracy_improvement_factor {
            params.emit_on_accuracy_improvement_factor = v;
        }
        if let Some(v) = self.emit_on_accuracy_improvement_abs_m {
            params.emit_on_accuracy_improvement_abs_m = v;
        }

        LocationEmitPolicy::new(params)
    }
}

impl PolicyPreset {
    pub fn policy(self) -> LocationEmitPolicy {
        match self {
            PolicyPreset::Default => LocationEmitPolicy::default(),
            PolicyPreset::Live => LocationEmitPolicy::live(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NodesConfig {
    /// Our own node number; used for the export id when `hunter_id` is unset
    pub my_node_num: Option<u32>,
    pub hunter_id: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeSeed>,
}

impl NodesConfig {
    pub fn hunter_id(&self) -> String {
        match (&self.hunter_id, self.my_node_num) {
            (Some(id), _) => id.clone(),
            (None, Some(num)) => format!("!{:08x}", num),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NodeSeed {
    pub num: u32,
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<NodeSeed> for NodeInfo {
    fn from(seed: NodeSeed) -> Self {
        let position = match (seed.latitude, seed.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };
        NodeInfo {
            num: seed.num,
            long_name: seed.long_name,
            short_name: seed.short_name,
            position,
        }
    }
}

pub fn load_service_config() -> anyhow::Result<ServiceConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/service"))
        .add_source(config::Environment::with_prefix("MESH").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_nodes_config() -> anyhow::Result<NodesConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/nodes").required(false))
        .build()?;

    Ok(settings.try_deserialize()?)
}
