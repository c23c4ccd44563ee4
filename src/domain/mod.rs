// Domain layer - Value types and pure geometry
pub mod emit_policy;
pub mod geo;
pub mod node;
pub mod position;
pub mod route_discovery;
pub mod trace_map;
pub mod traceroute;
