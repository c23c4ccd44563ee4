// Mesh companion - location debouncing and traceroute resolution for a LoRa mesh client
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
