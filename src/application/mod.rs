// Application layer - Use cases over the domain
pub mod location_debouncer;
pub mod location_service;
pub mod node_directory;
pub mod position_sink;
pub mod traceroute_report;
pub mod traceroute_service;
