// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod clock;
pub mod config;
pub mod json_response;
pub mod memory_directory;
pub mod position_sinks;
