// Application state for HTTP handlers
use crate::application::location_service::LocationService;
use crate::application::position_sink::PositionSink;
use crate::application::traceroute_service::TracerouteService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub traceroute_service: TracerouteService,
    /// Live session bound to the monotonic clock
    pub location_service: LocationService,
    pub radio_sink: Arc<dyn PositionSink>,
    pub hunter_id: String,
}
