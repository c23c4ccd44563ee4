// HTTP request handlers
use crate::application::location_service::LocationService;
use crate::application::position_sink::PositionSink;
use crate::application::traceroute_report;
use crate::domain::position::PositionFix;
use crate::domain::route_discovery::{FullRoute, TraceroutePacket};
use crate::domain::trace_map::{DEFAULT_TRACE_SPACING_M, MapSegment, TraceRouteMap};
use crate::domain::traceroute::{ResolvedPath, RouteSummary, SnrSpan};
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::config::PolicyPreset;
use crate::infrastructure::json_response::{accepts_brotli, json_response};
use crate::infrastructure::position_sinks::ChannelSink;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

const FILTER_STREAM_BUFFER: usize = 32;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracerouteReportResponse {
    pub report: String,
    pub spans: Vec<SnrSpan>,
    pub summary: String,
    pub forward: Option<ResolvedPath>,
    pub backward: Option<ResolvedPath>,
}

#[derive(Debug, Deserialize)]
pub struct MapRequest {
    pub report: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapResponse {
    #[serde(flatten)]
    pub map: TraceRouteMap,
    pub segments: Vec<MapSegment>,
    pub total_distance_km: f64,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub preset: Option<PolicyPreset>,
    pub fixes: Vec<PositionFix>,
}

#[derive(Debug, Deserialize)]
pub struct TransmitRequest {
    pub fixes: Vec<PositionFix>,
}

fn into_response(result: Result<Response, StatusCode>) -> Response {
    match result {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_nodes(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let nodes = state.traceroute_service.directory().list_nodes();
    into_response(json_response(&nodes, accepts_brotli(&headers)).await)
}

/// Render a traceroute reply. Anything that is not a terminal reply gets 204.
pub async fn traceroute_report(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(packet): Json<TraceroutePacket>,
) -> Response {
    let service = &state.traceroute_service;
    let Some(route) = FullRoute::from_packet(&packet) else {
        tracing::debug!("Packet {} is not a traceroute reply", packet.id);
        return StatusCode::NO_CONTENT.into_response();
    };
    let report = service.report_for_route(&route);

    let resolved = service.resolve_route(&route);
    let body = TracerouteReportResponse {
        spans: traceroute_report::colorize(&report),
        summary: RouteSummary::from_route(Some(&route)).to_string(),
        forward: resolved.forward,
        backward: resolved.backward,
        report,
    };

    into_response(json_response(&body, accepts_brotli(&headers)).await)
}

pub async fn traceroute_map(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<MapRequest>,
) -> Response {
    let Some(map) = state.traceroute_service.map_availability(&request.report) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let body = MapResponse {
        segments: map.segments(DEFAULT_TRACE_SPACING_M),
        total_distance_km: map.total_distance_km(),
        map,
    };
    into_response(json_response(&body, accepts_brotli(&headers)).await)
}

pub async fn traceroute_export(
    State(state): State<Arc<AppState>>,
    Json(packet): Json<TraceroutePacket>,
) -> Json<serde_json::Value> {
    Json(
        state
            .traceroute_service
            .export_json(&packet, &state.hunter_id),
    )
}

/// Replay a recorded track through a fresh debouncer and stream back the
/// fixes it would have sent. Judged on each fix's own capture time.
pub async fn filter_positions(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<FilterRequest>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    let policy = request
        .preset
        .map(PolicyPreset::policy)
        .unwrap_or(*state.location_service.policy());
    let service = LocationService::replay(policy);

    let (tx, rx) = mpsc::channel(FILTER_STREAM_BUFFER);
    tokio::spawn(async move {
        let sink: Arc<dyn PositionSink> = Arc::new(ChannelSink::new(tx));
        let stats = service
            .forward(futures::stream::iter(request.fixes), sink)
            .await;
        tracing::debug!(
            "Filtered track: {} of {} fixes kept",
            stats.delivered,
            stats.received
        );
    });

    stream_from_receiver(rx, compress)
}

/// Push a batch of fixes through the live session to the radio.
pub async fn transmit_positions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TransmitRequest>,
) -> impl IntoResponse {
    let stats = state
        .location_service
        .forward(futures::stream::iter(request.fixes), state.radio_sink.clone())
        .await;
    Json(stats)
}
