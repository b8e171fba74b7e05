use crate::catalog::ObjectCatalog;
use crate::state::{MetricsSnapshot, StateHub};
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;

/// Shared state for the stats endpoint
pub struct StatsAppState {
    pub hub: Arc<StateHub>,
    pub catalog: Arc<ObjectCatalog>,
    pub update_interval_ms: u64,
    pub map_width: f64,
    pub map_height: f64,
}

#[derive(Debug, Serialize)]
pub struct MapDimensions {
    pub width: f64,
    pub height: f64,
}

/// System stats response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_objects: usize,
    pub total_positions: usize,
    pub connected_clients: usize,
    pub update_interval_ms: u64,
    pub map_dimensions: MapDimensions,
    pub delivery: MetricsSnapshot,
}

/// Create stats router
pub fn create_stats_router(state: Arc<StatsAppState>) -> Router {
    Router::new()
        .route("/api/stats", get(get_stats))
        .with_state(state)
}

/// GET /api/stats
async fn get_stats(State(state): State<Arc<StatsAppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        total_objects: state.catalog.len(),
        total_positions: state.hub.position_count(),
        connected_clients: state.hub.subscriber_count(),
        update_interval_ms: state.update_interval_ms,
        map_dimensions: MapDimensions {
            width: state.map_width,
            height: state.map_height,
        },
        delivery: state.hub.metrics().get_snapshot(),
    })
}
