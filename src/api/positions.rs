use crate::api::error::{ApiError, IdQuery};
use crate::state::{PositionRecord, StateHub};
use axum::{
    extract::{Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
    routing::get,
    Router,
};
use futures::{future, Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Shared state for the position endpoints
pub struct PositionAppState {
    pub hub: Arc<StateHub>,
    /// Interval between SSE keep-alive comments
    pub keepalive: Duration,
}

/// Create position API router
pub fn create_position_router(state: Arc<PositionAppState>) -> Router {
    Router::new()
        .route("/api/positions", get(list_positions))
        .route("/api/position", get(get_position))
        .route("/api/positions/stream", get(stream_positions))
        .with_state(state)
}

/// GET /api/positions - Latest record for every object
async fn list_positions(State(state): State<Arc<PositionAppState>>) -> Json<Vec<PositionRecord>> {
    Json(state.hub.get_all())
}

/// GET /api/position?id=X - Latest record for one object
async fn get_position(
    State(state): State<Arc<PositionAppState>>,
    Query(params): Query<IdQuery>,
) -> Result<Json<PositionRecord>, ApiError> {
    let object_id = params.parse()?;

    state
        .hub
        .get(object_id)
        .map(Json)
        .ok_or(ApiError::PositionNotFound)
}

/// GET /api/positions/stream - Server-sent events
///
/// Registers a subscription, replays the current snapshot, then emits one
/// `data:` event per delivered record. The subscription lives inside the
/// response stream, so a client disconnect drops it and frees its slot.
async fn stream_positions(
    State(state): State<Arc<PositionAppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.hub.subscribe();
    let snapshot = state.hub.get_all();

    info!(
        subscription = %subscription.id(),
        snapshot = snapshot.len(),
        subscribers = state.hub.subscriber_count(),
        "SSE client connected"
    );

    let events = futures::stream::iter(snapshot)
        .chain(subscription)
        .filter_map(|position| future::ready(to_event(&position)));

    Sse::new(events).keep_alive(KeepAlive::new().interval(state.keepalive))
}

fn to_event(position: &PositionRecord) -> Option<Result<Event, Infallible>> {
    match Event::default().json_data(position) {
        Ok(event) => Some(Ok(event)),
        Err(e) => {
            warn!(object_id = position.object_id, error = %e, "Failed to encode position, skipping");
            None
        }
    }
}
