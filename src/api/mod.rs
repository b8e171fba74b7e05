// HTTP, SSE and WebSocket APIs

pub mod error;
pub mod objects;
pub mod positions;
pub mod stats;
pub mod websocket;

pub use error::{ApiError, IdQuery};
pub use objects::{create_object_router, ObjectAppState};
pub use positions::{create_position_router, PositionAppState};
pub use stats::{create_stats_router, StatsAppState};
pub use websocket::{create_ws_router, ws_handler, WsAppState};

use crate::catalog::ObjectCatalog;
use crate::config::RtlsConfig;
use crate::state::StateHub;
use axum::http::{header, Method};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

/// Assemble every router, CORS, and the static file fallback
pub fn create_app(config: &RtlsConfig, hub: Arc<StateHub>, catalog: Arc<ObjectCatalog>) -> Router {
    let positions = Arc::new(PositionAppState {
        hub: Arc::clone(&hub),
        keepalive: Duration::from_secs(config.stream.sse_keepalive_seconds.max(1)),
    });
    let objects = Arc::new(ObjectAppState {
        catalog: Arc::clone(&catalog),
    });
    let stats = Arc::new(StatsAppState {
        hub: Arc::clone(&hub),
        catalog,
        update_interval_ms: config.simulation.tick_interval().as_millis() as u64,
        map_width: config.area.width,
        map_height: config.area.height,
    });
    let ws = Arc::new(WsAppState { hub });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(create_position_router(positions))
        .merge(create_object_router(objects))
        .merge(create_stats_router(stats))
        .merge(create_ws_router(ws))
        .fallback_service(ServeDir::new(&config.server.static_dir))
        .layer(cors)
}
