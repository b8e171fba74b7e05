use crate::api::error::{ApiError, IdQuery};
use crate::catalog::{ObjectCatalog, TrackedObject};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;

/// Shared state for catalog endpoints
pub struct ObjectAppState {
    pub catalog: Arc<ObjectCatalog>,
}

/// Create object catalog router
pub fn create_object_router(state: Arc<ObjectAppState>) -> Router {
    Router::new()
        .route("/api/objects", get(list_objects))
        .route("/api/object", get(get_object))
        .with_state(state)
}

/// GET /api/objects - All tracked objects with metadata
async fn list_objects(State(state): State<Arc<ObjectAppState>>) -> Json<Vec<TrackedObject>> {
    Json(state.catalog.all().into_iter().cloned().collect())
}

/// GET /api/object?id=X - One tracked object
async fn get_object(
    State(state): State<Arc<ObjectAppState>>,
    Query(params): Query<IdQuery>,
) -> Result<Json<TrackedObject>, ApiError> {
    let object_id = params.parse()?;

    state
        .catalog
        .get(object_id)
        .cloned()
        .map(Json)
        .ok_or(ApiError::ObjectNotFound)
}
