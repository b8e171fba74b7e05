use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// `?id=` query parameter shared by the single-item lookups
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    pub fn parse(&self) -> Result<i64, ApiError> {
        let raw = self.id.as_deref().ok_or(ApiError::MissingId)?;
        raw.trim().parse::<i64>().map_err(|_| ApiError::InvalidId)
    }
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// API error types
#[derive(Debug, PartialEq)]
pub enum ApiError {
    MissingId,
    InvalidId,
    PositionNotFound,
    ObjectNotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::MissingId => (StatusCode::BAD_REQUEST, "Missing id parameter"),
            ApiError::InvalidId => (StatusCode::BAD_REQUEST, "Invalid id parameter"),
            ApiError::PositionNotFound => (StatusCode::NOT_FOUND, "Position not found"),
            ApiError::ObjectNotFound => (StatusCode::NOT_FOUND, "Object not found"),
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
        });

        (status, body).into_response()
    }
}
