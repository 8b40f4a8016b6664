//! Admin API error envelope.
//!
//! Every admin failure serializes as `{"status": ..., "message": ...}`
//! with the status repeated in the HTTP response line.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::BalancerError;

/// JSON error body returned by the admin surface and terminal forwarding
/// failures.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    /// The terminal response when no backend can serve a request.
    pub fn service_unavailable() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "service not available")
    }
}

impl From<BalancerError> for ApiError {
    fn from(err: BalancerError) -> Self {
        let status = match &err {
            BalancerError::AlreadyExists(_) => StatusCode::CONFLICT,
            BalancerError::NotFound(_) => StatusCode::NOT_FOUND,
            BalancerError::InvalidAddress(_) | BalancerError::InvalidAlgorithm(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
