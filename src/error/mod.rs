//! Error types shared by the coordinator, its transports and the HTTP layer.
mod test;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Failures of a single room operation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("room not found")]
    RoomNotFound,
    #[error("room is full ({capacity} players)")]
    CapacityExceeded { capacity: usize },
    #[error("game already started")]
    AlreadyStarted,
}

/// Failures of the room registry.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("capacity must be between {min} and {max}, got {requested}")]
    InvalidCapacity {
        requested: usize,
        min: usize,
        max: usize,
    },
}

/// Failures reported by a transport adapter.
///
/// `InvalidMessage` is recoverable: the session rejects that single message and keeps reading.
/// Every other variant ends the session.
#[derive(thiserror::Error, Debug)]
pub enum ConnectionError {
    #[error("connection closed")]
    Closed,
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl ConnectionError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConnectionError::InvalidMessage(_))
    }
}

impl From<serde_json::Error> for ConnectionError {
    fn from(err: serde_json::Error) -> Self {
        ConnectionError::InvalidMessage(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

/// HTTP-facing error rendered as `{"error": {"code", "message"}}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND".to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::RoomNotFound => ApiError::not_found(err.to_string()),
            _ => ApiError::bad_request(err.to_string()),
        }
    }
}
