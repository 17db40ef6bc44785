//! Server error types and the JSON error body

use crate::classify::classify;
use crate::config::ConfigError;
use crate::outcome::FailureKind;
use crate::service::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Server result type
pub type ServerResult<T> = Result<T, ServerError>;

/// Failures while starting or running the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Body returned for every failed detection
///
/// ```json
/// {"status_code": 404, "status": "Not Found", "error": "resource not found"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status_code: u16,
    pub status: String,
    pub error: String,
}

impl ErrorBody {
    pub fn from_kind(kind: FailureKind) -> Self {
        let code = status_for(kind);
        Self {
            status_code: code.as_u16(),
            status: code.canonical_reason().unwrap_or_default().to_string(),
            error: kind.message().to_string(),
        }
    }
}

fn status_for(kind: FailureKind) -> StatusCode {
    StatusCode::from_u16(classify(kind).status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// A failed detection, rendered as [`ErrorBody`] with the classified status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError(pub FailureKind);

impl From<FailureKind> for ApiError {
    fn from(kind: FailureKind) -> Self {
        Self(kind)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (status_for(self.0), Json(ErrorBody::from_kind(self.0))).into_response()
    }
}
