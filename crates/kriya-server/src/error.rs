//! Handler error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kriya_store::StoreError;
use serde_json::json;

/// Errors returned by node HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Missing or invalid `x-access-key` / `x-secret-key` credentials.
    #[error("invalid credentials")]
    Unauthorized,

    /// The requested object does not exist.
    #[error("object not found: {key}")]
    NotFound {
        /// The missing key.
        key: String,
    },

    /// A stored object no longer matches its recorded checksum.
    #[error("checksum mismatch for object {key}")]
    ChecksumMismatch {
        /// The corrupt key.
        key: String,
    },

    /// Malformed request.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },

    /// The local store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::ChecksumMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
