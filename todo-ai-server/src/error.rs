//! Error types for the AI server.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error types for model acquisition and request dispatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested capability was not loaded at startup.
    #[error("{0}")]
    CapabilityUnavailable(String),

    #[error("{0}")]
    NotFound(String),

    /// The request body could not be read as the expected JSON.
    #[error(transparent)]
    InvalidRequest(#[from] JsonRejection),

    #[error("Load failed: {0}")]
    LoadFailed(String),

    /// A loaded model failed while serving a request.
    #[error("Inference failed: {0}")]
    InvocationFailed(String),

    #[error("Model invocation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Backend communication error: {0}")]
    Communication(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::CapabilityUnavailable(_) => (StatusCode::BAD_REQUEST, "capability_unavailable"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::InvalidRequest(rejection) => (rejection.status(), "invalid_request"),
            Error::LoadFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "load_failed"),
            Error::InvocationFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "inference_failed"),
            Error::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            Error::Communication(_) => (StatusCode::BAD_GATEWAY, "communication_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
