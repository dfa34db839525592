//! API error types and JSON error response formatting.
//!
//! ApiError gives every endpoint the same JSON error shape and maps internal
//! errors to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use parla_flow::FlowError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 503 Service Unavailable - component disabled or not ready.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        match &err {
            FlowError::SessionNotFound(_) => ApiError::NotFound(err.to_string()),
            FlowError::Disabled => ApiError::ServiceUnavailable(err.to_string()),
            FlowError::EmptyMessage
            | FlowError::MessageTooLong(_)
            | FlowError::UnknownOption { .. } => ApiError::BadRequest(err.to_string()),
            FlowError::UnknownFlow(_) | FlowError::SessionState(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_session_not_found_maps_to_404() {
        let api_err: ApiError = FlowError::SessionNotFound(Uuid::nil()).into();
        assert!(matches!(api_err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_disabled_maps_to_503() {
        let api_err: ApiError = FlowError::Disabled.into();
        assert!(matches!(api_err, ApiError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_client_mistakes_map_to_400() {
        let api_err: ApiError = FlowError::EmptyMessage.into();
        assert!(matches!(api_err, ApiError::BadRequest(_)));

        let api_err: ApiError = FlowError::UnknownOption {
            flow: parla_core::FlowId::initial(),
            option_id: "x".into(),
        }
        .into();
        assert!(matches!(api_err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_internal_state_maps_to_500() {
        let api_err: ApiError = FlowError::SessionState("poisoned".into()).into();
        assert!(matches!(api_err, ApiError::Internal(_)));
    }
}
