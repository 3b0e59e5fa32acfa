//! Shared response types for the API server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// A JSON error payload with its HTTP status.
///
/// Built from `(status, message)` or `(status, message, detail)` tuples so
/// endpoints can construct errors inline.
#[derive(Debug)]
pub struct ApiErrorType {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl From<(StatusCode, &str)> for ApiErrorType {
    fn from((status, message): (StatusCode, &str)) -> Self {
        Self {
            status,
            message: message.to_string(),
            detail: None,
        }
    }
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, message, detail): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            message: message.to_string(),
            detail,
        }
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        let body = match self.detail {
            Some(detail) => json!({ "message": self.message, "detail": detail }),
            None => json!({ "message": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_carries_status() {
        let err = ApiErrorType::from((StatusCode::BAD_REQUEST, "missing field"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
