//! Small helpers shared by the endpoint modules.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::server::types::ApiErrorType;
use crate::store::StoreError;

/// Treats empty and whitespace-only strings as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Converts a persistence failure to an API response.
pub fn store_error_response(error: StoreError) -> Response {
    error!(error = %error, "Record store failure");
    ApiErrorType::from((
        StatusCode::INTERNAL_SERVER_ERROR,
        "Record store operation failed",
        Some(error.to_string()),
    ))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("x".into())), Some("x".to_string()));
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(None), None);
    }
}
