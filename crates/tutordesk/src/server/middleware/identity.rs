//! Caller identity extraction.
//!
//! Token verification happens upstream of this service; the verifier
//! forwards the authenticated caller id in the `x-auth-user` header.
//! Routes layered with `require_identity` reject requests that arrive
//! without it, and handlers read the id through the `Identity` extension.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::server::types::ApiErrorType;

pub const IDENTITY_HEADER: &str = "x-auth-user";

/// The verified caller id for this request.
#[derive(Debug, Clone)]
pub struct Identity(pub String);

pub async fn require_identity(mut request: Request, next: Next) -> Response {
    let caller = request
        .headers()
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .filter(|id| !id.is_empty());

    match caller {
        Some(id) => {
            request.extensions_mut().insert(Identity(id));
            next.run(request).await
        }
        None => ApiErrorType::from((StatusCode::UNAUTHORIZED, "Missing caller identity"))
            .into_response(),
    }
}
