//! API endpoint for assignment records.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::server::types::ApiErrorType;
use crate::server::util::{non_empty, store_error_response};
use crate::store::AssignmentRecord;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub questions: Option<Vec<serde_json::Value>>,
}

/// POST /assignment/create-assignment
pub async fn post_create_assignment(
    State(s): State<Arc<AppState>>,
    Json(req): Json<CreateAssignmentRequest>,
) -> Response {
    let Some(teacher_id) = non_empty(req.teacher_id) else {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "teacherId is required"))
            .into_response();
    };

    let record = AssignmentRecord {
        assignment_id: Uuid::new_v4().to_string(),
        teacher_id,
        questions: req.questions.unwrap_or_default(),
        created_at: Utc::now(),
    };

    info!(
        teacher = %record.teacher_id,
        assignment = %record.assignment_id,
        questions = record.questions.len(),
        "POST /assignment/create-assignment"
    );

    match s.store.put_assignment(&record) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "message": "Assignment created successfully",
                "assignment_id": record.assignment_id,
            })),
        )
            .into_response(),
        Err(e) => store_error_response(e),
    }
}
