//! API endpoints for meeting scheduling, listing, and status aggregation.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::batch::settle_all;
use crate::conferencing::{ConferencingError, MeetingSpec};
use crate::meeting::{
    aggregate_counts, classify, current_week, filter_by_owner_and_window, filter_by_participant,
    sort_by_start_time, MeetingStatus, WeekStart, DEFAULT_DURATION_MINUTES,
};
use crate::server::middleware::identity::Identity;
use crate::server::types::ApiErrorType;
use crate::server::util::{non_empty, store_error_response};
use crate::store::MeetingRecord;
use crate::types::AppState;

/// Availability flag set for participants of a live booking.
const STATUS_BOOKED: &str = "booked";
/// Availability flag restored when their meeting is removed.
const STATUS_AVAILABLE: &str = "available";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    #[serde(default)]
    pub meeting_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub participants: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
}

/// POST /meeting/create-meeting
///
/// Schedules a meeting with the conferencing provider, stores the record,
/// and marks every participant as booked.
pub async fn post_create_meeting(
    State(s): State<Arc<AppState>>,
    Json(req): Json<CreateMeetingRequest>,
) -> Response {
    let (Some(name), Some(date), Some(time)) = (
        non_empty(req.meeting_name),
        non_empty(req.date),
        non_empty(req.time),
    ) else {
        return ApiErrorType::from((
            StatusCode::BAD_REQUEST,
            "meetingName, date (YYYY-MM-DD) & time (HH:mm) are required",
        ))
        .into_response();
    };

    let Ok(date) = NaiveDate::parse_from_str(&date, "%Y-%m-%d") else {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "date must be YYYY-MM-DD"))
            .into_response();
    };
    let Ok(time) = NaiveTime::parse_from_str(&time, "%H:%M") else {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "time must be HH:mm")).into_response();
    };

    let duration = req.duration.unwrap_or(DEFAULT_DURATION_MINUTES);
    if duration <= 0 {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "duration must be positive"))
            .into_response();
    }

    // Wall-clock input is interpreted in the configured display offset and
    // persisted as a UTC instant.
    let offset = s.config.display_offset;
    let start_local = offset.from_local_datetime(&date.and_time(time)).unwrap();

    info!(title = %name, start = %start_local, "POST /meeting/create-meeting");

    let spec = MeetingSpec {
        topic: name.clone(),
        start_time: start_local,
        duration_minutes: duration,
        timezone: s.config.display_timezone.clone(),
    };
    let scheduled = match s.conferencing.create_meeting(&spec).await {
        Ok(m) => m,
        Err(e) => return conferencing_error_response(e),
    };

    let record = MeetingRecord {
        meeting_id: scheduled.provider_id,
        title: name,
        description: req.description.unwrap_or_default(),
        start_time: start_local.with_timezone(&Utc),
        duration_minutes: Some(duration),
        owner: req.owner.unwrap_or_default(),
        participants: req.participants.unwrap_or_default(),
        join_url: scheduled.join_url,
        password: scheduled.password,
        is_active: true,
    };

    if let Err(e) = s.store.put_meeting(&record) {
        return store_error_response(e);
    }

    set_participant_availability(&s, &record.participants, STATUS_BOOKED).await;

    (StatusCode::CREATED, Json(created_meeting_view(&record, offset))).into_response()
}

/// GET /meeting/list-meetings
///
/// Returns every stored meeting with its derived status.
pub async fn get_list_meetings(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /meeting/list-meetings");

    let meetings = match s.store.scan_meetings() {
        Ok(m) => m,
        Err(e) => return store_error_response(e),
    };

    // One instant for the whole response, so every record is classified
    // against the same clock.
    let now = Utc::now();
    let offset = s.config.display_offset;
    let items: Vec<_> = meetings
        .iter()
        .map(|m| meeting_view(m, classify(m, now), offset))
        .collect();

    (StatusCode::OK, Json(json!({ "meetings": items }))).into_response()
}

/// GET /meeting/get-meeting-stats
pub async fn get_meeting_stats(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /meeting/get-meeting-stats");

    match s.store.scan_meetings() {
        Ok(meetings) => {
            let counts = aggregate_counts(&meetings, Utc::now());
            (StatusCode::OK, Json(json!({ "stats": counts }))).into_response()
        }
        Err(e) => store_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteMeetingRequest {
    #[serde(default)]
    pub meeting_id: Option<String>,
}

/// DELETE /meeting/delete-meeting
///
/// Removes the provider-side meeting, deletes the record, and restores
/// participant availability.
pub async fn delete_meeting(
    State(s): State<Arc<AppState>>,
    Json(req): Json<DeleteMeetingRequest>,
) -> Response {
    let Some(meeting_id) = non_empty(req.meeting_id) else {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "Meeting ID is required"))
            .into_response();
    };

    info!(meeting_id = %meeting_id, "DELETE /meeting/delete-meeting");

    let record = match s.store.get_meeting(&meeting_id) {
        Ok(r) => r,
        Err(e) => return store_error_response(e),
    };

    match s.conferencing.delete_meeting(&meeting_id).await {
        Ok(()) => {}
        Err(ConferencingError::NotFound { .. }) => {
            warn!(meeting_id = %meeting_id, "Provider meeting already gone, removing record anyway");
        }
        Err(e) => return conferencing_error_response(e),
    }

    if let Err(e) = s.store.delete_meeting(&meeting_id) {
        return store_error_response(e);
    }

    if let Some(record) = record {
        set_participant_availability(&s, &record.participants, STATUS_AVAILABLE).await;
    }

    (
        StatusCode::OK,
        Json(json!({
            "message": "Meeting deleted successfully",
            "meeting_id": meeting_id,
        })),
    )
        .into_response()
}

/// GET /meetings/fetch-teachers-meetings
///
/// The caller's meetings in the current Sunday-start week, status-annotated
/// and sorted ascending by start time.
pub async fn get_teachers_meetings(
    State(s): State<Arc<AppState>>,
    Extension(Identity(owner)): Extension<Identity>,
) -> Response {
    info!(owner = %owner, "GET /meetings/fetch-teachers-meetings");

    let meetings = match s.store.scan_meetings() {
        Ok(m) => m,
        Err(e) => return store_error_response(e),
    };

    let now = Utc::now();
    let offset = s.config.display_offset;
    let window = current_week(now, offset, WeekStart::Sunday);

    let mut meetings = filter_by_owner_and_window(meetings, &owner, &window);
    sort_by_start_time(&mut meetings);

    let data: Vec<_> = meetings
        .iter()
        .map(|m| meeting_view(m, classify(m, now), offset))
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "message": "Meetings fetched successfully",
            "data": data,
            "count": data.len(),
            "weekRange": {
                "start": window.start.with_timezone(&offset).to_rfc3339(),
                "end": window.end.with_timezone(&offset).to_rfc3339(),
            },
        })),
    )
        .into_response()
}

/// GET /meetings/fetch-aggregates
///
/// Weekly counters for the caller's dashboard: meetings this ISO week plus
/// the student roster size.
pub async fn get_aggregates(
    State(s): State<Arc<AppState>>,
    Extension(Identity(owner)): Extension<Identity>,
) -> Response {
    info!(owner = %owner, "GET /meetings/fetch-aggregates");

    let meetings = match s.store.scan_meetings() {
        Ok(m) => m,
        Err(e) => return store_error_response(e),
    };
    let student_count = match s.store.count_students() {
        Ok(c) => c,
        Err(e) => return store_error_response(e),
    };

    let window = current_week(Utc::now(), s.config.display_offset, WeekStart::Monday);
    let meetings_count = filter_by_owner_and_window(meetings, &owner, &window).len();

    (
        StatusCode::OK,
        Json(json!({
            "meetings_count": meetings_count,
            "student_count": student_count,
        })),
    )
        .into_response()
}

/// GET /meeting/fetch-historical-meetings
///
/// Everything the caller has ever owned, status-annotated.
pub async fn get_historical_meetings(
    State(s): State<Arc<AppState>>,
    Extension(Identity(owner)): Extension<Identity>,
) -> Response {
    info!(owner = %owner, "GET /meeting/fetch-historical-meetings");

    let meetings = match s.store.scan_meetings_by_owner(&owner) {
        Ok(m) => m,
        Err(e) => return store_error_response(e),
    };

    let now = Utc::now();
    let offset = s.config.display_offset;
    let items: Vec<_> = meetings
        .iter()
        .map(|m| meeting_view(m, classify(m, now), offset))
        .collect();

    (StatusCode::OK, Json(json!({ "meetings": items }))).into_response()
}

/// GET /meeting/fetch-student-meetings
///
/// Meetings whose participant set contains the caller.
pub async fn get_student_meetings(
    State(s): State<Arc<AppState>>,
    Extension(Identity(student_id)): Extension<Identity>,
) -> Response {
    info!(student = %student_id, "GET /meeting/fetch-student-meetings");

    let meetings = match s.store.scan_meetings() {
        Ok(m) => m,
        Err(e) => return store_error_response(e),
    };

    let now = Utc::now();
    let offset = s.config.display_offset;
    let mine = filter_by_participant(meetings, &student_id);
    let items: Vec<_> = mine
        .iter()
        .map(|m| meeting_view(m, classify(m, now), offset))
        .collect();

    (StatusCode::OK, Json(json!({ "meetings": items }))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct RecordingQuery {
    #[serde(default)]
    pub meeting_id: Option<String>,
}

/// GET /meeting/get-recording?meeting_id=...
///
/// Share and download URLs for a meeting's cloud recording. Answers 404
/// until the provider has finished processing.
pub async fn get_recording(
    State(s): State<Arc<AppState>>,
    Query(query): Query<RecordingQuery>,
) -> Response {
    let Some(meeting_id) = non_empty(query.meeting_id) else {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "Meeting ID is required"))
            .into_response();
    };

    info!(meeting_id = %meeting_id, "GET /meeting/get-recording");

    match s.conferencing.recording(&meeting_id).await {
        Ok(recording) => (StatusCode::OK, Json(recording)).into_response(),
        Err(e) => conferencing_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReassignOwnerRequest {
    #[serde(default)]
    pub meeting_id: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

/// POST /meeting/reassign-owner
///
/// Ownership reassignment is the only permitted mutation of a stored
/// meeting record.
pub async fn post_reassign_owner(
    State(s): State<Arc<AppState>>,
    Json(req): Json<ReassignOwnerRequest>,
) -> Response {
    let (Some(meeting_id), Some(owner)) = (non_empty(req.meeting_id), non_empty(req.owner)) else {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "meeting_id and owner are required"))
            .into_response();
    };

    info!(meeting_id = %meeting_id, owner = %owner, "POST /meeting/reassign-owner");

    match s.store.reassign_owner(&meeting_id, &owner) {
        Ok(Some(updated)) => (
            StatusCode::OK,
            Json(created_meeting_view(&updated, s.config.display_offset)),
        )
            .into_response(),
        Ok(None) => {
            ApiErrorType::from((StatusCode::NOT_FOUND, "Meeting not found")).into_response()
        }
        Err(e) => store_error_response(e),
    }
}

// --- helpers ---

/// Upserts every participant's availability flag, settling all updates and
/// reporting a summary; one failed update never aborts the rest.
async fn set_participant_availability(state: &Arc<AppState>, participants: &[String], status: &str) {
    if participants.is_empty() {
        return;
    }

    let now = Utc::now();
    let tasks: Vec<_> = participants
        .iter()
        .map(|student| {
            let store = &state.store;
            async move {
                store
                    .set_student_availability(student, status, now)
                    .map(|row| row.student_id)
            }
        })
        .collect();

    let outcome = settle_all(tasks).await;
    for failure in &outcome.failed {
        error!(error = %failure, "Participant availability update failed");
    }
    info!(
        status = status,
        succeeded = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "Participant availability settled"
    );
}

/// Response shape for a freshly created (or reassigned) meeting record.
fn created_meeting_view(meeting: &MeetingRecord, offset: FixedOffset) -> serde_json::Value {
    json!({
        "MEETING_ID": meeting.meeting_id,
        "title": meeting.title,
        "url": meeting.join_url,
        "password": meeting.password,
        "meeting_time": meeting.start_time.with_timezone(&offset).to_rfc3339(),
        "isActive": meeting.is_active,
        "owner": meeting.owner,
        "participants": meeting.participants,
        "description": meeting.description,
        "duration": meeting.duration_minutes,
    })
}

/// List-item shape consumed by the dashboards. Date and time are formatted
/// in the display offset; classification stays in instant space.
fn meeting_view(
    meeting: &MeetingRecord,
    status: MeetingStatus,
    offset: FixedOffset,
) -> serde_json::Value {
    let local = meeting.start_time.with_timezone(&offset);
    json!({
        "id": meeting.meeting_id,
        "title": meeting.title,
        "description": meeting.description,
        "date": local.format("%Y-%m-%d").to_string(),
        "time": local.format("%H:%M").to_string(),
        "duration": meeting.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
        "teacherId": meeting.owner,
        "studentIds": meeting.participants,
        "meetingLink": meeting.join_url,
        "status": status.as_str(),
    })
}

/// Converts a conferencing gateway failure to an API response.
fn conferencing_error_response(error: ConferencingError) -> Response {
    let (status, message) = match &error {
        ConferencingError::Auth { .. } => (
            StatusCode::BAD_GATEWAY,
            "Conferencing provider rejected our credentials",
        ),
        ConferencingError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            "Recording or meeting not found at provider",
        ),
        ConferencingError::Config { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Conferencing gateway misconfigured",
        ),
        _ => (
            StatusCode::BAD_GATEWAY,
            "Conferencing provider request failed",
        ),
    };

    error!(error = %error, "Conferencing gateway failure");
    ApiErrorType::from((status, message, Some(error.to_string()))).into_response()
}
