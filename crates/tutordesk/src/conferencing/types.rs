/// Types exchanged with the conferencing provider
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// What to schedule. The start instant carries the wall-clock offset the
/// caller booked in; the provider also receives the timezone name so it can
/// render invitations in that zone.
#[derive(Debug, Clone)]
pub struct MeetingSpec {
    pub topic: String,
    pub start_time: DateTime<FixedOffset>,
    pub duration_minutes: i64,
    pub timezone: String,
}

/// A meeting the provider has scheduled for us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledMeeting {
    pub provider_id: String,
    pub join_url: String,
    pub password: String,
}

/// Recording lookup result: a share page plus per-file download URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRecording {
    pub share_url: String,
    pub files: Vec<RecordingFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingFile {
    pub download_url: String,
    pub file_type: String,
}
