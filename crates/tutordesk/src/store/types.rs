/// Record types persisted in the document store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled meeting as stored in the `meetings` collection.
///
/// `start_time` is an offset-aware UTC instant; wall-clock formatting for
/// display happens at the HTTP boundary only. `duration_minutes` may be
/// absent in older records and defaults to 60 at classification time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub meeting_id: String,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
    pub owner: String,
    pub participants: Vec<String>,
    pub join_url: String,
    pub password: String,
    pub is_active: bool,
}

impl MeetingRecord {
    /// Exact set membership, not substring match.
    pub fn has_participant(&self, student_id: &str) -> bool {
        self.participants.iter().any(|p| p == student_id)
    }
}

/// Append-only payment transaction record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub student_id: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Append-only assignment record. Question order is preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub assignment_id: String,
    pub teacher_id: String,
    pub questions: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Per-student availability flag, upserted as meetings come and go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentAvailability {
    pub student_id: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}
