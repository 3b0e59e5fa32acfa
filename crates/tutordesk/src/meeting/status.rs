//! Status derivation for stored meetings.
//!
//! A meeting's status is never persisted; it is recomputed from the stored
//! start instant and duration every time a record is read. Callers capture
//! `now` once per request and pass it down so every record in a response is
//! classified against the same instant.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::window::TimeWindow;
use crate::store::MeetingRecord;

/// Duration assumed for records that were stored without one.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Lifecycle state of a meeting relative to some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Scheduled,
    Ongoing,
    Completed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "scheduled",
            MeetingStatus::Ongoing => "ongoing",
            MeetingStatus::Completed => "completed",
        }
    }
}

/// Classifies an instant against a meeting's `[start, start + duration]`
/// span. Both span endpoints count as ongoing.
pub fn derive_status(
    now: DateTime<Utc>,
    start: DateTime<Utc>,
    duration_minutes: i64,
) -> MeetingStatus {
    let end = start + Duration::minutes(duration_minutes);
    if now < start {
        MeetingStatus::Scheduled
    } else if now <= end {
        MeetingStatus::Ongoing
    } else {
        MeetingStatus::Completed
    }
}

/// Classifies a stored record, applying the duration default.
pub fn classify(meeting: &MeetingRecord, now: DateTime<Utc>) -> MeetingStatus {
    derive_status(
        now,
        meeting.start_time,
        meeting.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
    )
}

/// Status counts over a collection of meetings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub scheduled: usize,
    pub ongoing: usize,
    pub completed: usize,
    pub total: usize,
}

/// Single-pass aggregation; each record is classified exactly once.
pub fn aggregate_counts(meetings: &[MeetingRecord], now: DateTime<Utc>) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for meeting in meetings {
        match classify(meeting, now) {
            MeetingStatus::Scheduled => counts.scheduled += 1,
            MeetingStatus::Ongoing => counts.ongoing += 1,
            MeetingStatus::Completed => counts.completed += 1,
        }
        counts.total += 1;
    }
    counts
}

/// Keeps meetings whose owner matches exactly and whose start falls inside
/// the window (both bounds inclusive).
pub fn filter_by_owner_and_window(
    meetings: Vec<MeetingRecord>,
    owner: &str,
    window: &TimeWindow,
) -> Vec<MeetingRecord> {
    meetings
        .into_iter()
        .filter(|m| m.owner == owner && window.contains(m.start_time))
        .collect()
}

/// Keeps meetings whose participant set contains `student_id`.
pub fn filter_by_participant(meetings: Vec<MeetingRecord>, student_id: &str) -> Vec<MeetingRecord> {
    meetings
        .into_iter()
        .filter(|m| m.has_participant(student_id))
        .collect()
}

/// Sorts ascending by start time. The sort is stable, so records sharing a
/// start instant keep their relative order.
pub fn sort_by_start_time(meetings: &mut [MeetingRecord]) {
    meetings.sort_by_key(|m| m.start_time);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    fn meeting(id: &str, start: DateTime<Utc>, duration: Option<i64>) -> MeetingRecord {
        MeetingRecord {
            meeting_id: id.to_string(),
            title: String::new(),
            description: String::new(),
            start_time: start,
            duration_minutes: duration,
            owner: "t1".to_string(),
            participants: vec!["s1".to_string()],
            join_url: String::new(),
            password: String::new(),
            is_active: true,
        }
    }

    #[test]
    fn test_derive_status_basic() {
        let start = instant(10, 0);
        assert_eq!(derive_status(instant(9, 0), start, 60), MeetingStatus::Scheduled);
        assert_eq!(derive_status(instant(10, 30), start, 60), MeetingStatus::Ongoing);
        assert_eq!(derive_status(instant(11, 1), start, 60), MeetingStatus::Completed);
    }

    #[test]
    fn test_derive_status_boundaries_inclusive() {
        let start = instant(10, 0);
        // Exactly at start and exactly at end both count as ongoing.
        assert_eq!(derive_status(start, start, 60), MeetingStatus::Ongoing);
        assert_eq!(derive_status(instant(11, 0), start, 60), MeetingStatus::Ongoing);
    }

    #[test]
    fn test_status_monotonic_over_time() {
        let start = instant(10, 0);
        let instants = [
            instant(8, 0),
            instant(9, 59),
            instant(10, 0),
            instant(10, 59),
            instant(11, 0),
            instant(11, 1),
            instant(23, 0),
        ];

        let mut last_rank = 0;
        for now in instants {
            let rank = match derive_status(now, start, 60) {
                MeetingStatus::Scheduled => 0,
                MeetingStatus::Ongoing => 1,
                MeetingStatus::Completed => 2,
            };
            assert!(rank >= last_rank, "status went backward at {now}");
            last_rank = rank;
        }
    }

    #[test]
    fn test_classify_defaults_missing_duration_to_60() {
        let m = meeting("m1", instant(10, 0), None);
        assert_eq!(classify(&m, instant(11, 0)), MeetingStatus::Ongoing);
        assert_eq!(classify(&m, instant(11, 1)), MeetingStatus::Completed);
    }

    #[test]
    fn test_aggregate_counts_sum_to_total() {
        let now = instant(10, 30);
        let meetings = vec![
            meeting("m1", instant(9, 0), Some(30)),   // completed
            meeting("m2", instant(10, 0), Some(60)),  // ongoing
            meeting("m3", instant(12, 0), Some(60)),  // scheduled
            meeting("m4", instant(10, 30), None),     // ongoing (boundary)
            meeting("m5", instant(13, 0), Some(15)),  // scheduled
        ];

        let counts = aggregate_counts(&meetings, now);
        assert_eq!(counts.scheduled, 2);
        assert_eq!(counts.ongoing, 2);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.total, 5);
        assert_eq!(
            counts.scheduled + counts.ongoing + counts.completed,
            counts.total
        );
    }

    #[test]
    fn test_filter_by_participant_exact_membership() {
        let mut a = meeting("m1", instant(10, 0), None);
        a.participants = vec!["student-12".to_string()];
        let mut b = meeting("m2", instant(10, 0), None);
        b.participants = vec!["student-1".to_string()];

        // "student-1" must not match "student-12" by prefix.
        let hits = filter_by_participant(vec![a, b], "student-1");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].meeting_id, "m2");
    }

    #[test]
    fn test_filter_by_owner_and_window_inclusive_bounds() {
        let window = TimeWindow {
            start: instant(10, 0),
            end: instant(12, 0),
        };
        let meetings = vec![
            meeting("before", instant(9, 59), None),
            meeting("at-start", instant(10, 0), None),
            meeting("inside", instant(11, 0), None),
            meeting("at-end", instant(12, 0), None),
            meeting("after", instant(12, 1), None),
        ];

        let hits = filter_by_owner_and_window(meetings, "t1", &window);
        let ids: Vec<_> = hits.iter().map(|m| m.meeting_id.as_str()).collect();
        assert_eq!(ids, ["at-start", "inside", "at-end"]);

        let none = filter_by_owner_and_window(
            vec![meeting("other", instant(11, 0), None)],
            "someone-else",
            &window,
        );
        assert!(none.is_empty());
    }

    #[test]
    fn test_sort_by_start_time_stable_and_idempotent() {
        let mut meetings = vec![
            meeting("late", instant(12, 0), None),
            meeting("tie-a", instant(10, 0), None),
            meeting("tie-b", instant(10, 0), None),
            meeting("early", instant(9, 0), None),
        ];

        sort_by_start_time(&mut meetings);
        let ids: Vec<_> = meetings.iter().map(|m| m.meeting_id.clone()).collect();
        assert_eq!(ids, ["early", "tie-a", "tie-b", "late"]);

        // Sorting an already-sorted sequence changes nothing.
        sort_by_start_time(&mut meetings);
        let again: Vec<_> = meetings.iter().map(|m| m.meeting_id.clone()).collect();
        assert_eq!(ids, again);
    }
}
