//! Calendar-week time windows.
//!
//! Two week conventions coexist in the product: the teacher dashboard uses
//! Sunday-start weeks, the aggregate counters use Monday-start (ISO) weeks.
//! Windows are computed from a single captured `now`, bounded to
//! `[00:00:00.000, 23:59:59.999]` wall-clock in the display offset, and
//! returned as UTC instants so record comparisons stay in instant space.

use chrono::{DateTime, Datelike, Days, FixedOffset, TimeZone, Utc};

/// Which day a calendar week begins on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekStart {
    Sunday,
    Monday,
}

/// An inclusive instant range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Inclusive on both bounds.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Computes the calendar week containing `now`, as seen from `offset`.
pub fn current_week(now: DateTime<Utc>, offset: FixedOffset, week_start: WeekStart) -> TimeWindow {
    let local = now.with_timezone(&offset);
    let days_back = match week_start {
        WeekStart::Sunday => local.weekday().num_days_from_sunday(),
        WeekStart::Monday => local.weekday().num_days_from_monday(),
    } as u64;

    let first_day = local.date_naive() - Days::new(days_back);
    let last_day = first_day + Days::new(6);

    // Fixed offsets have no DST gaps, so these local times always exist.
    let start = offset
        .from_local_datetime(&first_day.and_hms_milli_opt(0, 0, 0, 0).unwrap())
        .unwrap();
    let end = offset
        .from_local_datetime(&last_day.and_hms_milli_opt(23, 59, 59, 999).unwrap())
        .unwrap();

    TimeWindow {
        start: start.with_timezone(&Utc),
        end: end.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    fn local(offset: FixedOffset, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        offset
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_sunday_week_from_midweek() {
        // 2024-01-03 is a Wednesday.
        let now = local(ist(), 2024, 1, 3, 12, 0);
        let window = current_week(now, ist(), WeekStart::Sunday);

        let start_local = window.start.with_timezone(&ist());
        let end_local = window.end.with_timezone(&ist());
        // Week runs Sunday Dec 31 through Saturday Jan 6.
        assert_eq!(start_local.to_rfc3339(), "2023-12-31T00:00:00+05:30");
        assert_eq!(end_local.to_rfc3339(), "2024-01-06T23:59:59.999+05:30");
    }

    #[test]
    fn test_monday_week_from_midweek() {
        let now = local(ist(), 2024, 1, 3, 12, 0);
        let window = current_week(now, ist(), WeekStart::Monday);

        let start_local = window.start.with_timezone(&ist());
        let end_local = window.end.with_timezone(&ist());
        assert_eq!(start_local.to_rfc3339(), "2024-01-01T00:00:00+05:30");
        assert_eq!(end_local.to_rfc3339(), "2024-01-07T23:59:59.999+05:30");
    }

    #[test]
    fn test_sunday_is_its_own_week_start() {
        // 2024-01-07 is a Sunday.
        let now = local(ist(), 2024, 1, 7, 8, 0);
        let window = current_week(now, ist(), WeekStart::Sunday);
        let start_local = window.start.with_timezone(&ist());
        assert_eq!(start_local.to_rfc3339(), "2024-01-07T00:00:00+05:30");
    }

    #[test]
    fn test_sunday_falls_in_previous_monday_week() {
        // Under the ISO convention a Sunday belongs to the week that began
        // six days earlier.
        let now = local(ist(), 2024, 1, 7, 8, 0);
        let window = current_week(now, ist(), WeekStart::Monday);
        let start_local = window.start.with_timezone(&ist());
        assert_eq!(start_local.to_rfc3339(), "2024-01-01T00:00:00+05:30");
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let now = local(ist(), 2024, 1, 3, 12, 0);
        let window = current_week(now, ist(), WeekStart::Monday);

        assert!(window.contains(window.start));
        assert!(window.contains(window.end));
        assert!(!window.contains(window.start - chrono::Duration::milliseconds(1)));
        assert!(!window.contains(window.end + chrono::Duration::milliseconds(1)));
        assert!(window.contains(now));
    }
}
