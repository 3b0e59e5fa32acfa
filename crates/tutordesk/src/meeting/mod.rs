/// Meeting lifecycle classification and aggregation
mod status;
mod window;

pub use status::{
    aggregate_counts, classify, derive_status, filter_by_owner_and_window, filter_by_participant,
    sort_by_start_time, MeetingStatus, StatusCounts, DEFAULT_DURATION_MINUTES,
};
pub use window::{current_week, TimeWindow, WeekStart};
