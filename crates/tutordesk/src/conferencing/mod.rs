/// Conferencing provider gateway
mod client;
mod error;
mod types;

pub use client::{ConferencingClient, ConferencingConfig};
pub use error::ConferencingError;
pub use types::{MeetingRecording, MeetingSpec, RecordingFile, ScheduledMeeting};
