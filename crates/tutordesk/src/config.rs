//! Environment-driven application configuration, read once at startup.

use std::env;

use anyhow::Context;
use chrono::FixedOffset;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub store_path: String,
    /// Offset used to interpret incoming wall-clock times and to format
    /// timestamps for display. Stored instants are always UTC.
    pub display_offset: FixedOffset,
    /// Timezone name forwarded to the conferencing provider so invitations
    /// render in the booking zone.
    pub display_timezone: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let store_path = env::var("STORE_PATH").unwrap_or_else(|_| "./tutordesk.db".into());

        let offset = env::var("DISPLAY_UTC_OFFSET").unwrap_or_else(|_| "+05:30".into());
        let display_offset = offset
            .parse::<FixedOffset>()
            .with_context(|| format!("DISPLAY_UTC_OFFSET {offset:?} is not a UTC offset"))?;

        let display_timezone =
            env::var("DISPLAY_TIMEZONE").unwrap_or_else(|_| "Asia/Kolkata".into());

        Ok(Self {
            port,
            store_path,
            display_offset,
            display_timezone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_parses() {
        let offset = "+05:30".parse::<FixedOffset>().unwrap();
        assert_eq!(offset.local_minus_utc(), 5 * 3600 + 30 * 60);

        let west = "-08:00".parse::<FixedOffset>().unwrap();
        assert_eq!(west.local_minus_utc(), -8 * 3600);
    }
}
