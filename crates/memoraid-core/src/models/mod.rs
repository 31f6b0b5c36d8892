//! Domain models for the Memoraid care client.

mod alert;
mod log;
mod routine;
mod stats;
mod task;
mod user;

pub use alert::*;
pub use log::*;
pub use routine::*;
pub use stats::*;
pub use task::*;
pub use user::*;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};

/// Parse a backend time-of-day string (`HH:MM` or `HH:MM:SS`).
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// The backend sends `""` for unset dates on routine payloads.
pub(crate) fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_of_day_formats() {
        assert_eq!(
            parse_time_of_day("08:30"),
            NaiveTime::from_hms_opt(8, 30, 0)
        );
        assert_eq!(
            parse_time_of_day("20:05:09"),
            NaiveTime::from_hms_opt(20, 5, 9)
        );
        assert_eq!(parse_time_of_day("8.30"), None);
        assert_eq!(parse_time_of_day(""), None);
    }
}
