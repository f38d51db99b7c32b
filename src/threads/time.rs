//! Conversion of stored UTC instants into the forum's display timezone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{AppError, Result};
use crate::models::DisplayTime;

/// Every post is shown in Finnish local time (UTC+2, DST aware)
pub const DISPLAY_TZ: Tz = chrono_tz::Europe::Helsinki;

/// Parse a stored RFC3339 instant
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::Parse(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Split a stored instant into `D.M.YYYY` and `HH:MM` in [`DISPLAY_TZ`]
pub fn normalize(raw: &str) -> Result<DisplayTime> {
    let local = parse_timestamp(raw)?.with_timezone(&DISPLAY_TZ);
    Ok(DisplayTime {
        day: local.format("%-d.%-m.%Y").to_string(),
        time: local.format("%H:%M").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winter_is_utc_plus_two() {
        let t = normalize("2024-12-02T15:44:52Z").unwrap();
        assert_eq!(t.day, "2.12.2024");
        assert_eq!(t.time, "17:44");
    }

    #[test]
    fn test_summer_is_utc_plus_three() {
        // Crosses midnight in local time
        let t = normalize("2024-07-01T21:30:00Z").unwrap();
        assert_eq!(t.day, "2.7.2024");
        assert_eq!(t.time, "00:30");
    }

    #[test]
    fn test_single_digit_hours_are_padded() {
        let t = normalize("2025-01-05T05:07:00Z").unwrap();
        assert_eq!(t.day, "5.1.2025");
        assert_eq!(t.time, "07:07");
    }

    #[test]
    fn test_fractional_seconds_are_accepted() {
        let t = normalize("2024-12-02T15:44:52.250500Z").unwrap();
        assert_eq!(t.time, "17:44");
    }

    #[test]
    fn test_malformed_input_is_parse_error() {
        for raw in ["", "yesterday", "2024-12-02", "2024-13-02T15:44:52Z"] {
            assert!(matches!(normalize(raw), Err(AppError::Parse(_))), "{raw}");
        }
    }
}
