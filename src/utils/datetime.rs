use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp the way it is stored in the database.
///
/// Millisecond precision and a `Z` suffix keep every stored value the same
/// width, so SQL string comparison orders them chronologically.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn timestamp_now() -> String {
    format_timestamp(&Utc::now())
}

pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%A, %B %d at %H:%M UTC").to_string()
}

/// Human readable form of a stored timestamp, falling back to the raw text.
pub fn display_timestamp(stored: &str) -> String {
    parse_timestamp(stored)
        .map(|dt| format_datetime(&dt))
        .unwrap_or_else(|| stored.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_timestamp_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let fractional = whole + Duration::milliseconds(7);

        assert_eq!(format_timestamp(&whole), "2024-03-01T12:00:00.000Z");
        assert_eq!(format_timestamp(&fractional), "2024-03-01T12:00:00.007Z");
        assert!(format_timestamp(&whole) < format_timestamp(&fractional));
    }

    #[test]
    fn test_parse_timestamp_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(&dt)), Some(dt));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_display_timestamp() {
        assert_eq!(
            display_timestamp("2024-03-01T18:30:00.000Z"),
            "Friday, March 01 at 18:30 UTC"
        );
        assert_eq!(display_timestamp("garbage"), "garbage");
    }
}
