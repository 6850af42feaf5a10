//! Timestamp parsing shared by the feed reader and sync invocation options.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Default lower bound for feed `updated` filters and forced syncs.
pub const DEFAULT_EPOCH: &str = "1990-06-20T00:00:00";

/// Format used when sending timestamps as feed query parameters.
pub const QUERY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (`2024-01-02T03:04:05Z`, with offset or fraction), a
/// naive `YYYY-MM-DDTHH:MM:SS` interpreted as UTC, or a bare `YYYY-MM-DD`
/// meaning midnight UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Returns [`DEFAULT_EPOCH`] as a UTC timestamp.
#[must_use]
pub fn default_epoch() -> DateTime<Utc> {
    parse_timestamp(DEFAULT_EPOCH).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_rfc3339_with_offset() {
        let parsed = parse_timestamp("2024-05-01T12:00:00+03:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_naive_is_utc() {
        let parsed = parse_timestamp("1990-06-20T00:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(1990, 6, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_bare_date() {
        let parsed = parse_timestamp("2023-12-31").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_default_epoch_matches_constant() {
        assert_eq!(
            default_epoch().format(QUERY_FORMAT).to_string(),
            DEFAULT_EPOCH
        );
    }
}
