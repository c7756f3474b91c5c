use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::errors::internal::ValidationError;

// ~100 years; an absent bound becomes effectively unbounded
const OPEN_RANGE_DAYS: i64 = 36_525;

/// An inclusive `[start, end]` time window for activity queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range from optional caller-supplied bounds
    ///
    /// A date-only bound (`YYYY-MM-DD`) expands to the full calendar day:
    /// beginning of day for the start, end of day for the end. A bound that
    /// carries a time of day is used as-is. An absent bound defaults to an
    /// effectively unbounded 100 years back/forward, so calling with neither
    /// bound present is valid and yields an open range.
    pub fn between(start: Option<&str>, end: Option<&str>) -> Result<TimeRange, ValidationError> {
        let start = match start {
            Some(raw) => Self::parse_bound(raw, false)?,
            None => Utc::now() - Duration::days(OPEN_RANGE_DAYS),
        };
        let end = match end {
            Some(raw) => Self::parse_bound(raw, true)?,
            None => Utc::now() + Duration::days(OPEN_RANGE_DAYS),
        };
        Ok(TimeRange { start, end })
    }

    /// The trailing window `[now - duration, now]`
    pub fn trailing(duration: Duration) -> TimeRange {
        let now = Utc::now();
        TimeRange {
            start: now - duration,
            end: now,
        }
    }

    fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, ValidationError> {
        let raw = raw.trim();

        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            let time = if end_of_day {
                date.and_hms_micro_opt(23, 59, 59, 999_999)
            } else {
                date.and_hms_opt(0, 0, 0)
            };
            // Both constructors are infallible for these fixed times
            return Ok(Utc.from_utc_datetime(&time.unwrap()));
        }

        if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
            return Ok(datetime.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Ok(Utc.from_utc_datetime(&naive));
        }

        Err(ValidationError::InvalidDate(raw.to_string()))
    }
}

#[cfg(test)]
#[path = "time_range_tests.rs"]
mod time_range_tests;
