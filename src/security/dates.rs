//! Date and datetime validation.

use super::sanitizer::sanitize_string;
use crate::errors::{DateBound, ValidationError};
use chrono::{DateTime, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Date format used by every date-only API parameter
pub const API_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default span allowed by [`validate_date_range`]
pub const DEFAULT_MAX_RANGE_DAYS: i64 = 365;

/// Default span allowed by [`validate_api_date_range`]
pub const DEFAULT_API_RANGE_DAYS: i64 = 32;

const MAX_DATE_INPUT_CHARS: usize = 100;
const FUTURE_LIMIT: Months = Months::new(12 * 100);

const OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
const ZULU_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Validate a `YYYY-MM-DD` date.
pub fn validate_date(input: &str, field: &str) -> Result<NaiveDate, ValidationError> {
    validate_date_with_format(input, field, API_DATE_FORMAT)
}

/// Validate a date against an arbitrary `chrono` format.
///
/// The value must survive a parse and re-format unchanged, which rejects
/// overflowing days like `2024-02-30`.
pub fn validate_date_with_format(
    input: &str,
    field: &str,
    format: &str,
) -> Result<NaiveDate, ValidationError> {
    let value = gate(input, field)?;

    let date = NaiveDate::parse_from_str(&value, format)
        .ok()
        .filter(|date| date.format(format).to_string() == value)
        .ok_or_else(|| ValidationError::BadDateFormat {
            field: field.to_string(),
            expected: format_label(format),
        })?;

    check_bounds(date, today(), field)?;
    Ok(date)
}

/// Validate an ISO 8601 datetime.
///
/// Accepted shapes, tried in order: `2024-12-25T19:00:00+08:00`,
/// `2024-12-25T19:00:00Z` and `2024-12-25 19:00:00`. The last carries no
/// offset and is read as UTC.
pub fn validate_datetime(input: &str, field: &str) -> Result<DateTime<FixedOffset>, ValidationError> {
    let value = gate(input, field)?;

    let parsed = parse_offset(&value)
        .or_else(|| parse_naive(&value, ZULU_FORMAT))
        .or_else(|| parse_naive(&value, NAIVE_FORMAT))
        .ok_or_else(|| ValidationError::BadDateFormat {
            field: field.to_string(),
            expected: "ISO 8601 datetime".to_string(),
        })?;

    check_bounds(parsed.date_naive(), today(), field)?;
    Ok(parsed)
}

/// Check that `start` precedes `end` and the span fits in `max_days`.
///
/// Partial days are dropped when counting the span.
pub fn validate_date_range<Tz: TimeZone>(
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
    prefix: &str,
    max_days: i64,
) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError::RangeOrder {
            prefix: prefix.to_string(),
        });
    }

    let days = end.clone().signed_duration_since(start.clone()).num_days();
    if days > max_days {
        return Err(ValidationError::RangeTooLong {
            prefix: prefix.to_string(),
            max_days,
        });
    }

    Ok(())
}

/// Validate two datetime strings as an API date range.
pub fn validate_api_date_range(
    start: &str,
    end: &str,
    prefix: &str,
    max_days: i64,
) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), ValidationError> {
    let start = validate_datetime(start, &format!("{} start", prefix))?;
    let end = validate_datetime(end, &format!("{} end", prefix))?;
    validate_date_range(&start, &end, prefix, max_days)?;
    Ok((start, end))
}

fn gate(input: &str, field: &str) -> Result<String, ValidationError> {
    let value = sanitize_string(input, field)?;

    if is_malicious_date(&value) {
        return Err(ValidationError::SuspiciousInput {
            field: field.to_string(),
        });
    }

    Ok(value)
}

fn is_malicious_date(value: &str) -> bool {
    value.chars().count() >= MAX_DATE_INPUT_CHARS
        || value
            .chars()
            .any(|c| matches!(c, '<' | '>' | '"' | '\'' | '\\') || c.is_control())
}

fn parse_offset(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, OFFSET_FORMAT)
        .ok()
        .filter(|dt| dt.format(OFFSET_FORMAT).to_string() == value)
}

fn parse_naive(value: &str, format: &str) -> Option<DateTime<FixedOffset>> {
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .filter(|dt| dt.format(format).to_string() == value)
        .map(|dt| dt.and_utc().fixed_offset())
}

fn check_bounds(date: NaiveDate, today: NaiveDate, field: &str) -> Result<(), ValidationError> {
    let bound = if date < min_date() {
        Some(DateBound::BeforeMinimum)
    } else if today.checked_add_months(FUTURE_LIMIT).is_some_and(|max| date > max) {
        Some(DateBound::AfterMaximum)
    } else {
        None
    };

    match bound {
        Some(bound) => Err(ValidationError::DateOutOfRange {
            field: field.to_string(),
            bound,
        }),
        None => Ok(()),
    }
}

fn min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn format_label(format: &str) -> String {
    format
        .replace("%Y", "YYYY")
        .replace("%m", "MM")
        .replace("%d", "DD")
        .replace("%H", "HH")
        .replace("%M", "mm")
        .replace("%S", "ss")
}
