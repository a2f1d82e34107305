//! Null-tolerant field value parsing for SOAP XML text content.
//!
//! All parsers return `None` on failure rather than erroring, so a bad
//! value degrades to a missing field instead of killing the record.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses an integer by way of a decimal, truncating any fraction.
pub fn parse_long(text: &str) -> Option<i64> {
    parse_decimal(text).and_then(|d| d.trunc().to_i64())
}

/// Parses a decimal, accepting plain and scientific notation.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .ok()
        .or_else(|| Decimal::from_scientific(trimmed).ok())
}

/// Parses a datetime to epoch milliseconds.
///
/// Tries ISO-8601 first, then an epoch-millis numeric string. The value
/// stays as millis in the raw record and is only materialized as an
/// absolute timestamp at upsert time.
pub fn parse_xml_datetime(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }
    trimmed.parse::<i64>().ok()
}

/// Materializes epoch milliseconds as a UTC timestamp.
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Parses an ISO-8601 instant; used for the partial-market survey date.
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_parses_through_decimal() {
        assert_eq!(parse_long("42"), Some(42));
        assert_eq!(parse_long(" 42.9 "), Some(42));
        assert_eq!(parse_long("4.2E1"), Some(42));
        assert_eq!(parse_long("forty-two"), None);
    }

    #[test]
    fn decimal_tolerates_garbage() {
        assert_eq!(parse_decimal("1234.56"), Decimal::from_str("1234.56").ok());
        assert!(parse_decimal("").is_none());
        assert!(parse_decimal("N/A").is_none());
    }

    #[test]
    fn datetime_iso_then_epoch_fallback() {
        assert_eq!(
            parse_xml_datetime("1970-01-01T00:00:01Z"),
            Some(1000)
        );
        assert_eq!(parse_xml_datetime("1704153600000"), Some(1_704_153_600_000));
        assert_eq!(parse_xml_datetime("not a date"), None);
    }

    #[test]
    fn millis_roundtrip() {
        let dt = millis_to_datetime(1_704_153_600_000).unwrap();
        assert_eq!(dt.timestamp_millis(), 1_704_153_600_000);
    }

    #[test]
    fn instant_requires_full_iso() {
        assert!(parse_instant("2026-01-02T10:00:00Z").is_some());
        assert!(parse_instant("1704153600000").is_none());
    }
}
