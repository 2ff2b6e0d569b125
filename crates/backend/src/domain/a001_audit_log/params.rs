//! Lenient parsing of raw query-string criteria.
//!
//! Nothing here fails: malformed input falls back to a default or is ignored.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Trimmed value, `None` when absent or blank
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Comma separated list with blank items dropped; `None` when nothing is left
pub fn split_list(value: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = non_empty(value)?
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Decimal number, `fallback` when absent, unparseable or not finite
pub fn parse_number(value: Option<&str>, fallback: f64) -> f64 {
    non_empty(value)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(fallback)
}

/// Time bound: RFC 3339 with any offset, a naive `YYYY-MM-DDTHH:MM:SS`
/// (taken as UTC) or a bare date (midnight UTC)
pub fn parse_time_bound(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = non_empty(value)?;

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(None), None);
        assert_eq!(split_list(Some(" , ,")), None);
        assert_eq!(
            split_list(Some("approve, reapprove,,")),
            Some(vec!["approve".to_string(), "reapprove".to_string()])
        );
    }

    #[test]
    fn test_parse_number_falls_back() {
        assert_eq!(parse_number(Some("250"), 0.0), 250.0);
        assert_eq!(parse_number(Some("12.5"), 0.0), 12.5);
        assert_eq!(parse_number(Some("abc"), 7.0), 7.0);
        assert_eq!(parse_number(Some(""), 7.0), 7.0);
        assert_eq!(parse_number(Some("inf"), 7.0), 7.0);
        assert_eq!(parse_number(None, 7.0), 7.0);
    }

    #[test]
    fn test_parse_time_bound_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        assert_eq!(parse_time_bound(Some("2024-01-31T23:59:59Z")), Some(expected));
        assert_eq!(parse_time_bound(Some("2024-02-01T06:59:59+07:00")), Some(expected));
        assert_eq!(parse_time_bound(Some("2024-01-31T23:59:59")), Some(expected));
        assert_eq!(
            parse_time_bound(Some("2024-01-31")),
            Some(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_time_bound(Some("yesterday")), None);
        assert_eq!(parse_time_bound(Some("  ")), None);
    }
}
