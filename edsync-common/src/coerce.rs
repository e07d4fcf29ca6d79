//! Type coercion for destination columns
//!
//! Pure, total coercion functions: failures never raise, they degrade to
//! `None` and log the offending raw value at warning level. Date handling
//! is UTC-calendar-exact; day-only columns must not shift across process
//! timezones.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Convert a yes/no custom-field answer to a boolean.
///
/// Only a case-insensitive "yes" is true; anything else (including `None`)
/// is false once a value context exists.
pub fn yes_no_to_bool(value: Option<&str>) -> Option<bool> {
    value.map(|v| v.eq_ignore_ascii_case("yes"))
}

/// Convert an active/inactive status string to a boolean.
///
/// `None` stays `None`: absent status must not overwrite a stored flag.
pub fn status_to_bool(status: Option<&str>) -> Option<bool> {
    status.map(|s| s.eq_ignore_ascii_case("active"))
}

/// Parse an inbound date value into a UTC timestamp.
///
/// Accepted shapes:
/// - ISO-8601 strings (with or without offset, date-only included)
/// - `{ "$date": "<iso>" }` document-store envelopes
/// - epoch-millisecond JSON numbers
/// - `DD-MM-YYYY` strings (day first; all three segments must be numeric)
pub fn parse_datetime_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_datetime(s),
        Value::Object(map) => {
            let inner = map.get("$date")?;
            match inner {
                Value::String(s) => parse_datetime(s),
                Value::Number(n) => n.as_i64().and_then(millis_to_datetime),
                _ => None,
            }
        }
        Value::Number(n) => n.as_i64().and_then(millis_to_datetime),
        _ => None,
    }
}

/// Parse a date string into a UTC timestamp; `None` on anything unparseable.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    // ISO datetime without offset, treated as UTC
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    // Date-only ISO
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }

    if let Some(dt) = parse_day_first(trimmed) {
        return Some(dt);
    }

    warn!("Could not parse date value: {}", raw);
    None
}

/// Parse a `DD-MM-YYYY` string. Splits on `-`, first segment is the day,
/// second the month; any non-numeric segment or invalid calendar date
/// returns `None` rather than guessing.
fn parse_day_first(raw: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = raw.split('-').collect();
    if parts.len() != 3 {
        return None;
    }
    let day: u32 = parts[0].trim().parse().ok()?;
    let month: u32 = parts[1].trim().parse().ok()?;
    let year: i32 = parts[2].trim().parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Format a timestamp as a `YYYY-MM-DD` day-only column value.
///
/// Uses the UTC calendar date, never local time; day-only columns would
/// otherwise shift by one day on positive-offset hosts.
pub fn format_date_only(dt: &DateTime<Utc>) -> String {
    dt.date_naive().format("%Y-%m-%d").to_string()
}

/// Coerce an arbitrary JSON value into destination text.
///
/// Strings pass through trimmed (empty becomes `None`), numbers are
/// stringified, arrays join with `", "`, objects serialize as JSON.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            Some(parts.join(", "))
        }
        Value::Object(_) => serde_json::to_string(value).ok(),
        Value::Bool(_) => None,
    }
}

/// Known location custom-field identifiers mapped code → reference UUID.
///
/// Location hierarchy answers arrive either as numeric-code strings or as
/// the reference UUIDs themselves; the fixed codes below predate the
/// reference table and are translated up front.
static LOCATION_CODE_TO_UUID: Lazy<HashMap<&'static str, HashMap<&'static str, &'static str>>> =
    Lazy::new(|| {
        let mut map: HashMap<&'static str, HashMap<&'static str, &'static str>> = HashMap::new();
        // state
        map.insert(
            "6469c3ac-8c46-49d7-852a-00f9589737c5",
            HashMap::from([("24", "cc737326-7d1f-4f4e-88cf-39f48df2c280")]),
        );
        // district
        map.insert(
            "b61edfc6-3787-4079-86d3-37262bf23a9e",
            HashMap::from([("473", "c168bb3c-4c2d-4321-b1b7-4c1c19dc54e7")]),
        );
        // block
        map.insert(
            "4aab68ae-8382-43aa-a45a-e9b239319857",
            HashMap::from([("3613", "359e1a0a-d7c8-4e03-b022-938f0f6f7f83")]),
        );
        // village
        map.insert(
            "8e9bb321-ff99-4e2e-9269-61e863dd0c54",
            HashMap::from([("737311", "8eb4f5c2-c0b9-4191-94e3-14c738246f82")]),
        );
        map
    });

/// Translate a known fixed location code to its reference UUID
pub fn location_code_to_uuid(field_id: &str, raw: &str) -> Option<&'static str> {
    let digits = digits_of(raw);
    if digits.is_empty() {
        return None;
    }
    LOCATION_CODE_TO_UUID
        .get(field_id)?
        .get(digits.as_str())
        .copied()
}

/// Coerce a location hierarchy value into its integer code.
///
/// The code→UUID table is consulted first for the known fixed codes; after
/// that, every non-digit character is stripped and the remainder parsed.
pub fn to_numeric_code(raw: &str) -> Option<i64> {
    let digits = digits_of(raw);
    if digits.is_empty() {
        warn!("Could not resolve numeric code from value: {}", raw);
        return None;
    }
    match digits.parse::<i64>() {
        Ok(code) => Some(code),
        Err(_) => {
            warn!("Could not resolve numeric code from value: {}", raw);
            None
        }
    }
}

fn digits_of(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_yes_no_to_bool() {
        assert_eq!(yes_no_to_bool(Some("yes")), Some(true));
        assert_eq!(yes_no_to_bool(Some("YES")), Some(true));
        assert_eq!(yes_no_to_bool(Some("no")), Some(false));
        assert_eq!(yes_no_to_bool(Some("maybe")), Some(false));
        assert_eq!(yes_no_to_bool(None), None);
    }

    #[test]
    fn test_status_to_bool() {
        assert_eq!(status_to_bool(Some("active")), Some(true));
        assert_eq!(status_to_bool(Some("Active")), Some(true));
        assert_eq!(status_to_bool(Some("inactive")), Some(false));
        assert_eq!(status_to_bool(None), None);
    }

    #[test]
    fn test_iso_round_trip_is_timezone_independent() {
        let dt = parse_datetime("2025-12-17T01:38:37.000Z").unwrap();
        assert_eq!(format_date_only(&dt), "2025-12-17");
    }

    #[test]
    fn test_day_first_parsing() {
        let dt = parse_datetime("17-12-2025").unwrap();
        let date = dt.date_naive();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2025-12-17");
    }

    #[test]
    fn test_day_first_rejects_bad_segments() {
        assert!(parse_datetime("17-12").is_none());
        assert!(parse_datetime("aa-12-2025").is_none());
        assert!(parse_datetime("17-xx-2025").is_none());
        assert!(parse_datetime("32-12-2025").is_none());
        assert!(parse_datetime("17-13-2025").is_none());
    }

    #[test]
    fn test_document_store_date_envelope() {
        let dt = parse_datetime_value(&json!({ "$date": "2024-03-05T10:00:00.000Z" })).unwrap();
        assert_eq!(format_date_only(&dt), "2024-03-05");
    }

    #[test]
    fn test_epoch_millis() {
        let dt = parse_datetime_value(&json!(1709632800000i64)).unwrap();
        assert_eq!(format_date_only(&dt), "2024-03-05");
    }

    #[test]
    fn test_date_only_string() {
        let dt = parse_datetime("2024-03-05").unwrap();
        assert_eq!(format_date_only(&dt), "2024-03-05");
    }

    #[test]
    fn test_unparseable_dates_degrade_to_none() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("not a date").is_none());
        assert!(parse_datetime_value(&json!(null)).is_none());
        assert!(parse_datetime_value(&json!(true)).is_none());
    }

    #[test]
    fn test_to_text_shapes() {
        assert_eq!(to_text(&json!("  hello ")), Some("hello".to_string()));
        assert_eq!(to_text(&json!("")), None);
        assert_eq!(to_text(&json!(42)), Some("42".to_string()));
        assert_eq!(
            to_text(&json!(["a", "b"])),
            Some("a, b".to_string())
        );
        assert_eq!(
            to_text(&json!({"k": "v"})),
            Some(r#"{"k":"v"}"#.to_string())
        );
        assert_eq!(to_text(&json!(null)), None);
        assert_eq!(to_text(&json!(true)), None);
    }

    #[test]
    fn test_numeric_code_extraction() {
        assert_eq!(to_numeric_code("473"), Some(473));
        assert_eq!(to_numeric_code("block-3613"), Some(3613));
        assert_eq!(to_numeric_code("no digits"), None);
    }

    #[test]
    fn test_location_code_lookup() {
        assert_eq!(
            location_code_to_uuid("6469c3ac-8c46-49d7-852a-00f9589737c5", "24"),
            Some("cc737326-7d1f-4f4e-88cf-39f48df2c280")
        );
        assert_eq!(
            location_code_to_uuid("6469c3ac-8c46-49d7-852a-00f9589737c5", "99"),
            None
        );
        assert_eq!(location_code_to_uuid("unknown-field", "24"), None);
    }
}
