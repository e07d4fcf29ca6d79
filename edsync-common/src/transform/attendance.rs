//! Attendance reshaping
//!
//! One attendance event carries one absolute date; it lands on the monthly
//! row for its natural key, touching exactly the one day-of-month column
//! the date selects. The day value is a single JSON object merging the
//! fixed attendance attributes with the event's free-form metadata; fixed
//! attributes are assigned last and win key collisions.

use crate::coerce::parse_datetime_value;
use crate::db::columns::day_column;
use crate::db::models::{AttendanceDayRecord, AttendanceMonthRecord};
use crate::events::AttendanceEventData;
use crate::{Error, Result};
use chrono::Datelike;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Reshape an attendance event into its sparse monthly record
pub fn transform_attendance(data: &AttendanceEventData) -> Result<AttendanceDayRecord> {
    if data.user_id.trim().is_empty() {
        return Err(Error::missing("userId"));
    }
    let date = parse_datetime_value(&data.attendance_date)
        .ok_or_else(|| Error::missing("attendanceDate"))?;

    let year = date.year();
    let month = date.month();
    let day_column = day_column(date.day())
        .ok_or_else(|| Error::Internal(format!("day {} out of range", date.day())))?;

    Ok(AttendanceDayRecord {
        tenant_id: data.tenant_id.clone(),
        context: data.context.clone(),
        context_id: data.context_id.clone(),
        user_id: data.user_id.clone(),
        year,
        month,
        day_column,
        day_value: build_day_value(data),
    })
}

/// Merge the fixed attendance attributes over the event metadata
fn build_day_value(data: &AttendanceEventData) -> Value {
    let mut merged: Map<String, Value> = data.meta_data.clone().unwrap_or_default();

    let text = |v: &Option<String>| match v {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    };
    let raw = |v: &Option<Value>| v.clone().unwrap_or(Value::Null);

    merged.insert("scope".to_string(), text(&data.scope));
    merged.insert("remark".to_string(), text(&data.remark));
    merged.insert("lateMark".to_string(), raw(&data.late_mark));
    merged.insert("latitude".to_string(), raw(&data.latitude));
    merged.insert("longitude".to_string(), raw(&data.longitude));
    merged.insert("attendance".to_string(), text(&data.attendance));
    merged.insert("absentReason".to_string(), text(&data.absent_reason));
    merged.insert("validLocation".to_string(), raw(&data.valid_location));

    Value::Object(merged)
}

/// Group historical attendance rows by natural key into monthly records.
///
/// Rows with an unparseable date are skipped and counted; within one group
/// the last row for a given day wins.
pub fn group_attendance(
    records: impl IntoIterator<Item = AttendanceEventData>,
) -> (Vec<AttendanceMonthRecord>, usize) {
    let mut groups: BTreeMap<String, AttendanceMonthRecord> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        let day = match transform_attendance(&record) {
            Ok(day) => day,
            Err(err) => {
                warn!("Skipping attendance row: {}", err);
                skipped += 1;
                continue;
            }
        };

        let key = format!(
            "{}|{}|{}|{}|{}|{}",
            day.tenant_id.as_deref().unwrap_or(""),
            day.context.as_deref().unwrap_or(""),
            day.context_id.as_deref().unwrap_or(""),
            day.user_id,
            day.year,
            day.month
        );

        let group = groups.entry(key).or_insert_with(|| AttendanceMonthRecord {
            tenant_id: day.tenant_id.clone(),
            context: day.context.clone(),
            context_id: day.context_id.clone(),
            user_id: day.user_id.clone(),
            year: day.year,
            month: day.month,
            days: Vec::new(),
        });

        if let Some(existing) = group
            .days
            .iter_mut()
            .find(|(column, _)| *column == day.day_column)
        {
            existing.1 = day.day_value;
        } else {
            group.days.push((day.day_column, day.day_value));
        }
    }

    (groups.into_values().collect(), skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attendance_event(value: Value) -> AttendanceEventData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_day_column_selection() {
        let data = attendance_event(json!({
            "userId": "u-1",
            "tenantId": "t-1",
            "attendanceDate": "2024-03-05T09:30:00.000Z",
            "attendance": "present"
        }));
        let record = transform_attendance(&data).unwrap();

        assert_eq!(record.year, 2024);
        assert_eq!(record.month, 3);
        assert_eq!(record.day_column, "day05");
        assert_eq!(record.day_value["attendance"], json!("present"));
    }

    #[test]
    fn test_fixed_attributes_win_metadata_collisions() {
        let data = attendance_event(json!({
            "userId": "u-1",
            "attendanceDate": "2024-03-05T09:30:00.000Z",
            "attendance": "present",
            "metaData": { "attendance": "forged", "deviceId": "d-9" }
        }));
        let record = transform_attendance(&data).unwrap();

        assert_eq!(record.day_value["attendance"], json!("present"));
        assert_eq!(record.day_value["deviceId"], json!("d-9"));
    }

    #[test]
    fn test_unset_fixed_attributes_are_explicit_nulls() {
        let data = attendance_event(json!({
            "userId": "u-1",
            "attendanceDate": "2024-03-05T09:30:00.000Z"
        }));
        let record = transform_attendance(&data).unwrap();

        assert_eq!(record.day_value["attendance"], Value::Null);
        assert_eq!(record.day_value["remark"], Value::Null);
    }

    #[test]
    fn test_missing_date_is_rejected() {
        let data = attendance_event(json!({
            "userId": "u-1",
            "attendanceDate": "not a date"
        }));
        assert!(transform_attendance(&data).is_err());
    }

    #[test]
    fn test_grouping_by_natural_key() {
        let rows = vec![
            attendance_event(json!({
                "userId": "u-1", "tenantId": "t-1", "contextId": "c-1",
                "attendanceDate": "2024-03-05T09:00:00.000Z", "attendance": "present"
            })),
            attendance_event(json!({
                "userId": "u-1", "tenantId": "t-1", "contextId": "c-1",
                "attendanceDate": "2024-03-06T09:00:00.000Z", "attendance": "absent"
            })),
            attendance_event(json!({
                "userId": "u-1", "tenantId": "t-1", "contextId": "c-1",
                "attendanceDate": "2024-04-01T09:00:00.000Z", "attendance": "present"
            })),
            attendance_event(json!({
                "userId": "u-2", "tenantId": "t-1", "contextId": "c-1",
                "attendanceDate": "2024-03-05T09:00:00.000Z", "attendance": "present"
            })),
        ];

        let (groups, skipped) = group_attendance(rows);

        assert_eq!(skipped, 0);
        assert_eq!(groups.len(), 3);
        let march_u1 = groups
            .iter()
            .find(|g| g.user_id == "u-1" && g.month == 3)
            .unwrap();
        assert_eq!(march_u1.days.len(), 2);
    }

    #[test]
    fn test_grouping_last_day_value_wins() {
        let rows = vec![
            attendance_event(json!({
                "userId": "u-1",
                "attendanceDate": "2024-03-05T09:00:00.000Z", "attendance": "absent"
            })),
            attendance_event(json!({
                "userId": "u-1",
                "attendanceDate": "2024-03-05T17:00:00.000Z", "attendance": "present"
            })),
        ];

        let (groups, _) = group_attendance(rows);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].days.len(), 1);
        assert_eq!(groups[0].days[0].1["attendance"], json!("present"));
    }

    #[test]
    fn test_grouping_skips_bad_dates() {
        let rows = vec![attendance_event(json!({
            "userId": "u-1",
            "attendanceDate": null
        }))];
        let (groups, skipped) = group_attendance(rows);
        assert!(groups.is_empty());
        assert_eq!(skipped, 1);
    }
}
