//! User transformation
//!
//! Maps a user event onto the fixed Users column set: identity fields come
//! from the top-level payload, everything else resolves out of the
//! custom-field collection through the versioned mapping tables.

use crate::coerce::{parse_datetime, status_to_bool, to_text, yes_no_to_bool};
use crate::db::columns::USER_COLUMNS;
use crate::db::models::{CohortMemberRecord, UserRecord};
use crate::db::patch::{RowPatch, SqlValue};
use crate::error::require_str;
use crate::events::UserEventData;
use crate::fields::{resolve_by_field_id, resolve_by_label};
use crate::transform::mapping::{FieldKind, USER_FIELD_MAPPINGS, USER_LABEL_MAPPINGS};
use crate::Result;

/// Transform a user event into its destination record
pub fn transform_user(data: &UserEventData) -> Result<UserRecord> {
    let user_id = require_str(Some(data.user_id.as_str()), "userId")?;

    let mut columns = RowPatch::new(USER_COLUMNS);

    // Identity fields are set only when the event carries them; an absent
    // field must not null out a stored value on redelivery
    if let Some(username) = data.username.clone() {
        columns.set("UserName", SqlValue::Text(username))?;
    }
    if let Some(full_name) = full_name(data) {
        columns.set("UserFullName", SqlValue::Text(full_name))?;
    }
    if let Some(email) = data.email.clone() {
        columns.set("UserEmail", SqlValue::Text(email))?;
    }
    if let Some(mobile) = data.mobile.as_ref().and_then(to_text) {
        columns.set("UserMobile", SqlValue::Text(mobile))?;
    }
    if let Some(dob) = data.dob.clone() {
        columns.set("UserDoB", SqlValue::Text(dob))?;
    }
    if let Some(gender) = data.gender.clone() {
        columns.set("UserGender", SqlValue::Text(gender))?;
    }
    if let Some(created_at) = data.created_at.as_deref().and_then(parse_datetime) {
        columns.set("CreatedAt", SqlValue::Timestamp(created_at))?;
    }
    if let Some(updated_at) = data.updated_at.as_deref().and_then(parse_datetime) {
        columns.set("UpdatedAt", SqlValue::Timestamp(updated_at))?;
    }
    // The active flag is derived even when status is absent (explicit null)
    columns.set(
        "UserIsActive",
        SqlValue::opt_bool(status_to_bool(data.status.as_deref())),
    )?;

    for (label, column) in USER_LABEL_MAPPINGS {
        let value = resolve_by_label(&data.custom_fields, label);
        columns.set(column, SqlValue::opt_text(value))?;
    }

    // Ordered mapping walk: a column already holding a value is not
    // overwritten, so duplicate legacy identifiers fall back in order
    for mapping in USER_FIELD_MAPPINGS {
        if columns.has_value(mapping.column) {
            continue;
        }
        let raw = resolve_by_field_id(&data.custom_fields, mapping.field_id);
        let value = coerce_field(raw, mapping.kind);
        columns.set(mapping.column, value)?;
    }

    Ok(UserRecord { user_id, columns })
}

fn coerce_field(raw: Option<String>, kind: FieldKind) -> SqlValue {
    match kind {
        FieldKind::Text => SqlValue::opt_text(raw),
        FieldKind::YesNo => SqlValue::opt_bool(yes_no_to_bool(raw.as_deref())),
        FieldKind::Date => match raw.as_deref().and_then(parse_datetime) {
            Some(dt) => SqlValue::Date(dt.date_naive()),
            None => SqlValue::Null,
        },
        FieldKind::NumericCode => {
            SqlValue::opt_integer(raw.as_deref().and_then(crate::coerce::to_numeric_code))
        }
    }
}

fn full_name(data: &UserEventData) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(first) = data.first_name.as_deref() {
        parts.push(first);
    }
    if let Some(middle) = data.middle_name.as_deref() {
        parts.push(middle);
    }
    if let Some(last) = data.last_name.as_deref() {
        parts.push(last);
    }
    let joined = parts
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.trim())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Expand a user event's cohort assignments into membership records
pub fn transform_cohort_members(data: &UserEventData) -> Vec<CohortMemberRecord> {
    data.cohorts
        .iter()
        .filter_map(|cohort| {
            let cohort_id = cohort.batch_id.clone()?;
            Some(CohortMemberRecord {
                cohort_member_id: cohort.cohort_member_id.clone(),
                user_id: data.user_id.clone(),
                cohort_id,
                member_status: cohort
                    .cohort_member_status
                    .clone()
                    .unwrap_or_else(|| "active".to_string()),
                academic_year_id: cohort.academic_year_id.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_event(value: serde_json::Value) -> UserEventData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_identity_fields() {
        let data = user_event(json!({
            "userId": "u-1",
            "username": "asha",
            "firstName": "Asha",
            "middleName": "K",
            "lastName": "Rao",
            "email": "asha@example.org",
            "mobile": 9900112233u64,
            "status": "active"
        }));
        let record = transform_user(&data).unwrap();

        assert_eq!(record.user_id, "u-1");
        assert_eq!(
            record.columns.get("UserFullName"),
            Some(&SqlValue::Text("Asha K Rao".to_string()))
        );
        assert_eq!(
            record.columns.get("UserMobile"),
            Some(&SqlValue::Text("9900112233".to_string()))
        );
        assert_eq!(
            record.columns.get("UserIsActive"),
            Some(&SqlValue::Bool(true))
        );
    }

    #[test]
    fn test_full_name_skips_missing_middle() {
        let data = user_event(json!({
            "userId": "u-1",
            "firstName": "Asha",
            "lastName": "Rao"
        }));
        let record = transform_user(&data).unwrap();
        assert_eq!(
            record.columns.get("UserFullName"),
            Some(&SqlValue::Text("Asha Rao".to_string()))
        );
    }

    #[test]
    fn test_custom_fields_map_to_columns() {
        let data = user_event(json!({
            "userId": "u-1",
            "customFields": [
                { "fieldId": "f93c0ac3-f827-4794-9457-441fa1057b42",
                  "label": "BOARD", "selectedValues": ["CBSE"] },
                { "fieldId": "8e8ab9b7-8ce0-4e6e-bf7e-0477a80734c8",
                  "selectedValues": ["yes"] },
                { "label": "JOB_FAMILY", "selectedValues": ["Operations"] }
            ]
        }));
        let record = transform_user(&data).unwrap();

        assert_eq!(
            record.columns.get("UserBoard"),
            Some(&SqlValue::Text("CBSE".to_string()))
        );
        assert_eq!(
            record.columns.get("IsManager"),
            Some(&SqlValue::Bool(true))
        );
        assert_eq!(
            record.columns.get("JobFamily"),
            Some(&SqlValue::Text("Operations".to_string()))
        );
    }

    #[test]
    fn test_duplicate_identifiers_fall_back_in_order() {
        // Primary village identifier missing, legacy one present
        let data = user_event(json!({
            "userId": "u-1",
            "customFields": [
                { "fieldId": "5cfacade-9d56-4a1e-b4e9-cc8e8c6b04c5",
                  "selectedValues": ["v-legacy"] }
            ]
        }));
        let record = transform_user(&data).unwrap();
        assert_eq!(
            record.columns.get("UserVillageID"),
            Some(&SqlValue::Text("v-legacy".to_string()))
        );
    }

    #[test]
    fn test_unmapped_fields_are_ignored() {
        let data = user_event(json!({
            "userId": "u-1",
            "customFields": [
                { "fieldId": "ffffffff-0000-0000-0000-000000000000",
                  "label": "UNKNOWN", "selectedValues": ["x"] }
            ]
        }));
        // No panic, no stray column
        let record = transform_user(&data).unwrap();
        assert!(record.columns.len() <= USER_COLUMNS.len());
    }

    #[test]
    fn test_missing_user_id_is_rejected() {
        let data = user_event(json!({ "userId": "" }));
        assert!(transform_user(&data).is_err());
    }

    #[test]
    fn test_cohort_members_from_assignments() {
        let data = user_event(json!({
            "userId": "u-1",
            "cohorts": [
                { "batchId": "b-1", "cohortMemberStatus": "dropout",
                  "academicYearId": "ay-1", "cohortMemberId": "cm-1" },
                { "batchId": "b-2" },
                { "cohortMemberStatus": "active" }
            ]
        }));
        let members = transform_cohort_members(&data);

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].member_status, "dropout");
        assert_eq!(members[1].member_status, "active");
        assert_eq!(members[1].cohort_id, "b-2");
    }
}
