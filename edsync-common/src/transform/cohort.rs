//! Cohort transformation and hierarchical type propagation
//!
//! A cohort's classification is derived on every transform, never cached:
//! top-level cohorts classify from their own "type of center" field, child
//! cohorts classify from the resolved parent's type and ignore whatever
//! type value they carry themselves. A parent type change does not
//! repropagate to existing children automatically.

use crate::coerce::{parse_datetime, to_numeric_code};
use crate::db::columns::COHORT_FIELD_COLUMNS;
use crate::db::models::CohortRecord;
use crate::db::patch::{RowPatch, SqlValue};
use crate::error::require_str;
use crate::events::CohortEventData;
use crate::fields::resolve_by_field_id;
use crate::transform::mapping::{FieldKind, COHORT_FIELD_MAPPINGS, COHORT_TYPE_FIELD_ID};
use crate::Result;
use tracing::warn;

/// Derive a cohort's classification.
///
/// - No parent: raw "regular"/"remote" (case-insensitive) becomes
///   regularCenter/remoteCenter; anything else passes through unchanged,
///   including nothing at all.
/// - With a parent: the parent's type alone decides regularBatch/remoteBatch.
///   An unrecognized or missing parent type passes the child's own raw type
///   through unchanged; the parent's raw value is never propagated verbatim.
/// - A child with no type field of its own still gets a batch type when the
///   parent type resolves.
pub fn classify_cohort_type(
    raw_type: Option<&str>,
    has_parent: bool,
    parent_type: Option<&str>,
) -> Option<String> {
    if !has_parent {
        let raw = raw_type?;
        match raw.trim().to_lowercase().as_str() {
            "regular" => Some("regularCenter".to_string()),
            "remote" => Some("remoteCenter".to_string()),
            _ => Some(raw.to_string()),
        }
    } else {
        match parent_type {
            Some(parent) => match parent.trim().to_lowercase().as_str() {
                "regular" => Some("regularBatch".to_string()),
                "remote" => Some("remoteBatch".to_string()),
                other => {
                    warn!(
                        "Parent type '{}' not recognized, keeping original child type",
                        other
                    );
                    raw_type.map(|t| t.to_string())
                }
            },
            None => raw_type.map(|t| t.to_string()),
        }
    }
}

/// Normalize a stored parent classification back to its raw stem so the
/// classifier sees the same input in live and backfill modes.
/// `regularCenter` -> `regular`, `remoteCenter` -> `remote`; anything else
/// is returned as-is (and will pass the child's own type through).
pub fn normalize_parent_type(stored: &str) -> String {
    match stored.trim().to_lowercase().as_str() {
        "regular" | "regularcenter" => "regular".to_string(),
        "remote" | "remotecenter" => "remote".to_string(),
        _ => stored.to_string(),
    }
}

/// Transform a cohort event into its destination record.
///
/// `parent_type` is the parent's resolved raw type, looked up by the caller
/// against whichever store is authoritative in its mode; pass `None` when
/// there is no parent or the lookup failed.
pub fn transform_cohort(
    data: &CohortEventData,
    parent_type: Option<&str>,
) -> Result<CohortRecord> {
    let cohort_id = require_str(Some(data.cohort_id.as_str()), "cohortId")?;

    let has_parent = data
        .parent_id
        .as_deref()
        .map(|p| !p.trim().is_empty())
        .unwrap_or(false);

    let mut fields = RowPatch::new(COHORT_FIELD_COLUMNS);

    for mapping in COHORT_FIELD_MAPPINGS {
        if mapping.field_id == COHORT_TYPE_FIELD_ID {
            continue; // Type is derived below, not copied
        }
        if fields.has_value(mapping.column) {
            continue;
        }
        let raw = resolve_by_field_id(&data.custom_fields, mapping.field_id);
        let value = match mapping.kind {
            FieldKind::NumericCode => {
                SqlValue::opt_integer(raw.as_deref().and_then(to_numeric_code))
            }
            _ => SqlValue::opt_text(raw),
        };
        fields.set(mapping.column, value)?;
    }

    // Raw classification input: the center-type field when present, the
    // event's own type tag otherwise
    let raw_type = resolve_by_field_id(&data.custom_fields, COHORT_TYPE_FIELD_ID)
        .or_else(|| data.cohort_type.clone());

    let derived = classify_cohort_type(raw_type.as_deref(), has_parent, parent_type);
    fields.set("Type", SqlValue::opt_text(derived))?;

    if let Some(status) = data.status.clone() {
        fields.set("Status", SqlValue::Text(status))?;
    }

    Ok(CohortRecord {
        cohort_id,
        tenant_id: data.tenant_id.clone(),
        cohort_name: data.name.clone(),
        created_on: data.created_at.as_deref().and_then(parse_datetime),
        parent_id: data.parent_id.clone().filter(|p| !p.trim().is_empty()),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_classification() {
        assert_eq!(
            classify_cohort_type(Some("regular"), false, None),
            Some("regularCenter".to_string())
        );
        assert_eq!(
            classify_cohort_type(Some("Remote"), false, None),
            Some("remoteCenter".to_string())
        );
        // Unrecognized raw type passes through unchanged
        assert_eq!(
            classify_cohort_type(Some("unknown-value"), false, None),
            Some("unknown-value".to_string())
        );
        assert_eq!(classify_cohort_type(None, false, None), None);
    }

    #[test]
    fn test_child_classification_follows_parent() {
        assert_eq!(
            classify_cohort_type(Some("anything"), true, Some("regular")),
            Some("regularBatch".to_string())
        );
        assert_eq!(
            classify_cohort_type(None, true, Some("remote")),
            Some("remoteBatch".to_string())
        );
    }

    #[test]
    fn test_child_with_unrecognized_parent_keeps_own_type() {
        assert_eq!(
            classify_cohort_type(Some("own-type"), true, Some("unknown-value")),
            Some("own-type".to_string())
        );
        assert_eq!(
            classify_cohort_type(None, true, Some("unknown-value")),
            None
        );
    }

    #[test]
    fn test_child_without_parent_type_keeps_own_type() {
        assert_eq!(
            classify_cohort_type(Some("own-type"), true, None),
            Some("own-type".to_string())
        );
    }

    #[test]
    fn test_normalize_parent_type() {
        assert_eq!(normalize_parent_type("regularCenter"), "regular");
        assert_eq!(normalize_parent_type("RemoteCenter"), "remote");
        assert_eq!(normalize_parent_type("regular"), "regular");
        assert_eq!(normalize_parent_type("odd"), "odd");
    }

    #[test]
    fn test_transform_cohort_fields_and_type() {
        let data: CohortEventData = serde_json::from_value(json!({
            "cohortId": "c-1",
            "tenantId": "t-1",
            "name": "Center A",
            "type": "COHORT",
            "customFields": [
                { "fieldId": "000a7469-2721-4c7b-8180-52812a0f6fe7",
                  "selectedValues": [{ "id": "x", "value": "regular" }] },
                { "fieldId": "f93c0ac3-f827-4794-9457-441fa1057b42",
                  "selectedValues": ["State Board"] },
                { "fieldId": "b4ad6f2a-f4b3-4f66-b1be-fcbe8ff607e3",
                  "selectedValues": ["24"] }
            ]
        }))
        .unwrap();

        let record = transform_cohort(&data, None).unwrap();

        assert_eq!(
            record.fields.get("Type"),
            Some(&SqlValue::Text("regularCenter".to_string()))
        );
        assert_eq!(
            record.fields.get("CoBoard"),
            Some(&SqlValue::Text("State Board".to_string()))
        );
        assert_eq!(record.fields.get("CoStateID"), Some(&SqlValue::Integer(24)));
    }

    #[test]
    fn test_transform_child_without_type_field_synthesizes_batch() {
        let data: CohortEventData = serde_json::from_value(json!({
            "cohortId": "c-2",
            "parentId": "c-1",
            "name": "Batch A",
            "customFields": []
        }))
        .unwrap();

        let record = transform_cohort(&data, Some("regular")).unwrap();

        assert_eq!(
            record.fields.get("Type"),
            Some(&SqlValue::Text("regularBatch".to_string()))
        );
    }
}
