//! Cohort-member event handlers

use edsync_common::coerce::to_text;
use edsync_common::db::columns::MEMBER_PATCH_COLUMNS;
use edsync_common::db::{RowPatch, SqlValue, SyncStore};
use edsync_common::events::CohortMemberEventData;
use edsync_common::transform::mapping::MEMBER_LABEL_MAPPINGS;
use edsync_common::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

fn column_for_label(label: &str) -> Option<&'static str> {
    let key = label.trim().to_lowercase();
    MEMBER_LABEL_MAPPINGS
        .iter()
        .find(|(l, _)| *l == key)
        .map(|(_, column)| *column)
}

/// COHORT_MEMBER_CREATED / COHORT_MEMBER_UPDATED.
///
/// Updates the allow-listed member columns for an existing membership row,
/// resolving the membership id through (userId, cohortId) when the event
/// does not carry it. Unknown memberships are skipped, not created; the
/// user event owns membership creation.
pub async fn handle_cohort_member_upsert(store: &SyncStore, data: Value) -> Result<()> {
    let event: CohortMemberEventData = serde_json::from_value(data)?;

    let mut membership_id = event.cohort_membership_id.clone();

    if membership_id.is_none() {
        if let (Some(user_id), Some(cohort_id)) =
            (event.user_id.as_deref(), event.cohort_id.as_deref())
        {
            membership_id = store
                .find_cohort_member(user_id, cohort_id)
                .await?
                .map(|row| row.cohort_member_id);
        }
    }

    let Some(membership_id) = membership_id else {
        warn!("Missing cohortMembershipId and unable to resolve from userId/cohortId");
        return Ok(());
    };

    if store
        .find_cohort_member_by_id(&membership_id)
        .await?
        .is_none()
    {
        warn!(
            "CohortMember not found. Skipping update | cohortMembershipId={}",
            membership_id
        );
        return Ok(());
    }

    let mut updates = RowPatch::new(MEMBER_PATCH_COLUMNS);

    if let Some(status) = event.status.clone() {
        updates.set("MemberStatus", SqlValue::Text(status))?;
    }

    // Direct fields map variant: { fields: { "Subject": "x", ... } }
    if let Some(fields) = &event.fields {
        for (name, value) in fields {
            let Some(column) = column_for_label(name) else {
                continue;
            };
            updates.set(column, SqlValue::opt_text(to_text(value)))?;
        }
        debug!(
            "Parsed fields map for {} | keys={}",
            membership_id,
            updates.column_names().collect::<Vec<_>>().join(",")
        );
    }

    // Label/value custom-field variant; values stored as-is
    for field in &event.custom_fields {
        let Some(column) = field.label.as_deref().and_then(column_for_label) else {
            continue;
        };
        let value = match &field.value {
            Some(v) => SqlValue::opt_text(to_text(v)),
            None => SqlValue::Null,
        };
        updates.set(column, value)?;
    }

    if updates.is_empty() {
        debug!(
            "No updates to perform | cohortMembershipId={} | customFieldsLen={}",
            membership_id,
            event.custom_fields.len()
        );
        return Ok(());
    }

    let affected = store.update_member_fields(&membership_id, &updates).await?;
    info!(
        "Updated cohort member fields for {}: {} ({} rows)",
        membership_id,
        updates.column_names().collect::<Vec<_>>().join(", "),
        affected
    );

    Ok(())
}
