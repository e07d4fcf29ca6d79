//! Cohort event handlers

use edsync_common::db::SyncStore;
use edsync_common::error::require_str;
use edsync_common::events::CohortEventData;
use edsync_common::transform::{normalize_parent_type, transform_cohort};
use edsync_common::Result;
use serde_json::Value;
use tracing::{info, warn};

/// COHORT_CREATED / COHORT_UPDATED.
///
/// Child cohorts need the parent's type; in live mode the previously
/// migrated destination cohort is the authority. A missing parent degrades
/// to passthrough classification, never a failure.
pub async fn handle_cohort_upsert(store: &SyncStore, data: Value) -> Result<()> {
    let event: CohortEventData = serde_json::from_value(data)?;

    let parent_type = match event.parent_id.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(parent_id) => match store.lookup_cohort_type(parent_id).await? {
            Some(stored) => Some(normalize_parent_type(&stored)),
            None => {
                warn!(
                    "Parent cohort {} not found, keeping original type for {}",
                    parent_id, event.cohort_id
                );
                None
            }
        },
        None => None,
    };

    let record = transform_cohort(&event, parent_type.as_deref())?;
    let outcome = store.upsert_cohort(&record).await?;

    info!(
        "Cohort {} reconciled: {:?} (type {:?})",
        record.cohort_id,
        outcome,
        record.fields.get("Type")
    );

    Ok(())
}

/// COHORT_DELETED
pub async fn handle_cohort_delete(store: &SyncStore, data: Value) -> Result<()> {
    let event: CohortEventData = serde_json::from_value(data)?;
    let cohort_id = require_str(Some(event.cohort_id.as_str()), "cohortId")?;

    if store.delete_cohort(&cohort_id).await? {
        info!("Deleted cohort {}", cohort_id);
    } else {
        warn!("COHORT_DELETED for unknown cohort {}", cohort_id);
    }
    Ok(())
}
