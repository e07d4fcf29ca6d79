//! Cohort migration
//!
//! Core rows upsert first, then each cohort's field values apply as a
//! partial update: only columns with a source value are touched. Type
//! classification runs against the source field-values snapshot: a child
//! cohort's parent type is read from the parent's own center-type field.

use crate::source::{FieldValueSet, SourceCohort};
use edsync_common::coerce::{parse_datetime, to_numeric_code};
use edsync_common::db::columns::COHORT_FIELD_COLUMNS;
use edsync_common::db::models::{CohortRecord, UpsertOutcome};
use edsync_common::db::{RowPatch, SqlValue, SyncStore};
use edsync_common::transform::mapping::{
    FieldKind, COHORT_FIELD_MAPPINGS, COHORT_TYPE_FIELD_ID,
};
use edsync_common::transform::classify_cohort_type;
use edsync_common::uuid_utils::is_uuid;
use edsync_common::{BatchStats, Result};
use std::path::Path;
use tracing::{error, info, warn};

pub async fn run(
    store: &SyncStore,
    cohorts_path: &Path,
    field_values_path: &Path,
) -> Result<BatchStats> {
    info!("=== STARTING COHORT MIGRATION ===");

    let (cohorts, bad_cohorts) = crate::source::read_ndjson::<SourceCohort>(cohorts_path)?;
    let (field_values, bad_values) = FieldValueSet::load(field_values_path)?;
    info!(
        "Found {} cohorts to migrate ({} undecodable rows skipped)",
        cohorts.len(),
        bad_cohorts + bad_values
    );

    let mut stats = BatchStats::new();
    for cohort in &cohorts {
        stats.processed += 1;
        match migrate_cohort(store, cohort, &field_values).await {
            Ok(outcome) => stats.record(outcome),
            Err(err) => {
                error!("Cohort {} failed: {}", cohort.cohort_id, err);
                stats.errors += 1;
            }
        }
    }
    stats.skipped += bad_cohorts;

    info!("Cohort migration summary: {}", stats.display_string());
    Ok(stats)
}

async fn migrate_cohort(
    store: &SyncStore,
    cohort: &SourceCohort,
    field_values: &FieldValueSet,
) -> Result<UpsertOutcome> {
    // Destination ParentID is a uuid; source carries free-form text
    let parent_id = cohort
        .parent_id
        .as_deref()
        .filter(|p| is_uuid(p))
        .map(|p| p.to_string());
    let has_parent = parent_id.is_some();

    let parent_type = match parent_id.as_deref() {
        Some(parent) => {
            let parent_type = field_values.first_value(parent, COHORT_TYPE_FIELD_ID);
            if parent_type.is_none() {
                warn!(
                    "No type field value found for parent cohort {} of {}",
                    parent, cohort.cohort_id
                );
            }
            parent_type
        }
        None => None,
    };

    let mut fields = RowPatch::new(COHORT_FIELD_COLUMNS);

    for mapping in COHORT_FIELD_MAPPINGS {
        if mapping.field_id == COHORT_TYPE_FIELD_ID || fields.has_value(mapping.column) {
            continue;
        }
        let Some(raw) = field_values.first_value(&cohort.cohort_id, mapping.field_id) else {
            continue; // absent source field leaves the column untouched
        };
        let value = match mapping.kind {
            FieldKind::NumericCode => match to_numeric_code(&raw) {
                Some(code) => SqlValue::Integer(code),
                None => continue,
            },
            _ => SqlValue::Text(raw),
        };
        fields.set(mapping.column, value)?;
    }

    let raw_type = field_values.first_value(&cohort.cohort_id, COHORT_TYPE_FIELD_ID);
    if let Some(derived) =
        classify_cohort_type(raw_type.as_deref(), has_parent, parent_type.as_deref())
    {
        info!(
            "Type transformation for cohort {}: {:?} -> {} (hasParent: {})",
            cohort.cohort_id, raw_type, derived, has_parent
        );
        fields.set("Type", SqlValue::Text(derived))?;
    }

    let record = CohortRecord {
        cohort_id: cohort.cohort_id.clone(),
        tenant_id: cohort.tenant_id.clone(),
        cohort_name: cohort.name.clone(),
        created_on: cohort.created_at.as_deref().and_then(parse_datetime),
        parent_id,
        fields,
    };

    store.upsert_cohort(&record).await
}
