//! Cohort membership migration

use crate::source::SourceCohortMember;
use edsync_common::db::models::CohortMemberRecord;
use edsync_common::db::SyncStore;
use edsync_common::{BatchStats, Result};
use std::path::Path;
use tracing::{error, info};

pub async fn run(store: &SyncStore, members_path: &Path) -> Result<BatchStats> {
    info!("=== STARTING COHORT MEMBERS MIGRATION ===");

    let (members, bad_rows) = crate::source::read_ndjson::<SourceCohortMember>(members_path)?;
    info!("Found {} cohort member records to migrate", members.len());

    let mut stats = BatchStats::new();
    for member in &members {
        stats.processed += 1;

        let record = CohortMemberRecord {
            cohort_member_id: Some(member.cohort_membership_id.clone()),
            user_id: member.user_id.clone(),
            cohort_id: member.cohort_id.clone(),
            member_status: member
                .status
                .clone()
                .unwrap_or_else(|| "active".to_string()),
            academic_year_id: member.academic_year_id.clone(),
        };

        match store.upsert_cohort_member(&record).await {
            Ok(outcome) => stats.record(outcome),
            Err(err) => {
                error!(
                    "Cohort member failed | user={} cohort={}: {}",
                    member.user_id, member.cohort_id, err
                );
                stats.errors += 1;
            }
        }
    }
    stats.skipped += bad_rows;

    info!("Cohort members migration summary: {}", stats.display_string());
    Ok(stats)
}
