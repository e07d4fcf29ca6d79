//! Attendance tracker migration
//!
//! Source rows are grouped by (tenant, context, contextId, user, year,
//! month) into sparse monthly records before any write; each group then
//! updates only its own day columns, or inserts a fresh row carrying just
//! those days.

use edsync_common::db::SyncStore;
use edsync_common::events::AttendanceEventData;
use edsync_common::transform::group_attendance;
use edsync_common::{BatchStats, Result};
use std::path::Path;
use tracing::{error, info};

pub async fn run(store: &SyncStore, attendance_path: &Path) -> Result<BatchStats> {
    info!("=== STARTING ATTENDANCE TRACKER MIGRATION ===");

    let (rows, bad_rows) = crate::source::read_ndjson::<AttendanceEventData>(attendance_path)?;
    info!("Fetched {} attendance rows", rows.len());

    let (groups, unplaceable) = group_attendance(rows);
    info!(
        "Grouped into {} unique (tenant, context, user, month) groups ({} rows skipped)",
        groups.len(),
        unplaceable + bad_rows
    );

    let mut stats = BatchStats::new();
    stats.skipped = unplaceable + bad_rows;

    for group in &groups {
        stats.processed += 1;
        match store.upsert_attendance_month(group).await {
            Ok(outcome) => stats.record(outcome),
            Err(err) => {
                error!(
                    "Attendance group failed | tenant={:?} user={} {}-{:02}: {}",
                    group.tenant_id, group.user_id, group.year, group.month, err
                );
                stats.errors += 1;
            }
        }

        if stats.processed % 100 == 0 {
            info!(
                "Progress: {}/{} groups processed ({} updated, {} inserted)",
                stats.processed,
                groups.len(),
                stats.updated,
                stats.inserted
            );
        }
    }

    info!("Attendance migration summary: {}", stats.display_string());
    Ok(stats)
}
