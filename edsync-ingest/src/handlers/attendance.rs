//! Attendance event handlers

use edsync_common::db::SyncStore;
use edsync_common::events::AttendanceEventData;
use edsync_common::transform::transform_attendance;
use edsync_common::Result;
use serde_json::Value;
use tracing::{info, warn};

/// ATTENDANCE_CREATED / ATTENDANCE_UPDATED: exactly one day column of the
/// target monthly row changes
pub async fn handle_attendance_upsert(store: &SyncStore, data: Value) -> Result<()> {
    let event: AttendanceEventData = serde_json::from_value(data)?;
    let record = transform_attendance(&event)?;

    let outcome = store.upsert_attendance_day(&record).await?;
    info!(
        "Attendance {} {}-{:02} {} reconciled: {:?}",
        record.user_id, record.year, record.month, record.day_column, outcome
    );

    Ok(())
}

/// ATTENDANCE_DELETED: retract the one day the event addresses; the rest
/// of the monthly row keeps its values
pub async fn handle_attendance_delete(store: &SyncStore, data: Value) -> Result<()> {
    let event: AttendanceEventData = serde_json::from_value(data)?;
    let record = transform_attendance(&event)?;

    let affected = store.clear_attendance_day(&record).await?;
    if affected == 0 {
        warn!(
            "ATTENDANCE_DELETED for unknown row: user {} {}-{:02}",
            record.user_id, record.year, record.month
        );
    }

    Ok(())
}
