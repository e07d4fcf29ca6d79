//! Assessment, course and content tracking handlers

use edsync_common::db::SyncStore;
use edsync_common::events::{
    AssessmentTrackingData, ContentTrackingData, CourseEnrollmentData, CourseStatusUpdateData,
};
use edsync_common::transform::{
    transform_assessment, transform_content_tracker, transform_course_status,
    transform_course_tracker,
};
use edsync_common::Result;
use serde_json::Value;
use tracing::{info, warn};

/// ASSESSMENT_CREATED / ASSESSMENT_UPDATED
pub async fn handle_assessment_upsert(store: &SyncStore, data: Value) -> Result<()> {
    let event: AssessmentTrackingData = serde_json::from_value(data)?;
    let record = transform_assessment(&event)?;

    let outcome = store.upsert_assessment(&record).await?;
    info!(
        "Assessment {} reconciled: {:?}",
        record.assess_tracking_id, outcome
    );
    Ok(())
}

/// ASSESSMENT_DELETED
pub async fn handle_assessment_delete(store: &SyncStore, data: Value) -> Result<()> {
    let event: AssessmentTrackingData = serde_json::from_value(data)?;

    if store
        .delete_assessment(&event.assessment_tracking_id)
        .await?
    {
        info!("Deleted assessment {}", event.assessment_tracking_id);
    } else {
        warn!(
            "ASSESSMENT_DELETED for unknown assessment {}",
            event.assessment_tracking_id
        );
    }
    Ok(())
}

/// COURSE_ENROLLMENT_CREATED
pub async fn handle_course_enrollment(store: &SyncStore, data: Value) -> Result<()> {
    let event: CourseEnrollmentData = serde_json::from_value(data)?;
    let record = transform_course_tracker(&event)?;

    let outcome = store.upsert_course_tracker(&record).await?;
    info!(
        "Course tracker {}/{} reconciled: {:?}",
        record.user_id, record.course_id, outcome
    );
    Ok(())
}

/// COURSE_STATUS_UPDATED: update-only against the existing enrollment
pub async fn handle_course_status_update(store: &SyncStore, data: Value) -> Result<()> {
    let event: CourseStatusUpdateData = serde_json::from_value(data)?;
    let update = transform_course_status(&event)?;

    let affected = store.update_course_status(&update).await?;
    if affected == 0 {
        warn!(
            "COURSE_STATUS_UPDATED for unknown enrollment: user {} course {}",
            update.user_id, update.course_id
        );
    }
    Ok(())
}

/// CONTENT_TRACKING_CREATED
pub async fn handle_content_tracking(store: &SyncStore, data: Value) -> Result<()> {
    let event: ContentTrackingData = serde_json::from_value(data)?;
    let record = transform_content_tracker(&event)?;

    let outcome = store.upsert_content_tracker(&record).await?;
    info!(
        "Content tracker {} reconciled: {:?} (status {})",
        record.content_tracker_id, outcome, record.content_tracking_status
    );
    Ok(())
}
