//! Assessment, course and content tracker transformation

use crate::coerce::parse_datetime;
use crate::db::models::{
    AssessmentRecord, ContentTrackerRecord, CourseStatusUpdate, CourseTrackerRecord,
};
use crate::error::require_str;
use crate::events::{
    AssessmentTrackingData, ContentTrackingData, CourseEnrollmentData, CourseStatusUpdateData,
};
use crate::Result;
use serde_json::Value;

/// Transform an assessment tracking event
pub fn transform_assessment(data: &AssessmentTrackingData) -> Result<AssessmentRecord> {
    let assess_tracking_id =
        require_str(Some(data.assessment_tracking_id.as_str()), "assessmentTrackingId")?;

    Ok(AssessmentRecord {
        assess_tracking_id,
        assessment_id: data.content_id.clone().or_else(|| data.course_id.clone()),
        course_id: data.course_id.clone(),
        assessment_name: data.assessment_name.clone(),
        user_id: data.user_id.clone(),
        tenant_id: data.tenant_id.clone(),
        total_max_score: data.total_max_score,
        total_score: data.total_score,
        time_spent: data.time_spent.as_ref().and_then(number_of),
        assessment_summary: data
            .assessment_summary
            .as_ref()
            .map(|summary| summary.to_string()),
        attempt_id: data.attempt_id.clone(),
        assessment_type: data.assessment_type.clone(),
        evaluated_by: data.evaluated_by.clone(),
    })
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Transform a course enrollment event
pub fn transform_course_tracker(data: &CourseEnrollmentData) -> Result<CourseTrackerRecord> {
    require_str(Some(data.user_id.as_str()), "userId")?;
    require_str(Some(data.course_id.as_str()), "courseId")?;

    Ok(CourseTrackerRecord {
        user_id: data.user_id.clone(),
        tenant_id: data.tenant_id.clone(),
        course_id: data.course_id.clone(),
        course_name: data.course_name.clone(),
        course_tracking_status: data.status.clone(),
        certificate_id: data.certificate_id.clone(),
        start_date: data.created_on.as_deref().and_then(parse_datetime),
        end_date: data.completed_on.as_deref().and_then(parse_datetime),
    })
}

/// Transform a course status update; absent fields leave their columns
/// untouched
pub fn transform_course_status(data: &CourseStatusUpdateData) -> Result<CourseStatusUpdate> {
    require_str(Some(data.user_id.as_str()), "userId")?;
    require_str(Some(data.course_id.as_str()), "courseId")?;

    Ok(CourseStatusUpdate {
        user_id: data.user_id.clone(),
        tenant_id: data.tenant_id.clone(),
        course_id: data.course_id.clone(),
        status: data.status.clone(),
        created_on: data.created_on.as_deref().and_then(parse_datetime),
        completed_on: data
            .completed_on
            .as_deref()
            .map(|raw| parse_datetime(raw)),
        certificate_id: data
            .certificate_id
            .as_deref()
            .map(|raw| Some(raw.to_string()).filter(|s| !s.is_empty())),
    })
}

/// Transform a content tracking event.
///
/// The tracking status derives from the detail rows: any END marker means
/// completed, otherwise any START marker means started, otherwise
/// inprogress. Time spent is the sum of detail durations.
pub fn transform_content_tracker(data: &ContentTrackingData) -> Result<ContentTrackerRecord> {
    let content_tracker_id =
        require_str(Some(data.content_tracking_id.as_str()), "contentTrackingId")?;

    let has_start = data
        .details
        .iter()
        .any(|d| d.eid.as_deref() == Some("START"));
    let has_end = data.details.iter().any(|d| d.eid.as_deref() == Some("END"));

    let content_tracking_status = if has_end {
        "completed"
    } else if has_start {
        "started"
    } else {
        "inprogress"
    };

    let time_spent: f64 = data.details.iter().filter_map(|d| d.duration).sum();

    Ok(ContentTrackerRecord {
        content_tracker_id,
        user_id: data.user_id.clone(),
        tenant_id: data.tenant_id.clone(),
        content_id: data.content_id.clone(),
        course_id: data.course_id.clone(),
        content_name: data.content_name.clone(),
        content_type: data.content_type.clone(),
        content_tracking_status: content_tracking_status.to_string(),
        time_spent,
        created_at: data.created_on.as_deref().and_then(parse_datetime),
    })
}
