//! Assessment, course and content tracking event payloads

use serde::Deserialize;
use serde_json::Value;

/// ASSESSMENT_CREATED / ASSESSMENT_UPDATED payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentTrackingData {
    pub assessment_tracking_id: String,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub assessment_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub total_max_score: Option<f64>,
    #[serde(default)]
    pub total_score: Option<f64>,
    /// Arrives as number or string
    #[serde(default)]
    pub time_spent: Option<Value>,
    #[serde(default)]
    pub assessment_summary: Option<Value>,
    #[serde(default)]
    pub attempt_id: Option<String>,
    #[serde(default)]
    pub assessment_type: Option<String>,
    #[serde(default)]
    pub evaluated_by: Option<String>,
}

/// COURSE_ENROLLMENT_CREATED payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEnrollmentData {
    pub user_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub course_id: String,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub certificate_id: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub completed_on: Option<String>,
}

/// COURSE_STATUS_UPDATED payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStatusUpdateData {
    pub user_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub course_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub completed_on: Option<String>,
    #[serde(default)]
    pub certificate_id: Option<String>,
}

/// CONTENT_TRACKING_CREATED payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTrackingData {
    pub content_tracking_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub content_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub details: Vec<ContentDetail>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
}

/// One playback/interaction detail row on a content tracking event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetail {
    #[serde(default)]
    pub eid: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}
