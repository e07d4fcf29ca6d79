//! Inbound event payload types
//!
//! Shapes of the already-parsed domain events the platform bus delivers.
//! Transport decoding (broker envelopes, offsets, retries) happens upstream;
//! these types describe only what the transformation layer consumes.

mod attendance_types;
mod cohort_types;
mod project_types;
mod tracking_types;
mod user_types;

pub use attendance_types::AttendanceEventData;
pub use cohort_types::{CohortEventData, CohortMemberEventData, MemberFieldUpdate};
pub use project_types::{
    ProjectSyncEvent, ProjectTemplateEvent, ProjectTemplateTask, TaskNode,
};
pub use tracking_types::{
    AssessmentTrackingData, ContentDetail, ContentTrackingData, CourseEnrollmentData,
    CourseStatusUpdateData,
};
pub use user_types::{CohortAssignment, TenantData, TenantRole, UserEventData};

use serde::Deserialize;
use serde_json::Value;

/// Standard wrapped event format: `{ "eventType": ..., "data": ... }`
///
/// Some topics deliver direct messages without the wrapper; those are
/// detected by the absence of both fields and routed on message shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl EventEnvelope {
    /// Split into (eventType, data) when the wrapper is present
    pub fn into_wrapped(self) -> Option<(String, Value)> {
        match (self.event_type, self.data) {
            (Some(event_type), Some(data)) => Some((event_type, data)),
            _ => None,
        }
    }
}
