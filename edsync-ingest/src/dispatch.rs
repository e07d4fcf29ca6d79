//! Event routing
//!
//! Mirrors the upstream topic contract: most topics deliver wrapped
//! `{ eventType, data }` envelopes routed by topic, a few event types route
//! across topics, and the project-sync topics deliver direct messages whose
//! event type is inferred from the message shape.

use chrono::DateTime;
use edsync_common::coerce::parse_datetime;
use edsync_common::db::SyncStore;
use edsync_common::events::EventEnvelope;
use edsync_common::Result;
use serde_json::Value;
use tracing::{info, warn};

use crate::handlers;

/// Process one inbound message from a topic.
///
/// A returned error fails this event only; the caller logs it and moves to
/// the next message (redelivery is the transport's job).
pub async fn process_event(store: &SyncStore, topic: &str, message: Value) -> Result<()> {
    let envelope: EventEnvelope = serde_json::from_value(message.clone())?;

    match envelope.into_wrapped() {
        Some((event_type, data)) => process_wrapped_event(store, topic, &event_type, data).await,
        None => process_direct_message(store, topic, message).await,
    }
}

async fn process_wrapped_event(
    store: &SyncStore,
    topic: &str,
    event_type: &str,
    data: Value,
) -> Result<()> {
    // These event types route on type alone, regardless of topic
    match event_type {
        "COURSE_ENROLLMENT_CREATED" => {
            return handlers::tracking::handle_course_enrollment(store, data).await;
        }
        "COURSE_STATUS_UPDATED" => {
            return handlers::tracking::handle_course_status_update(store, data).await;
        }
        "CONTENT_TRACKING_CREATED" => {
            return handlers::tracking::handle_content_tracking(store, data).await;
        }
        "COURSE_PLANNER_PROJECT_CREATED" => {
            return handlers::project::handle_project_created(store, data).await;
        }
        _ => {}
    }

    match topic {
        "user-topic" => handle_user_event(store, event_type, data).await,
        "attendance-topic" => handle_attendance_event(store, event_type, data).await,
        "tracking-topic" => handle_assessment_event(store, event_type, data).await,
        "project-topic" => handle_project_event(store, event_type, data).await,
        _ => {
            warn!("Unhandled topic: {}", topic);
            Ok(())
        }
    }
}

async fn handle_user_event(store: &SyncStore, event_type: &str, data: Value) -> Result<()> {
    match event_type {
        "USER_CREATED" | "USER_UPDATED" => handlers::user::handle_user_upsert(store, data).await,
        "USER_DELETED" => handlers::user::handle_user_delete(store, data).await,
        "USER_LOGIN" => handlers::user::handle_user_last_login(store, data).await,
        "USER_TENANT_STATUS_UPDATE" => {
            handlers::user::handle_user_tenant_status_update(store, data).await
        }
        "USER_TENANT_MAPPING" => handlers::user::handle_user_tenant_mapping(store, data).await,
        "COHORT_CREATED" | "COHORT_UPDATED" => {
            handlers::cohort::handle_cohort_upsert(store, data).await
        }
        "COHORT_DELETED" => handlers::cohort::handle_cohort_delete(store, data).await,
        "COHORT_MEMBER_CREATED" | "COHORT_MEMBER_UPDATED" => {
            handlers::cohort_member::handle_cohort_member_upsert(store, data).await
        }
        other => {
            warn!("Unhandled user eventType: {}", other);
            Ok(())
        }
    }
}

async fn handle_attendance_event(store: &SyncStore, event_type: &str, data: Value) -> Result<()> {
    match event_type {
        "ATTENDANCE_CREATED" | "ATTENDANCE_UPDATED" => {
            handlers::attendance::handle_attendance_upsert(store, data).await
        }
        "ATTENDANCE_DELETED" => handlers::attendance::handle_attendance_delete(store, data).await,
        other => {
            warn!("Unhandled attendance eventType: {}", other);
            Ok(())
        }
    }
}

async fn handle_assessment_event(store: &SyncStore, event_type: &str, data: Value) -> Result<()> {
    match event_type {
        "ASSESSMENT_CREATED" | "ASSESSMENT_UPDATED" => {
            handlers::tracking::handle_assessment_upsert(store, data).await
        }
        "ASSESSMENT_DELETED" => handlers::tracking::handle_assessment_delete(store, data).await,
        other => {
            warn!("Unhandled assessment eventType: {}", other);
            Ok(())
        }
    }
}

async fn handle_project_event(store: &SyncStore, event_type: &str, data: Value) -> Result<()> {
    match event_type {
        "COURSE_PLANNER_PROJECT_CREATED" => {
            handlers::project::handle_project_created(store, data).await
        }
        "PROJECT_SYNC_CREATED" | "PROJECT_SYNC_UPDATED" => {
            handlers::project::handle_project_sync_update(store, data).await
        }
        "PROJECT_TASK_UPDATED" => handlers::project::handle_project_task_update(store, data).await,
        other => {
            warn!("Unhandled project eventType: {}", other);
            Ok(())
        }
    }
}

/// Direct messages arrive without the eventType/data wrapper; the event
/// type is inferred from topic and message shape
async fn process_direct_message(store: &SyncStore, topic: &str, message: Value) -> Result<()> {
    match topic {
        "project-sync-topic" => {
            let event_type = infer_project_sync_event_type(&message);
            info!("Inferred event type {} for topic {}", event_type, topic);
            handle_project_event(store, event_type, message).await
        }
        "project-update-topic" => {
            handle_project_event(store, "PROJECT_TASK_UPDATED", message).await
        }
        _ => {
            warn!("Received direct message from unmapped topic: {}", topic);
            Ok(())
        }
    }
}

/// A sync message whose createdAt and updatedAt are within one second is a
/// creation; everything else is an update
pub fn infer_project_sync_event_type(message: &Value) -> &'static str {
    let parse = |key: &str| -> Option<DateTime<chrono::Utc>> {
        message.get(key)?.as_str().and_then(parse_datetime)
    };

    if let (Some(created), Some(updated)) = (parse("createdAt"), parse("updatedAt")) {
        let diff = (updated - created).num_milliseconds().abs();
        if diff < 1000 {
            return "PROJECT_SYNC_CREATED";
        }
    }

    "PROJECT_SYNC_UPDATED"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer_creation_when_timestamps_close() {
        let message = json!({
            "createdAt": "2025-01-01T10:00:00.000Z",
            "updatedAt": "2025-01-01T10:00:00.400Z"
        });
        assert_eq!(
            infer_project_sync_event_type(&message),
            "PROJECT_SYNC_CREATED"
        );
    }

    #[test]
    fn test_infer_update_when_timestamps_apart() {
        let message = json!({
            "createdAt": "2025-01-01T10:00:00.000Z",
            "updatedAt": "2025-01-02T09:00:00.000Z"
        });
        assert_eq!(
            infer_project_sync_event_type(&message),
            "PROJECT_SYNC_UPDATED"
        );
    }

    #[test]
    fn test_infer_defaults_to_update() {
        assert_eq!(
            infer_project_sync_event_type(&json!({})),
            "PROJECT_SYNC_UPDATED"
        );
    }
}
