//! End-to-end event flow tests: dispatch -> transform -> reconcile against
//! an in-memory destination

use edsync_common::db::{init_memory_database, SyncStore};
use edsync_ingest::dispatch::process_event;
use serde_json::json;

async fn test_store() -> SyncStore {
    let pool = init_memory_database().await.unwrap();
    SyncStore::new(pool).await
}

#[tokio::test]
async fn test_user_created_fans_out_to_membership_and_registration() {
    let store = test_store().await;

    let message = json!({
        "eventType": "USER_CREATED",
        "data": {
            "userId": "u-1",
            "username": "asha",
            "firstName": "Asha",
            "lastName": "Rao",
            "status": "active",
            "createdAt": "2024-06-01T08:00:00.000Z",
            "customFields": [
                { "fieldId": "f93c0ac3-f827-4794-9457-441fa1057b42",
                  "selectedValues": ["CBSE"] }
            ],
            "cohorts": [
                { "batchId": "b-1", "cohortMemberStatus": "active",
                  "cohortMemberId": "cm-1" }
            ],
            "tenantData": [
                { "tenantId": "t-1", "roles": [ { "roleId": "r-1" } ] }
            ]
        }
    });

    process_event(&store, "user-topic", message).await.unwrap();

    assert!(store.user_exists("u-1").await.unwrap());

    let board: Option<String> =
        sqlx::query_scalar(r#"SELECT "UserBoard" FROM "Users" WHERE "UserID" = ?"#)
            .bind("u-1")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(board.as_deref(), Some("CBSE"));

    let membership = store
        .find_cohort_member("u-1", "b-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(membership.cohort_member_id, "cm-1");

    assert_eq!(
        store
            .registration_is_active("u-1", "r-1", "t-1")
            .await
            .unwrap(),
        Some(true)
    );
}

#[tokio::test]
async fn test_cohort_type_propagates_from_parent_center() {
    let store = test_store().await;

    let parent = json!({
        "eventType": "COHORT_CREATED",
        "data": {
            "cohortId": "center-1",
            "name": "Center",
            "type": "COHORT",
            "customFields": [
                { "fieldId": "000a7469-2721-4c7b-8180-52812a0f6fe7",
                  "selectedValues": [{ "id": "x", "value": "regular" }] }
            ]
        }
    });
    process_event(&store, "user-topic", parent).await.unwrap();

    let parent_row = store.find_cohort("center-1").await.unwrap().unwrap();
    assert_eq!(parent_row.cohort_type.as_deref(), Some("regularCenter"));

    // Child carries no type field of its own; the stored parent type decides
    let child = json!({
        "eventType": "COHORT_UPDATED",
        "data": {
            "cohortId": "batch-1",
            "name": "Batch",
            "parentId": "center-1",
            "type": "BATCH",
            "customFields": []
        }
    });
    process_event(&store, "user-topic", child).await.unwrap();

    let child_row = store.find_cohort("batch-1").await.unwrap().unwrap();
    assert_eq!(child_row.cohort_type.as_deref(), Some("regularBatch"));
}

#[tokio::test]
async fn test_cohort_with_unknown_parent_keeps_own_type() {
    let store = test_store().await;

    let child = json!({
        "eventType": "COHORT_CREATED",
        "data": {
            "cohortId": "batch-9",
            "parentId": "missing-parent",
            "type": "BATCH",
            "customFields": []
        }
    });
    process_event(&store, "user-topic", child).await.unwrap();

    let row = store.find_cohort("batch-9").await.unwrap().unwrap();
    assert_eq!(row.cohort_type.as_deref(), Some("BATCH"));
}

#[tokio::test]
async fn test_attendance_event_redelivery_is_idempotent() {
    let store = test_store().await;

    let message = json!({
        "eventType": "ATTENDANCE_CREATED",
        "data": {
            "userId": "u-1",
            "tenantId": "t-1",
            "context": "cohort",
            "contextId": "b-1",
            "attendanceDate": "2024-03-05T09:30:00.000Z",
            "attendance": "present",
            "metaData": { "deviceId": "d-1" }
        }
    });

    process_event(&store, "attendance-topic", message.clone())
        .await
        .unwrap();
    process_event(&store, "attendance-topic", message)
        .await
        .unwrap();

    assert_eq!(store.count_attendance_rows("u-1").await.unwrap(), 1);
    let day = store
        .find_attendance_day(Some("t-1"), Some("b-1"), "u-1", 2024, 3, "day05")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(day["attendance"], json!("present"));
    assert_eq!(day["deviceId"], json!("d-1"));
}

#[tokio::test]
async fn test_project_task_update_reconciles_task_set() {
    let store = test_store().await;

    // Planner event creates the project with three tasks
    let created = json!({
        "eventType": "COURSE_PLANNER_PROJECT_CREATED",
        "data": {
            "solution": { "solutionId": "s-1" },
            "projectTemplate": {
                "projectTemplateId": "pt-1",
                "title": "Project",
                "metaData": { "board": "CBSE" }
            },
            "projectTemplateTasks": [
                { "_id": "T1", "externalId": "e1", "name": "One" },
                { "_id": "T2", "externalId": "e2", "name": "Two", "parentTaskId": "e1" },
                { "_id": "T3", "externalId": "e3", "name": "Three" }
            ]
        }
    });
    process_event(&store, "project-topic", created).await.unwrap();
    assert_eq!(
        store.project_tasks_by_project("s-1").await.unwrap().len(),
        3
    );

    // Direct task-update message drops T3
    let update = json!({
        "solutionId": "s-1",
        "tasks": [
            { "referenceId": "T1", "name": "One",
              "children": [ { "referenceId": "T2", "name": "Two" } ] }
        ]
    });
    process_event(&store, "project-update-topic", update)
        .await
        .unwrap();

    let remaining = store.project_tasks_by_project("s-1").await.unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|t| t.project_task_id != "T3"));
}

#[tokio::test]
async fn test_completion_signals_deduplicate_across_sync_messages() {
    let store = test_store().await;

    let sync = json!({
        "solutionId": "s-1",
        "entityId": "cohort-1",
        "createdAt": "2025-01-01T10:00:00.000Z",
        "updatedAt": "2025-01-02T10:00:00.000Z",
        "tasks": [
            { "referenceId": "X", "status": "completed" }
        ]
    });

    process_event(&store, "project-sync-topic", sync.clone())
        .await
        .unwrap();
    process_event(&store, "project-sync-topic", sync)
        .await
        .unwrap();

    assert_eq!(store.count_task_trackings("s-1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_bad_event_fails_alone() {
    let store = test_store().await;

    // Missing solutionId: rejected with a validation error
    let invalid = json!({ "tasks": [] });
    let err = process_event(&store, "project-update-topic", invalid)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("solutionId"));

    // The store keeps serving subsequent events
    let valid = json!({
        "eventType": "ATTENDANCE_CREATED",
        "data": {
            "userId": "u-1",
            "attendanceDate": "2024-03-05T09:30:00.000Z",
            "attendance": "present"
        }
    });
    process_event(&store, "attendance-topic", valid).await.unwrap();
    assert_eq!(store.count_attendance_rows("u-1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_course_and_content_events_route_across_topics() {
    let store = test_store().await;

    let enrollment = json!({
        "eventType": "COURSE_ENROLLMENT_CREATED",
        "data": {
            "userId": "u-1",
            "tenantId": "t-1",
            "courseId": "course-1",
            "courseName": "Algebra",
            "status": "inprogress"
        }
    });
    // Arrives on the user topic; the event type routes it anyway
    process_event(&store, "user-topic", enrollment).await.unwrap();

    let status: Option<String> = sqlx::query_scalar(
        r#"SELECT "CourseTrackingStatus" FROM "CourseTracker"
           WHERE "UserId" = ? AND "CourseId" = ?"#,
    )
    .bind("u-1")
    .bind("course-1")
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(status.as_deref(), Some("inprogress"));

    let content = json!({
        "eventType": "CONTENT_TRACKING_CREATED",
        "data": {
            "contentTrackingId": "ct-1",
            "userId": "u-1",
            "tenantId": "t-1",
            "contentId": "content-1",
            "details": [
                { "eid": "START", "duration": 30.0 },
                { "eid": "END", "duration": 12.5 }
            ]
        }
    });
    process_event(&store, "user-topic", content).await.unwrap();

    let (status, time): (Option<String>, Option<f64>) = sqlx::query_as(
        r#"SELECT "ContentTrackingStatus", "TimeSpent" FROM "ContentTracker"
           WHERE "ContentTrackerId" = ?"#,
    )
    .bind("ct-1")
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(status.as_deref(), Some("completed"));
    assert_eq!(time, Some(42.5));
}
