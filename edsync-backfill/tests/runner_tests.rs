//! Backfill runner tests against snapshot fixtures on disk

use edsync_backfill::runners;
use edsync_common::db::{init_memory_database, SyncStore};
use std::path::PathBuf;

async fn test_store() -> SyncStore {
    let pool = init_memory_database().await.unwrap();
    SyncStore::new(pool).await
}

fn write_fixture(dir: &tempfile::TempDir, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

#[tokio::test]
async fn test_cohort_migration_classifies_parent_and_child() {
    let store = test_store().await;
    let dir = tempfile::tempdir().unwrap();

    let cohorts = write_fixture(
        &dir,
        "cohorts.ndjson",
        &[
            r#"{"cohortId":"11111111-1111-4111-8111-111111111111","tenantId":"t-1","name":"Center A","createdAt":"2024-01-01T00:00:00.000Z"}"#,
            r#"{"cohortId":"22222222-2222-4222-8222-222222222222","tenantId":"t-1","name":"Batch A","parentId":"11111111-1111-4111-8111-111111111111"}"#,
        ],
    );
    let field_values = write_fixture(
        &dir,
        "field_values.ndjson",
        &[
            // Parent carries the center-type field and a board
            r#"{"itemId":"11111111-1111-4111-8111-111111111111","fieldId":"000a7469-2721-4c7b-8180-52812a0f6fe7","value":["regular"]}"#,
            r#"{"itemId":"11111111-1111-4111-8111-111111111111","fieldId":"f93c0ac3-f827-4794-9457-441fa1057b42","value":"CBSE"}"#,
            // Child has no type field at all
            r#"{"itemId":"22222222-2222-4222-8222-222222222222","fieldId":"5a2dbb89-bbe6-4aa8-b541-93e01ab07b70","value":"8"}"#,
        ],
    );

    let stats = runners::cohorts::run(&store, &cohorts, &field_values)
        .await
        .unwrap();

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.errors, 0);

    let parent = store
        .find_cohort("11111111-1111-4111-8111-111111111111")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(parent.cohort_type.as_deref(), Some("regularCenter"));

    // Child synthesizes its batch type from the parent's field value
    let child = store
        .find_cohort("22222222-2222-4222-8222-222222222222")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(child.cohort_type.as_deref(), Some("regularBatch"));
    assert_eq!(
        child.parent_id.as_deref(),
        Some("11111111-1111-4111-8111-111111111111")
    );
}

#[tokio::test]
async fn test_cohort_migration_is_rerunnable() {
    let store = test_store().await;
    let dir = tempfile::tempdir().unwrap();

    let cohorts = write_fixture(
        &dir,
        "cohorts.ndjson",
        &[r#"{"cohortId":"11111111-1111-4111-8111-111111111111","name":"Center A"}"#],
    );
    let field_values = write_fixture(&dir, "field_values.ndjson", &[]);

    let first = runners::cohorts::run(&store, &cohorts, &field_values)
        .await
        .unwrap();
    let second = runners::cohorts::run(&store, &cohorts, &field_values)
        .await
        .unwrap();

    assert_eq!(first.inserted, 1);
    assert_eq!(second.updated, 1);
    assert_eq!(second.errors, 0);
}

#[tokio::test]
async fn test_attendance_migration_groups_by_month() {
    let store = test_store().await;
    let dir = tempfile::tempdir().unwrap();

    let attendance = write_fixture(
        &dir,
        "attendance.ndjson",
        &[
            r#"{"userId":"u-1","tenantId":"t-1","context":"cohort","contextId":"b-1","attendanceDate":"2024-03-05T09:00:00.000Z","attendance":"present"}"#,
            r#"{"userId":"u-1","tenantId":"t-1","context":"cohort","contextId":"b-1","attendanceDate":"2024-03-06T09:00:00.000Z","attendance":"absent"}"#,
            r#"{"userId":"u-1","tenantId":"t-1","context":"cohort","contextId":"b-1","attendanceDate":"2024-04-02T09:00:00.000Z","attendance":"present"}"#,
            r#"{"userId":"u-1","tenantId":"t-1","context":"cohort","contextId":"b-1","attendanceDate":null}"#,
        ],
    );

    let stats = runners::attendance::run(&store, &attendance).await.unwrap();

    // Two monthly groups, one unplaceable row
    assert_eq!(stats.processed, 2);
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(store.count_attendance_rows("u-1").await.unwrap(), 2);

    let day06 = store
        .find_attendance_day(Some("t-1"), Some("b-1"), "u-1", 2024, 3, "day06")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(day06["attendance"], serde_json::json!("absent"));
}

#[tokio::test]
async fn test_registration_migration_skips_incomplete_rows() {
    let store = test_store().await;
    let dir = tempfile::tempdir().unwrap();

    let registrations = write_fixture(
        &dir,
        "registrations.ndjson",
        &[
            r#"{"userId":"u-1","tenantId":"t-1","roleId":"r-1","tenantRegnDate":"2024-01-15T00:00:00.000Z"}"#,
            r#"{"userId":"u-2","tenantId":"t-1"}"#,
        ],
    );

    let stats = runners::registrations::run(&store, &registrations)
        .await
        .unwrap();

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(
        store
            .registration_is_active("u-1", "r-1", "t-1")
            .await
            .unwrap(),
        Some(true)
    );
}

#[tokio::test]
async fn test_task_migration_requires_project_row() {
    let store = test_store().await;
    let dir = tempfile::tempdir().unwrap();

    let solutions = write_fixture(
        &dir,
        "solutions.ndjson",
        &[r#"{"_id":"s-1","name":"Project One","scope":{"board":["CBSE"],"class":["8"]}}"#],
    );
    runners::projects::run(&store, &solutions).await.unwrap();

    let projects = write_fixture(
        &dir,
        "projects.ndjson",
        &[
            // Known solution: parent + child migrate
            r#"{"_id":"d-1","solutionId":"s-1","tasks":[{"referenceId":"T1","name":"Parent","children":[{"referenceId":"T2","name":"Child"}]}]}"#,
            // Unknown solution: skipped entirely
            r#"{"_id":"d-2","solutionId":"s-404","tasks":[{"referenceId":"T9"}]}"#,
        ],
    );

    let stats = runners::tasks::run(&store, &projects).await.unwrap();

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.inserted, 2);

    let tasks = store.project_tasks_by_project("s-1").await.unwrap();
    assert_eq!(tasks.len(), 2);
    let child = tasks.iter().find(|t| t.project_task_id == "T2").unwrap();
    assert_eq!(child.parent_id.as_deref(), Some("T1"));
}

#[tokio::test]
async fn test_tracking_migration_deduplicates_on_rerun() {
    let store = test_store().await;
    let dir = tempfile::tempdir().unwrap();

    let solutions = write_fixture(
        &dir,
        "solutions.ndjson",
        &[r#"{"_id":"s-1","name":"Project One"}"#],
    );
    runners::projects::run(&store, &solutions).await.unwrap();

    let projects = write_fixture(
        &dir,
        "projects.ndjson",
        &[
            r#"{"_id":"d-1","solutionId":"s-1","entityId":"cohort-1","tasks":[{"referenceId":"T1","status":"completed"},{"referenceId":"T2","status":"pending"}]}"#,
        ],
    );

    let first = runners::task_trackings::run(&store, &projects).await.unwrap();
    let second = runners::task_trackings::run(&store, &projects).await.unwrap();

    assert_eq!(first.inserted, 1);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.unchanged, 1);
    assert_eq!(store.count_task_trackings("s-1").await.unwrap(), 1);
}
