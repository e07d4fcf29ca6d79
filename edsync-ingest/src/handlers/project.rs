//! Project event handlers

use edsync_common::db::SyncStore;
use edsync_common::events::{ProjectSyncEvent, ProjectTemplateEvent};
use edsync_common::transform::{
    transform_project, transform_task_trackings, transform_task_update, transform_template_tasks,
};
use edsync_common::transform::project::validate_sync_event;
use edsync_common::{BatchStats, Result};
use serde_json::Value;
use tracing::{error, info};

/// COURSE_PLANNER_PROJECT_CREATED: upsert the project, then its template
/// task list
pub async fn handle_project_created(store: &SyncStore, data: Value) -> Result<()> {
    let event: ProjectTemplateEvent = serde_json::from_value(data)?;

    let project = transform_project(&event)?;
    store.upsert_project(&project).await?;
    info!(
        "Project created/updated: ProjectId={}, ProjectName={:?}",
        project.project_id, project.project_name
    );

    let tasks = transform_template_tasks(&event)?;
    let mut upserted = 0usize;
    let mut errors = 0usize;
    for task in &tasks {
        match store.upsert_project_task(task).await {
            Ok(_) => upserted += 1,
            Err(err) => {
                error!(
                    "Failed to upsert task {} of project {}: {}",
                    task.project_task_id, project.project_id, err
                );
                errors += 1;
            }
        }
    }

    info!(
        "Project tasks processed: {} upserted, {} errors for ProjectId={}",
        upserted, errors, project.project_id
    );

    Ok(())
}

/// PROJECT_SYNC_CREATED / PROJECT_SYNC_UPDATED: record completion signals
/// for every completed task, deduplicated on redelivery
pub async fn handle_project_sync_update(store: &SyncStore, data: Value) -> Result<()> {
    let event: ProjectSyncEvent = serde_json::from_value(data)?;
    validate_sync_event(&event)?;

    let trackings = transform_task_trackings(&event)?;
    let project_id = event.solution_id.as_deref().unwrap_or_default();

    if trackings.is_empty() {
        info!("No completed tasks to insert for project {}", project_id);
        return Ok(());
    }

    let mut stats = BatchStats::new();
    for tracking in &trackings {
        stats.processed += 1;
        match store.insert_task_tracking(tracking).await {
            Ok(outcome) => stats.record(outcome),
            Err(err) => {
                error!(
                    "Failed to insert tracking for task {} of project {}: {}",
                    tracking.project_task_id, project_id, err
                );
                stats.errors += 1;
            }
        }
    }

    info!(
        "Project sync complete: projectId={}, {}",
        project_id,
        stats.display_string()
    );

    Ok(())
}

/// PROJECT_TASK_UPDATED: set-reconcile the project's tasks against the
/// incoming tree: delete rows missing from the message, upsert the rest
pub async fn handle_project_task_update(store: &SyncStore, data: Value) -> Result<()> {
    let event: ProjectSyncEvent = serde_json::from_value(data)?;
    validate_sync_event(&event)?;

    let incoming = transform_task_update(&event)?;
    let project_id = event.solution_id.as_deref().unwrap_or_default();

    let summary = store.reconcile_project_tasks(project_id, &incoming).await?;

    info!(
        "Project task update complete: projectId={}, upserted={}, deleted={}, errors={}",
        project_id, summary.upserted, summary.deleted, summary.errors
    );

    Ok(())
}
