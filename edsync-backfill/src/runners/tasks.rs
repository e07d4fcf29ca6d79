//! Project task migration from project documents
//!
//! Tasks only migrate for solutions that already exist in the destination
//! Project table; run the project migration first. Parent tasks land with
//! ParentId null, children with their parent's referenceId.

use crate::source::SourceProjectDoc;
use edsync_common::db::SyncStore;
use edsync_common::events::ProjectSyncEvent;
use edsync_common::transform::transform_task_update;
use edsync_common::{BatchStats, Result};
use std::path::Path;
use tracing::{error, info, warn};

pub async fn run(store: &SyncStore, projects_path: &Path) -> Result<BatchStats> {
    info!("=== STARTING PROJECT TASK MIGRATION ===");

    let (docs, bad_rows) = crate::source::read_ndjson::<SourceProjectDoc>(projects_path)?;
    info!("Found {} project documents to process", docs.len());

    let mut stats = BatchStats::new();
    stats.skipped += bad_rows;
    let mut missing_projects = 0usize;

    for doc in &docs {
        let Some(solution_id) = doc.solution_id.as_deref() else {
            warn!("Project document {:?} has no solutionId, skipping", doc.id);
            stats.skipped += 1;
            continue;
        };

        if !store.project_exists(solution_id).await? {
            warn!(
                "Solution {} does not exist in the Project table - skipping its tasks",
                solution_id
            );
            missing_projects += 1;
            continue;
        }

        let event = ProjectSyncEvent {
            solution_id: Some(solution_id.to_string()),
            tasks: Some(doc.tasks.clone()),
            ..Default::default()
        };

        let rows = match transform_task_update(&event) {
            Ok(rows) => rows,
            Err(err) => {
                error!("Solution {} task transform failed: {}", solution_id, err);
                stats.errors += 1;
                continue;
            }
        };

        for task in &rows {
            stats.processed += 1;
            match store.upsert_project_task(task).await {
                Ok(outcome) => stats.record(outcome),
                Err(err) => {
                    error!(
                        "Task {} of solution {} failed: {}",
                        task.project_task_id, solution_id, err
                    );
                    stats.errors += 1;
                }
            }
        }
    }

    if missing_projects > 0 {
        warn!(
            "{} solutions skipped because they are missing from the Project table; \
             run the project migration first",
            missing_projects
        );
    }

    info!("Project task migration summary: {}", stats.display_string());
    Ok(stats)
}
