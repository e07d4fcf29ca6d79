//! Completion tracking migration from project documents
//!
//! Only documents carrying an entityId (the cohort scope) produce rows,
//! and only their completed tasks; the (ProjectId, ProjectTaskId,
//! CohortId) triple deduplicates reruns.

use crate::source::SourceProjectDoc;
use edsync_common::db::SyncStore;
use edsync_common::events::ProjectSyncEvent;
use edsync_common::transform::transform_task_trackings;
use edsync_common::{BatchStats, Result};
use std::path::Path;
use tracing::{error, info, warn};

pub async fn run(store: &SyncStore, projects_path: &Path) -> Result<BatchStats> {
    info!("=== STARTING PROJECT TASK TRACKING MIGRATION ===");

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
        let Some(entity_id) = doc.entity_id.as_deref() else {
            warn!("Project document {:?} has no entityId, skipping", doc.id);
            stats.skipped += 1;
            continue;
        };

        if !store.project_exists(solution_id).await? {
            warn!(
                "Project {} does not exist in the Project table - skipping",
                solution_id
            );
            missing_projects += 1;
            continue;
        }

        let event = ProjectSyncEvent {
            solution_id: Some(solution_id.to_string()),
            entity_id: Some(entity_id.to_string()),
            tasks: Some(doc.tasks.clone()),
            ..Default::default()
        };

        let trackings = match transform_task_trackings(&event) {
            Ok(rows) => rows,
            Err(err) => {
                error!("Solution {} tracking transform failed: {}", solution_id, err);
                stats.errors += 1;
                continue;
            }
        };

        for tracking in &trackings {
            stats.processed += 1;
            match store.insert_task_tracking(tracking).await {
                Ok(outcome) => stats.record(outcome),
                Err(err) => {
                    error!(
                        "Tracking for task {} of project {} failed: {}",
                        tracking.project_task_id, solution_id, err
                    );
                    stats.errors += 1;
                }
            }
        }
    }

    if missing_projects > 0 {
        warn!(
            "{} project documents skipped because their solution is missing from the \
             Project table",
            missing_projects
        );
    }

    info!(
        "Project task tracking migration summary: {}",
        stats.display_string()
    );
    Ok(stats)
}
