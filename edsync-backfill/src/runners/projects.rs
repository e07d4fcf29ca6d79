//! Project migration from solution documents

use crate::source::{first_or_self, SourceSolution};
use edsync_common::coerce::{format_date_only, parse_datetime_value};
use edsync_common::db::models::ProjectRecord;
use edsync_common::db::SyncStore;
use edsync_common::{BatchStats, Result};
use serde_json::Value;
use std::path::Path;
use tracing::{error, info};

fn scope_text(value: Option<&Value>) -> Option<String> {
    value.and_then(first_or_self)
}

fn date_only(value: Option<&Value>) -> Option<String> {
    value
        .and_then(parse_datetime_value)
        .map(|dt| format_date_only(&dt))
}

pub async fn run(store: &SyncStore, solutions_path: &Path) -> Result<BatchStats> {
    info!("=== STARTING PROJECT MIGRATION ===");

    let (solutions, bad_rows) = crate::source::read_ndjson::<SourceSolution>(solutions_path)?;
    info!("Found {} solutions to migrate", solutions.len());

    let mut stats = BatchStats::new();
    stats.skipped += bad_rows;

    for solution in &solutions {
        stats.processed += 1;

        let scope = solution.scope.as_ref();
        let record = ProjectRecord {
            project_id: solution.id.clone(),
            project_name: solution.name.clone(),
            board: scope_text(scope.and_then(|s| s.board.as_ref())),
            medium: scope_text(scope.and_then(|s| s.medium.as_ref())),
            subject: scope_text(scope.and_then(|s| s.subject.as_ref())),
            grade: scope_text(scope.and_then(|s| s.grade.as_ref())),
            project_type: scope_text(scope.and_then(|s| s.course_type.as_ref())),
            start_date: date_only(solution.start_date.as_ref()),
            end_date: date_only(solution.end_date.as_ref()),
            created_by: solution.created_by.clone(),
            tenant_id: solution.tenant_id.clone(),
            academic_year: solution.academic_year.clone(),
        };

        match store.upsert_project(&record).await {
            Ok(outcome) => stats.record(outcome),
            Err(err) => {
                error!("Project {} failed: {}", solution.id, err);
                stats.errors += 1;
            }
        }
    }

    info!("Project migration summary: {}", stats.display_string());
    Ok(stats)
}
