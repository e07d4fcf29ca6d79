//! Project, task and completion-tracking reconciliation

use crate::db::columns::{PROJECT_CONFLICT_COLUMNS, PROJECT_TASK_CONFLICT_COLUMNS};
use crate::db::models::{
    ProjectRecord, ProjectTaskRecord, ProjectTaskRow, TaskTrackingRecord, UpsertOutcome,
};
use crate::db::store::{excluded_set_clause, SyncStore, TaskReconcileSummary};
use crate::{uuid_utils, Result};
use std::collections::HashSet;
use tracing::{debug, error, info};

impl SyncStore {
    pub async fn project_exists(&self, project_id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM "Project" WHERE "ProjectId" = ?)"#,
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Project upsert keyed on ProjectId. The conflict clause refreshes the
    /// descriptive columns only; TenantId and AcademicYear keep whatever
    /// the row was created with.
    pub async fn upsert_project(&self, project: &ProjectRecord) -> Result<UpsertOutcome> {
        let existed = self.project_exists(&project.project_id).await?;

        let sql = format!(
            r#"INSERT INTO "Project"
               ("ProjectId", "ProjectName", "Board", "Medium", "Subject", "Grade", "Type",
                "StartDate", "EndDate", "CreatedBy", "TenantId", "AcademicYear")
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT("ProjectId") DO UPDATE SET {updates}"#,
            updates = excluded_set_clause(PROJECT_CONFLICT_COLUMNS),
        );

        sqlx::query(&sql)
            .bind(&project.project_id)
            .bind(&project.project_name)
            .bind(&project.board)
            .bind(&project.medium)
            .bind(&project.subject)
            .bind(&project.grade)
            .bind(&project.project_type)
            .bind(&project.start_date)
            .bind(&project.end_date)
            .bind(&project.created_by)
            .bind(&project.tenant_id)
            .bind(&project.academic_year)
            .execute(&self.pool)
            .await?;

        info!("Project upserted: ProjectId={}", project.project_id);

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    pub async fn project_tasks_by_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectTaskRow>> {
        let rows = sqlx::query_as::<_, ProjectTaskRow>(
            r#"SELECT "ProjectTaskId", "ProjectId", "TaskName", "ParentId"
               FROM "ProjectTask" WHERE "ProjectId" = ?"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Bulk-delete tasks by key; returns rows deleted
    pub async fn delete_project_tasks(&self, task_ids: &[String]) -> Result<u64> {
        if task_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; task_ids.len()].join(", ");
        let sql = format!(
            r#"DELETE FROM "ProjectTask" WHERE "ProjectTaskId" IN ({placeholders})"#,
        );

        let mut query = sqlx::query(&sql);
        for task_id in task_ids {
            query = query.bind(task_id);
        }

        let result = query.execute(&self.pool).await?;
        info!("Deleted {} project tasks", result.rows_affected());
        Ok(result.rows_affected())
    }

    /// Task upsert keyed on ProjectTaskId; conflict refreshes the
    /// allow-listed columns and stamps UpdatedAt, preserving CreatedAt
    /// provenance.
    pub async fn upsert_project_task(&self, task: &ProjectTaskRecord) -> Result<UpsertOutcome> {
        let existed: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM "ProjectTask" WHERE "ProjectTaskId" = ?)"#,
        )
        .bind(&task.project_task_id)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"INSERT INTO "ProjectTask"
               ("ProjectTaskId", "ProjectId", "TaskName", "ParentId", "StartDate", "EndDate",
                "LearningResource", "CreatedBy", "UpdatedBy")
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT("ProjectTaskId") DO UPDATE SET {updates},
                   "UpdatedAt" = CURRENT_TIMESTAMP"#,
            updates = excluded_set_clause(PROJECT_TASK_CONFLICT_COLUMNS),
        );

        sqlx::query(&sql)
            .bind(&task.project_task_id)
            .bind(&task.project_id)
            .bind(&task.task_name)
            .bind(&task.parent_id)
            .bind(&task.start_date)
            .bind(&task.end_date)
            .bind(task.learning_resource.as_ref().map(|v| v.to_string()))
            .bind(&task.created_by)
            .bind(&task.updated_by)
            .execute(&self.pool)
            .await?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    /// Set-reconcile a project's tasks against an incoming task list.
    ///
    /// Existing keys are fetched once for the project scope and diffed in
    /// memory: destination rows whose key is absent from the incoming set
    /// are deleted, every incoming row is upserted. Rows that survive keep
    /// their CreatedAt; this is never delete-everything-and-reinsert.
    pub async fn reconcile_project_tasks(
        &self,
        project_id: &str,
        incoming: &[ProjectTaskRecord],
    ) -> Result<TaskReconcileSummary> {
        let existing = self.project_tasks_by_project(project_id).await?;
        let incoming_ids: HashSet<&str> =
            incoming.iter().map(|t| t.project_task_id.as_str()).collect();

        let to_delete: Vec<String> = existing
            .iter()
            .filter(|task| !incoming_ids.contains(task.project_task_id.as_str()))
            .map(|task| task.project_task_id.clone())
            .collect();

        let deleted = self.delete_project_tasks(&to_delete).await?;

        let mut summary = TaskReconcileSummary {
            deleted,
            ..Default::default()
        };

        // One bad task must not abort the rest of the set
        for task in incoming {
            match self.upsert_project_task(task).await {
                Ok(_) => summary.upserted += 1,
                Err(err) => {
                    error!(
                        "Failed to upsert task {} of project {}: {}",
                        task.project_task_id, project_id, err
                    );
                    summary.errors += 1;
                }
            }
        }

        info!(
            "Project task reconciliation for {}: upserted={}, deleted={}, errors={}",
            project_id, summary.upserted, summary.deleted, summary.errors
        );

        Ok(summary)
    }

    /// Dedup-insert of a completion signal.
    ///
    /// The logical key is (ProjectId, ProjectTaskId, CohortId); a row
    /// already carrying that triple makes redelivery a no-op. New rows get
    /// a freshly generated identifier.
    pub async fn insert_task_tracking(
        &self,
        tracking: &TaskTrackingRecord,
    ) -> Result<UpsertOutcome> {
        let existing: Option<String> = sqlx::query_scalar(
            r#"SELECT "ProjectTaskTrackingId" FROM "ProjectTaskTracking"
               WHERE "ProjectId" = ? AND "ProjectTaskId" = ? AND "CohortId" IS ?"#,
        )
        .bind(&tracking.project_id)
        .bind(&tracking.project_task_id)
        .bind(&tracking.cohort_id)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            debug!(
                "Skipping duplicate tracking: ProjectId={}, ProjectTaskId={}",
                tracking.project_id, tracking.project_task_id
            );
            return Ok(UpsertOutcome::Unchanged);
        }

        sqlx::query(
            r#"INSERT INTO "ProjectTaskTracking"
               ("ProjectTaskTrackingId", "ProjectId", "ProjectTaskId", "CohortId",
                "CreatedBy", "UpdatedBy")
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(uuid_utils::generate().to_string())
        .bind(&tracking.project_id)
        .bind(&tracking.project_task_id)
        .bind(&tracking.cohort_id)
        .bind(&tracking.created_by)
        .bind(&tracking.updated_by)
        .execute(&self.pool)
        .await?;

        Ok(UpsertOutcome::Inserted)
    }

    /// Count completion rows for a project (tests and summaries)
    pub async fn count_task_trackings(&self, project_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM "ProjectTaskTracking" WHERE "ProjectId" = ?"#,
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
