//! Assessment, course and content tracker reconciliation

use crate::db::columns::ASSESSMENT_CONFLICT_COLUMNS;
use crate::db::models::{
    AssessmentRecord, ContentTrackerRecord, CourseStatusUpdate, CourseTrackerRecord,
    UpsertOutcome,
};
use crate::db::store::{excluded_set_clause, SyncStore};
use crate::{uuid_utils, Result};
use tracing::debug;

impl SyncStore {
    /// Assessment upsert keyed on AssessTrackingId; conflicts refresh the
    /// score columns only.
    pub async fn upsert_assessment(&self, record: &AssessmentRecord) -> Result<UpsertOutcome> {
        let existed: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM "AssessmentTracker" WHERE "AssessTrackingId" = ?)"#,
        )
        .bind(&record.assess_tracking_id)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"INSERT INTO "AssessmentTracker"
               ("AssessTrackingId", "AssessmentId", "CourseId", "AssessmentName", "UserId",
                "TenantId", "TotalMaxScore", "TotalScore", "TimeSpent", "AssessmentSummary",
                "AttemptId", "AssessmentType", "EvaluatedBy")
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT("AssessTrackingId") DO UPDATE SET {updates}"#,
            updates = excluded_set_clause(ASSESSMENT_CONFLICT_COLUMNS),
        );

        sqlx::query(&sql)
            .bind(&record.assess_tracking_id)
            .bind(&record.assessment_id)
            .bind(&record.course_id)
            .bind(&record.assessment_name)
            .bind(&record.user_id)
            .bind(&record.tenant_id)
            .bind(record.total_max_score)
            .bind(record.total_score)
            .bind(record.time_spent)
            .bind(&record.assessment_summary)
            .bind(&record.attempt_id)
            .bind(&record.assessment_type)
            .bind(&record.evaluated_by)
            .execute(&self.pool)
            .await?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    /// Remove an assessment row; returns whether a row was deleted
    pub async fn delete_assessment(&self, assess_tracking_id: &str) -> Result<bool> {
        let result =
            sqlx::query(r#"DELETE FROM "AssessmentTracker" WHERE "AssessTrackingId" = ?"#)
                .bind(assess_tracking_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Course tracker upsert keyed on
    /// (UserId, CourseId, TenantId, CertificateId); update-before-insert
    /// because certificate-less rows carry a null key part.
    pub async fn upsert_course_tracker(
        &self,
        record: &CourseTrackerRecord,
    ) -> Result<UpsertOutcome> {
        let updated = sqlx::query(
            r#"UPDATE "CourseTracker"
               SET "CourseName" = ?, "CourseTrackingStatus" = ?,
                   "CourseTrackingStartDate" = ?, "CourseTrackingEndDate" = ?
               WHERE "UserId" = ? AND "CourseId" = ? AND "TenantId" IS ? AND "CertificateId" IS ?"#,
        )
        .bind(&record.course_name)
        .bind(&record.course_tracking_status)
        .bind(record.start_date)
        .bind(record.end_date)
        .bind(&record.user_id)
        .bind(&record.course_id)
        .bind(&record.tenant_id)
        .bind(&record.certificate_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() > 0 {
            return Ok(UpsertOutcome::Updated);
        }

        sqlx::query(
            r#"INSERT INTO "CourseTracker"
               ("CourseTrackerId", "UserId", "TenantId", "CourseId", "CourseName",
                "CourseTrackingStatus", "CertificateId", "CourseTrackingStartDate",
                "CourseTrackingEndDate")
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(uuid_utils::generate().to_string())
        .bind(&record.user_id)
        .bind(&record.tenant_id)
        .bind(&record.course_id)
        .bind(&record.course_name)
        .bind(&record.course_tracking_status)
        .bind(&record.certificate_id)
        .bind(record.start_date)
        .bind(record.end_date)
        .execute(&self.pool)
        .await?;

        Ok(UpsertOutcome::Inserted)
    }

    /// Course status change: update-only on (TenantId, UserId, CourseId),
    /// touching only the fields the event carried. Zero rows when the
    /// enrollment does not exist yet.
    pub async fn update_course_status(&self, update: &CourseStatusUpdate) -> Result<u64> {
        let mut set_parts: Vec<String> = Vec::new();
        if update.status.is_some() {
            set_parts.push("\"CourseTrackingStatus\" = ?".to_string());
        }
        if update.created_on.is_some() {
            set_parts.push("\"CourseTrackingStartDate\" = ?".to_string());
        }
        if update.completed_on.is_some() {
            set_parts.push("\"CourseTrackingEndDate\" = ?".to_string());
        }
        if update.certificate_id.is_some() {
            set_parts.push("\"CertificateId\" = ?".to_string());
        }

        if set_parts.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            r#"UPDATE "CourseTracker" SET {set_clause}
               WHERE "TenantId" IS ? AND "UserId" = ? AND "CourseId" = ?"#,
            set_clause = set_parts.join(", "),
        );

        let mut query = sqlx::query(&sql);
        if let Some(status) = &update.status {
            query = query.bind(status);
        }
        if let Some(created_on) = update.created_on {
            query = query.bind(created_on);
        }
        if let Some(completed_on) = update.completed_on {
            query = query.bind(completed_on);
        }
        if let Some(certificate_id) = &update.certificate_id {
            query = query.bind(certificate_id);
        }
        query = query
            .bind(&update.tenant_id)
            .bind(&update.user_id)
            .bind(&update.course_id);

        let result = query.execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            debug!(
                "No course tracker row for user {} course {}",
                update.user_id, update.course_id
            );
        }

        Ok(result.rows_affected())
    }

    /// Content tracker upsert keyed on (UserId, ContentId, TenantId);
    /// identical status and time are a no-op.
    pub async fn upsert_content_tracker(
        &self,
        record: &ContentTrackerRecord,
    ) -> Result<UpsertOutcome> {
        let existing: Option<(String, Option<String>, Option<f64>)> = sqlx::query_as(
            r#"SELECT "ContentTrackerId", "ContentTrackingStatus", "TimeSpent"
               FROM "ContentTracker"
               WHERE "UserId" IS ? AND "ContentId" IS ? AND "TenantId" IS ?"#,
        )
        .bind(&record.user_id)
        .bind(&record.content_id)
        .bind(&record.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some((tracker_id, status, time_spent)) = existing {
            let unchanged = status.as_deref() == Some(record.content_tracking_status.as_str())
                && time_spent == Some(record.time_spent);
            if unchanged {
                return Ok(UpsertOutcome::Unchanged);
            }

            sqlx::query(
                r#"UPDATE "ContentTracker"
                   SET "ContentName" = ?, "ContentType" = ?, "ContentTrackingStatus" = ?,
                       "TimeSpent" = ?, "UpdatedAt" = CURRENT_TIMESTAMP
                   WHERE "ContentTrackerId" = ?"#,
            )
            .bind(&record.content_name)
            .bind(&record.content_type)
            .bind(&record.content_tracking_status)
            .bind(record.time_spent)
            .bind(&tracker_id)
            .execute(&self.pool)
            .await?;

            return Ok(UpsertOutcome::Updated);
        }

        sqlx::query(
            r#"INSERT INTO "ContentTracker"
               ("ContentTrackerId", "UserId", "TenantId", "ContentId", "CourseId",
                "ContentName", "ContentType", "ContentTrackingStatus", "TimeSpent")
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&record.content_tracker_id)
        .bind(&record.user_id)
        .bind(&record.tenant_id)
        .bind(&record.content_id)
        .bind(&record.course_id)
        .bind(&record.content_name)
        .bind(&record.content_type)
        .bind(&record.content_tracking_status)
        .bind(record.time_spent)
        .execute(&self.pool)
        .await?;

        Ok(UpsertOutcome::Inserted)
    }
}
